//! CSV ingestion for the pump/valve history.
//!
//! Columns are resolved by header name, so extra columns and reordering are
//! tolerated. Cells that are empty or not numeric are treated as missing and
//! filled from neighbouring rows.

use chrono::{Duration, NaiveDateTime};
use std::io::Read;
use std::path::Path;
use tracing::{info, warn};

use super::DataError;
use crate::config::defaults::ROW_SPACING_HOURS;
use crate::types::{ObservationRow, CHANNELS, FAULT_COLUMNS, NUM_CHANNELS, NUM_FAULTS};

/// Load the history CSV at `path`, stamping rows relative to `now`.
pub fn load_csv(path: &Path, now: NaiveDateTime) -> Result<Vec<ObservationRow>, DataError> {
    let file = std::fs::File::open(path).map_err(|e| DataError::Open {
        path: path.to_path_buf(),
        source: csv::Error::from(e),
    })?;
    let rows = read_csv(file, now)?;
    info!(path = %path.display(), rows = rows.len(), "Loaded observation history");
    Ok(rows)
}

/// Parse history CSV from any reader.
pub fn read_csv<R: Read>(reader: R, now: NaiveDateTime) -> Result<Vec<ObservationRow>, DataError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

    let headers = rdr
        .headers()
        .map_err(|source| DataError::Csv { record: 0, source })?
        .clone();

    let col = |name: &str| -> Result<usize, DataError> {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| DataError::MissingColumn(name.to_string()))
    };

    let channel_cols = CHANNELS
        .iter()
        .map(|c| col(*c))
        .collect::<Result<Vec<_>, _>>()?;
    let fault_cols = FAULT_COLUMNS
        .iter()
        .map(|c| col(*c))
        .collect::<Result<Vec<_>, _>>()?;

    let mut raw: Vec<[Option<f64>; NUM_CHANNELS]> = Vec::new();
    let mut raw_faults: Vec<[Option<f64>; NUM_FAULTS]> = Vec::new();

    for (record_num, result) in rdr.records().enumerate() {
        let record = result.map_err(|source| DataError::Csv {
            record: record_num + 1,
            source,
        })?;

        let mut values = [None; NUM_CHANNELS];
        for (slot, &i) in values.iter_mut().zip(&channel_cols) {
            *slot = record.get(i).and_then(parse_cell);
        }

        let mut flags = [None; NUM_FAULTS];
        for (slot, &i) in flags.iter_mut().zip(&fault_cols) {
            *slot = record.get(i).and_then(parse_cell);
        }

        raw.push(values);
        raw_faults.push(flags);
    }

    let channels = fill_missing(&raw, &CHANNELS);
    let faults = fill_missing(&raw_faults, &FAULT_COLUMNS)
        .into_iter()
        .map(|row| row.map(|v| u8::from(v != 0.0)));
    let timestamps = assign_timestamps(channels.len(), now);

    Ok(timestamps
        .into_iter()
        .zip(channels)
        .zip(faults)
        .map(|((timestamp, channels), faults)| ObservationRow {
            timestamp,
            channels,
            faults,
        })
        .collect())
}

/// Synthetic timestamps: the first row sits `count` hours before `now`
/// and rows are two hours apart.
pub fn assign_timestamps(count: usize, now: NaiveDateTime) -> Vec<NaiveDateTime> {
    let base = now - Duration::hours(i64::try_from(count).unwrap_or(i64::MAX / 4));
    (0..count)
        .map(|i| base + Duration::hours(ROW_SPACING_HOURS * i64::try_from(i).unwrap_or(0)))
        .collect()
}

fn parse_cell(cell: &str) -> Option<f64> {
    cell.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Forward-fill then back-fill each column. A column with no value at all
/// becomes 0.0.
fn fill_missing<const N: usize>(raw: &[[Option<f64>; N]], names: &[&str; N]) -> Vec<[f64; N]> {
    let mut out = vec![[0.0; N]; raw.len()];

    for (c, name) in names.iter().enumerate() {
        let Some(first) = raw.iter().find_map(|r| r[c]) else {
            if !raw.is_empty() {
                warn!(column = *name, "Column has no numeric values, filling with 0.0");
            }
            continue;
        };

        let mut last = first;
        for (row, values) in out.iter_mut().zip(raw) {
            if let Some(v) = values[c] {
                last = v;
            }
            row[c] = last;
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Equipment;
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 10)
            .and_then(|d| d.and_hms_opt(12, 0, 0))
            .unwrap()
    }

    fn header() -> String {
        let mut cols: Vec<&str> = vec!["Unnamed: 0"];
        cols.extend(CHANNELS);
        cols.extend(FAULT_COLUMNS);
        cols.join(",")
    }

    fn line(first: &str, faults: &str) -> String {
        let mut cells = vec!["0".to_string(), first.to_string()];
        cells.extend((1..NUM_CHANNELS).map(|c| format!("{c}.5")));
        cells.push(faults.to_string());
        cells.join(",")
    }

    #[test]
    fn test_reads_rows_in_channel_order() {
        let csv = format!("{}\n{}\n{}\n", header(), line("1.0", "1,0,0"), line("2.0", "0,0,1"));
        let rows = read_csv(csv.as_bytes(), now()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].channels[0], 1.0);
        assert_eq!(rows[0].channels[11], 11.5);
        assert!(rows[0].is_faulty(Equipment::Sp));
        assert!(rows[1].is_faulty(Equipment::Vp));
        assert!(!rows[1].is_faulty(Equipment::Sp));
    }

    #[test]
    fn test_missing_cells_forward_then_back_filled() {
        let csv = format!(
            "{}\n{}\n{}\n{}\n{}\n",
            header(),
            line("", "0,0,0"),
            line("3.0", "0,0,0"),
            line("n/a", "0,0,0"),
            line("4.0", "0,0,0"),
        );
        let rows = read_csv(csv.as_bytes(), now()).unwrap();
        let first: Vec<f64> = rows.iter().map(|r| r.channels[0]).collect();
        assert_eq!(first, vec![3.0, 3.0, 3.0, 4.0]);
    }

    #[test]
    fn test_blank_fault_cells_filled_like_channels() {
        let csv = format!(
            "{}\n{}\n{}\n{}\n{}\n",
            header(),
            line("1.0", ",0,"),
            line("1.0", "1,0,1"),
            line("1.0", ",,0"),
            line("1.0", "0,1,0"),
        );
        let rows = read_csv(csv.as_bytes(), now()).unwrap();
        let flags: Vec<[u8; NUM_FAULTS]> = rows.iter().map(|r| r.faults).collect();
        assert_eq!(flags, vec![[1, 0, 1], [1, 0, 1], [1, 0, 0], [0, 1, 0]]);
    }

    #[test]
    fn test_missing_column_is_an_error() {
        let csv = "310A_FI_4303,faulty_SP\n1.0,0\n";
        let err = read_csv(csv.as_bytes(), now()).unwrap_err();
        assert!(matches!(err, DataError::MissingColumn(c) if c == "310A_DI_3302"));
    }

    #[test]
    fn test_timestamps_two_hours_apart_from_base() {
        let ts = assign_timestamps(3, now());
        assert_eq!(ts[0], now() - Duration::hours(3));
        assert_eq!(ts[1] - ts[0], Duration::hours(2));
        assert_eq!(ts[2], now() + Duration::hours(1));
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = load_csv(Path::new("/nonexistent/history.csv"), now()).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/history.csv"));
    }
}
