//! Observation rows: one timestamped sample of every channel and fault flag

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::{Equipment, NUM_CHANNELS, NUM_FAULTS};

/// Timestamp format used for every timestamp the API emits.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A single row of the pump/valve history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationRow {
    /// Synthetic wall-clock time assigned at load
    pub timestamp: NaiveDateTime,
    /// Channel readings in [`super::CHANNELS`] order
    pub channels: [f64; NUM_CHANNELS],
    /// Fault indicators in [`super::FAULT_COLUMNS`] order (0 or 1)
    pub faults: [u8; NUM_FAULTS],
}

impl ObservationRow {
    /// Whether the given equipment's fault flag is raised on this row.
    pub fn is_faulty(&self, equipment: Equipment) -> bool {
        self.faults[equipment.index()] != 0
    }

    /// Number of fault flags raised on this row.
    pub fn active_faults(&self) -> usize {
        self.faults.iter().filter(|f| **f != 0).count()
    }

    pub fn formatted_timestamp(&self) -> String {
        self.timestamp.format(TIMESTAMP_FORMAT).to_string()
    }
}

/// Collect the channels of `rows` into a row-major `T × C` matrix.
pub fn channel_matrix(rows: &[ObservationRow]) -> Vec<Vec<f64>> {
    rows.iter().map(|r| r.channels.to_vec()).collect()
}

/// Values of one channel across `rows`.
pub fn channel_values(rows: &[ObservationRow], channel: usize) -> Vec<f64> {
    rows.iter().map(|r| r.channels[channel]).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn row(faults: [u8; NUM_FAULTS]) -> ObservationRow {
        ObservationRow {
            timestamp: NaiveDate::from_ymd_opt(2024, 3, 1)
                .and_then(|d| d.and_hms_opt(6, 30, 0))
                .unwrap(),
            channels: [1.0; NUM_CHANNELS],
            faults,
        }
    }

    #[test]
    fn test_fault_helpers() {
        let r = row([1, 0, 1]);
        assert!(r.is_faulty(Equipment::Sp));
        assert!(!r.is_faulty(Equipment::Tk));
        assert_eq!(r.active_faults(), 2);
    }

    #[test]
    fn test_timestamp_format() {
        assert_eq!(row([0; 3]).formatted_timestamp(), "2024-03-01 06:30:00");
    }
}
