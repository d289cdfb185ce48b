//! Closed-form statistics over the visible history window
//!
//! - `kpi`: reliability KPIs (MTBF, MTTR, availability, reliability)
//! - `spc`: control charts and process capability
//! - `health`: per-row equipment health score and z-score anomalies
//!
//! Everything here is pure and recomputed per request.

pub mod health;
pub mod kpi;
pub mod spc;

pub use health::{anomalies, health_scores, ChannelAnomalies};
pub use kpi::{kpi_report, KpiReport, ReliabilityKpis};
pub use spc::{control_chart, process_capability, ControlChart, ProcessCapability};

use crate::types::{channel_index, Equipment, ObservationRow};

/// A numeric column of the history: a sensor channel or a fault flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Channel(usize),
    Fault(Equipment),
}

impl Column {
    pub fn resolve(name: &str) -> Option<Self> {
        channel_index(name).map(Column::Channel).or_else(|| {
            Equipment::ALL
                .into_iter()
                .find(|e| e.fault_column() == name)
                .map(Column::Fault)
        })
    }

    pub fn value(self, row: &ObservationRow) -> f64 {
        match self {
            Column::Channel(c) => row.channels[c],
            Column::Fault(eq) => f64::from(row.faults[eq.index()]),
        }
    }
}

/// Finite values of a named column with their row indices. `None` if the
/// name is not a column.
pub fn column_series(rows: &[ObservationRow], name: &str) -> Option<Vec<(usize, f64)>> {
    let column = Column::resolve(name)?;
    Some(
        rows.iter()
            .enumerate()
            .map(|(i, r)| (i, column.value(r)))
            .filter(|(_, v)| v.is_finite())
            .collect(),
    )
}


#[cfg(test)]
mod tests {
    use super::test_support::rows_with;
    use super::*;

    #[test]
    fn test_column_series_resolves_channels_and_faults() {
        let mut rows = rows_with(&[1.0, 2.0, 3.0]);
        rows[1].faults[2] = 1;
        let ch: Vec<f64> = column_series(&rows, "310A_FI_4303").unwrap().into_iter().map(|(_, v)| v).collect();
        assert_eq!(ch, vec![1.0, 2.0, 3.0]);
        let vp: Vec<f64> = column_series(&rows, "faulty_VP").unwrap().into_iter().map(|(_, v)| v).collect();
        assert_eq!(vp, vec![0.0, 1.0, 0.0]);
        assert!(column_series(&rows, "pressure").is_none());
    }

    #[test]
    fn test_column_series_drops_non_finite() {
        let rows = rows_with(&[1.0, f64::NAN, 3.0]);
        let idx: Vec<usize> = column_series(&rows, "310A_FI_4303").unwrap().into_iter().map(|(i, _)| i).collect();
        assert_eq!(idx, vec![0, 2]);
    }
}
