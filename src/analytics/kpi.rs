//! Reliability KPIs per equipment.
//!
//! Each observation row stands for a fixed number of operating hours and
//! every fault is assumed to take a fixed time to repair.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

use crate::config::defaults::{HOURS_PER_ROW, MTTR_HOURS};
use crate::types::{Equipment, ObservationRow};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReliabilityKpis {
    #[serde(rename = "MTBF")]
    pub mtbf: f64,
    #[serde(rename = "MTTR")]
    pub mttr: f64,
    /// Percent
    #[serde(rename = "Availability")]
    pub availability: f64,
    /// Percent
    #[serde(rename = "Reliability")]
    pub reliability: f64,
    #[serde(rename = "Total_Faults")]
    pub total_faults: u64,
    #[serde(rename = "Operating_Hours")]
    pub operating_hours: u64,
}

impl ReliabilityKpis {
    /// KPIs for one equipment over `rows`; `None` for an empty window.
    pub fn compute(rows: &[ObservationRow], equipment: Equipment) -> Option<Self> {
        if rows.is_empty() {
            return None;
        }

        let total_faults = rows.iter().filter(|r| r.is_faulty(equipment)).count() as u64;
        let operating_hours = rows.len() as u64 * HOURS_PER_ROW;

        let faults = total_faults as f64;
        let hours = operating_hours as f64;
        let mtbf = hours / faults.max(1.0);
        let availability = (hours - faults * MTTR_HOURS) / hours * 100.0;
        let reliability = (hours - faults) / hours * 100.0;

        Some(Self {
            mtbf: round2(mtbf),
            mttr: round2(MTTR_HOURS),
            availability: round2(availability.max(0.0)),
            reliability: round2(reliability.max(0.0)),
            total_faults,
            operating_hours,
        })
    }
}

/// Two decimals, ties to even.
fn round2(x: f64) -> f64 {
    (x * 100.0).round_ties_even() / 100.0
}

/// Result of a KPI request.
#[derive(Debug, Clone, PartialEq)]
pub enum KpiReport {
    /// Keyed by `sp`, `tk`, `vp`
    All(BTreeMap<&'static str, ReliabilityKpis>),
    Single(ReliabilityKpis),
    /// Unknown equipment or empty window; serializes as `{}`
    Empty,
}

impl Serialize for KpiReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            KpiReport::All(map) => map.serialize(serializer),
            KpiReport::Single(kpis) => kpis.serialize(serializer),
            KpiReport::Empty => serializer.serialize_map(Some(0))?.end(),
        }
    }
}

/// KPIs for `equipment` (`sp`, `tk`, `vp`, or `all`; case-insensitive).
/// `None` means all.
pub fn kpi_report(rows: &[ObservationRow], equipment: Option<&str>) -> KpiReport {
    if rows.is_empty() {
        return KpiReport::Empty;
    }

    let selector = equipment.map(str::trim).filter(|s| !s.eq_ignore_ascii_case("all"));
    match selector {
        None => KpiReport::All(
            Equipment::ALL
                .into_iter()
                .filter_map(|eq| ReliabilityKpis::compute(rows, eq).map(|k| (eq.key(), k)))
                .collect(),
        ),
        Some(key) => Equipment::parse(key)
            .and_then(|eq| ReliabilityKpis::compute(rows, eq))
            .map_or(KpiReport::Empty, KpiReport::Single),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::test_support::rows_with;

    fn window(len: usize, sp_faults: usize) -> Vec<ObservationRow> {
        let mut rows = rows_with(&vec![0.0; len]);
        for r in rows.iter_mut().take(sp_faults) {
            r.faults[0] = 1;
        }
        rows
    }

    #[test]
    fn test_reference_scenario() {
        let kpis = ReliabilityKpis::compute(&window(250, 5), Equipment::Sp).unwrap();
        assert_eq!(kpis.operating_hours, 500);
        assert_eq!(kpis.total_faults, 5);
        assert_eq!(kpis.mtbf, 100.0);
        assert_eq!(kpis.mttr, 0.25);
        assert_eq!(kpis.availability, 99.75);
        assert_eq!(kpis.reliability, 99.0);
    }

    #[test]
    fn test_rounding_ties_to_even() {
        // 130 h / 16 faults = 8.125 exactly
        let kpis = ReliabilityKpis::compute(&window(65, 16), Equipment::Sp).unwrap();
        assert_eq!(kpis.operating_hours, 130);
        assert_eq!(kpis.mtbf, 8.12);
        assert_eq!(round2(0.375), 0.38);
        assert_eq!(round2(2.5), 2.5);
    }

    #[test]
    fn test_no_faults_keeps_mtbf_finite() {
        let kpis = ReliabilityKpis::compute(&window(10, 0), Equipment::Tk).unwrap();
        assert_eq!(kpis.mtbf, 20.0);
        assert_eq!(kpis.availability, 100.0);
        assert_eq!(kpis.reliability, 100.0);
    }

    #[test]
    fn test_percentages_within_bounds() {
        for faults in [0, 1, 3] {
            let kpis = ReliabilityKpis::compute(&window(3, faults), Equipment::Sp).unwrap();
            assert!((0.0..=100.0).contains(&kpis.availability));
            assert!((0.0..=100.0).contains(&kpis.reliability));
        }
        let kpis = ReliabilityKpis::compute(&window(1, 1), Equipment::Sp).unwrap();
        assert_eq!(kpis.reliability, 50.0);
        assert_eq!(kpis.availability, 87.5);
    }

    #[test]
    fn test_report_selection() {
        let rows = window(20, 2);
        match kpi_report(&rows, None) {
            KpiReport::All(map) => {
                assert_eq!(map.keys().copied().collect::<Vec<_>>(), vec!["sp", "tk", "vp"]);
                assert_eq!(map["sp"].total_faults, 2);
            }
            other => panic!("expected all, got {other:?}"),
        }
        assert!(matches!(kpi_report(&rows, Some("ALL")), KpiReport::All(_)));
        assert!(matches!(kpi_report(&rows, Some("Tk")), KpiReport::Single(_)));
        assert_eq!(kpi_report(&rows, Some("xyz")), KpiReport::Empty);
        assert_eq!(kpi_report(&[], None), KpiReport::Empty);
    }

    #[test]
    fn test_serialized_field_names() {
        let v = serde_json::to_value(kpi_report(&window(250, 5), Some("sp"))).unwrap();
        assert_eq!(v["MTBF"], 100.0);
        assert_eq!(v["Total_Faults"], 5);
        assert!(v["Operating_Hours"].is_u64());
        assert_eq!(v["Availability"], 99.75);
        assert_eq!(serde_json::to_string(&KpiReport::Empty).unwrap(), "{}");
    }
}
