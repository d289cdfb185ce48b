//! Equipment health score and z-score anomaly flags.

use serde::Serialize;
use statrs::statistics::Statistics;
use std::collections::BTreeMap;

use super::spc::sample_std;
use crate::config::defaults::{
    HEALTH_DEVIATION_LIMIT, HEALTH_DEVIATION_WEIGHT, HEALTH_FAULT_PENALTY,
    HEALTH_MAX_CHANNEL_PENALTY, HEALTH_MIN_STD,
};
use crate::types::{channel_values, ObservationRow, CHANNELS, NUM_CHANNELS};

/// Window mean and sample standard deviation of every channel.
fn channel_stats(rows: &[ObservationRow]) -> [(f64, f64); NUM_CHANNELS] {
    let mut stats = [(0.0, 0.0); NUM_CHANNELS];
    for (c, slot) in stats.iter_mut().enumerate() {
        let values = channel_values(rows, c);
        *slot = (values.iter().mean(), sample_std(&values));
    }
    stats
}

/// Health score in `[0, 100]` for every row of the window.
///
/// Each raised fault costs a fixed penalty; each channel more than two
/// deviations from its window mean costs up to a capped amount.
pub fn health_scores(rows: &[ObservationRow]) -> Vec<f64> {
    if rows.is_empty() {
        return Vec::new();
    }
    let stats = channel_stats(rows);

    rows.iter()
        .map(|row| {
            let mut score = 100.0 - HEALTH_FAULT_PENALTY * row.active_faults() as f64;
            for (x, (mean, std)) in row.channels.iter().zip(stats) {
                let deviation = (x - mean).abs() / std.max(HEALTH_MIN_STD);
                if deviation > HEALTH_DEVIATION_LIMIT {
                    score -= (deviation * HEALTH_DEVIATION_WEIGHT).min(HEALTH_MAX_CHANNEL_PENALTY);
                }
            }
            score.clamp(0.0, 100.0)
        })
        .collect()
}

/// Rows of one channel whose z-score exceeds the threshold.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelAnomalies {
    pub indices: Vec<usize>,
    pub count: usize,
}

/// Z-score anomalies per channel. Channels without spread report none.
pub fn anomalies(rows: &[ObservationRow], threshold: f64) -> BTreeMap<&'static str, ChannelAnomalies> {
    let stats = if rows.is_empty() {
        [(0.0, 0.0); NUM_CHANNELS]
    } else {
        channel_stats(rows)
    };

    CHANNELS
        .iter()
        .zip(stats)
        .enumerate()
        .map(|(c, (name, (mean, std)))| {
            let indices: Vec<usize> = if std > 0.0 {
                rows.iter()
                    .enumerate()
                    .filter(|(_, r)| ((r.channels[c] - mean) / std).abs() > threshold)
                    .map(|(i, _)| i)
                    .collect()
            } else {
                Vec::new()
            };
            let count = indices.len();
            (*name, ChannelAnomalies { indices, count })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::test_support::rows_with;

    #[test]
    fn test_quiet_window_scores_full_health() {
        let rows = rows_with(&[5.0; 10]);
        assert!(health_scores(&rows).iter().all(|s| *s == 100.0));
        assert!(health_scores(&[]).is_empty());
    }

    #[test]
    fn test_faults_cost_thirty_points_each() {
        let mut rows = rows_with(&[5.0; 4]);
        rows[1].faults = [1, 0, 0];
        rows[2].faults = [1, 1, 1];
        let scores = health_scores(&rows);
        assert_eq!(scores[0], 100.0);
        assert_eq!(scores[1], 70.0);
        assert_eq!(scores[2], 10.0);
    }

    #[test]
    fn test_deviation_penalty_capped_and_score_clamped() {
        let mut values = vec![0.0; 30];
        values[10] = 1_000.0;
        let mut rows = rows_with(&values);
        let scores = health_scores(&rows);
        assert_eq!(scores[10], 80.0);
        assert_eq!(scores[0], 100.0);

        rows[10].faults = [1, 1, 1];
        assert_eq!(health_scores(&rows)[10], 0.0);
    }

    #[test]
    fn test_anomalies_flag_outliers() {
        let mut values = vec![1.0; 50];
        values[7] = 1.5;
        values[20] = 100.0;
        let rows = rows_with(&values);
        let found = anomalies(&rows, 3.0);
        assert_eq!(found.len(), NUM_CHANNELS);
        assert_eq!(found["310A_FI_4303"].indices, vec![20]);
        assert_eq!(found["310A_FI_4303"].count, 1);
        // constant channels have zero std
        assert_eq!(found["310A_PDI_0308"].count, 0);
    }

    #[test]
    fn test_anomalies_on_empty_window() {
        let found = anomalies(&[], 3.0);
        assert!(found.values().all(|a| a.count == 0));
    }
}
