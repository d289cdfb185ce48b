//! Forecast and breakdown inference over the visible history.
//!
//! ```text
//! rows → scaler.transform → lag table (per target) → regressor
//!      → zero-padded inverse_transform → target column
//! ```
//!
//! Targets are independent: they are dispatched in parallel on the rayon
//! pool, and a failing target is reported without affecting the others.

pub mod breakdown;
pub mod dispatcher;
pub mod lag;

pub use breakdown::predict_breakdown;
pub use dispatcher::ForecastDispatcher;
pub use lag::LagFeatureTable;

use chrono::{Duration, NaiveDateTime};
use rayon::prelude::*;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::defaults::{FORECAST_STEP_HOURS, LAG_DEPTH};
use crate::models::{ForecastModels, ModelError};
use crate::types::{channel_matrix, ObservationRow, TIMESTAMP_FORMAT};

#[derive(Debug, Error)]
pub enum ForecastError {
    #[error("No forecast model registered for {0}")]
    ModelNotFound(String),

    #[error("Unknown channel: {0}")]
    UnknownChannel(String),

    #[error("Forecast scaler is not loaded")]
    ScalerMissing,

    #[error("Shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    #[error(transparent)]
    Model(#[from] ModelError),
}

/// Successful per-target predictions in channel order, plus the targets
/// that failed.
#[derive(Debug, Default, Serialize)]
pub struct ForecastReport {
    pub predictions: Vec<(String, Vec<f64>)>,
    #[serde(skip)]
    pub failures: Vec<(String, ForecastError)>,
}

/// Forecast every target over `rows`.
///
/// With fewer than `LAG_DEPTH + 1` rows each target gets an empty series.
/// Scaling the history is shared by all targets; a scaling failure aborts
/// the whole request, a regressor failure only drops its own target.
pub fn forecast(
    rows: &[ObservationRow],
    models: &ForecastModels,
    targets: &[&str],
) -> Result<ForecastReport, ForecastError> {
    if rows.is_empty() || targets.is_empty() {
        return Ok(ForecastReport::default());
    }

    let scaler = models.scaler.as_ref().ok_or(ForecastError::ScalerMissing)?;
    let scaled = scaler.transform(&channel_matrix(rows))?;
    let dispatcher = ForecastDispatcher::new(&models.registry, scaler, LAG_DEPTH);

    let results: Vec<(String, Result<Vec<f64>, ForecastError>)> = targets
        .par_iter()
        .map(|target| ((*target).to_string(), dispatcher.dispatch(&scaled, target)))
        .collect();

    let mut report = ForecastReport::default();
    for (target, result) in results {
        match result {
            Ok(values) => report.predictions.push((target, values)),
            Err(e) => {
                warn!(target = %target, error = %e, "Forecast target failed");
                report.failures.push((target, e));
            }
        }
    }

    info!(
        rows = rows.len(),
        targets = report.predictions.len(),
        failed = report.failures.len(),
        "Forecast complete"
    );
    Ok(report)
}

/// `steps` timestamps one hour apart following `last`.
pub fn future_timestamps(last: NaiveDateTime, steps: usize) -> Vec<String> {
    (1..=steps)
        .map(|i| {
            let offset = Duration::hours(FORECAST_STEP_HOURS * i64::try_from(i).unwrap_or(i64::MAX / 2));
            (last + offset).format(TIMESTAMP_FORMAT).to_string()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::SyntheticGenerator;
    use crate::models::regressor::LinearRegressor;
    use crate::models::{Regressor, StandardScaler};
    use crate::types::{CHANNELS, NUM_CHANNELS};
    use chrono::NaiveDate;
    use std::sync::Arc;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap()
    }

    fn models(targets: &[&str]) -> ForecastModels {
        let mut models = ForecastModels {
            scaler: Some(Arc::new(StandardScaler::new(vec![0.0; NUM_CHANNELS], vec![1.0; NUM_CHANNELS]).unwrap())),
            ..Default::default()
        };
        for t in targets {
            models.registry.insert(
                *t,
                Arc::new(LinearRegressor {
                    intercept: 1.0,
                    coefficients: vec![0.0; NUM_CHANNELS * LAG_DEPTH],
                }) as Arc<dyn Regressor>,
            );
        }
        models
    }

    #[test]
    fn test_report_keeps_channel_order() {
        let rows = SyntheticGenerator::new(3).generate(40, now());
        let models = models(&[CHANNELS[0], CHANNELS[5], CHANNELS[11]]);
        let targets = models.registry.targets();
        let report = forecast(&rows, &models, &targets).unwrap();

        let names: Vec<&str> = report.predictions.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec![CHANNELS[0], CHANNELS[5], CHANNELS[11]]);
        for (_, values) in &report.predictions {
            assert_eq!(values.len(), 30);
            assert!(values.iter().all(|v| (*v - 1.0).abs() < 1e-12));
        }
    }

    #[test]
    fn test_fewer_than_eleven_rows_gives_empty_series() {
        let rows = SyntheticGenerator::new(3).generate(10, now());
        let models = models(&CHANNELS);
        let report = forecast(&rows, &models, &models.registry.targets()).unwrap();
        assert_eq!(report.predictions.len(), NUM_CHANNELS);
        assert!(report.predictions.iter().all(|(_, v)| v.is_empty()));
    }

    #[test]
    fn test_unregistered_target_fails_alone() {
        let rows = SyntheticGenerator::new(3).generate(20, now());
        let models = models(&[CHANNELS[1]]);
        let report = forecast(&rows, &models, &[CHANNELS[0], CHANNELS[1]]).unwrap();
        assert_eq!(report.predictions.len(), 1);
        assert_eq!(report.failures.len(), 1);
        assert!(matches!(report.failures[0].1, ForecastError::ModelNotFound(_)));
    }

    #[test]
    fn test_missing_scaler_is_an_error() {
        let rows = SyntheticGenerator::new(3).generate(20, now());
        let mut models = models(&[CHANNELS[1]]);
        models.scaler = None;
        assert!(matches!(
            forecast(&rows, &models, &[CHANNELS[1]]),
            Err(ForecastError::ScalerMissing)
        ));
    }

    #[test]
    fn test_future_timestamps_hourly() {
        let ts = future_timestamps(now(), 3);
        assert_eq!(ts, vec!["2024-05-01 01:00:00", "2024-05-01 02:00:00", "2024-05-01 03:00:00"]);
        assert!(future_timestamps(now(), 0).is_empty());
    }
}
