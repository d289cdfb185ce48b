//! Per-target forecast dispatch.
//!
//! Every forecastable channel has its own regressor. For one target the
//! dispatcher builds the lag table, batch-predicts, and maps the scaled
//! predictions back to engineering units through the scaler.

use std::sync::Arc;
use tracing::debug;

use super::lag::LagFeatureTable;
use super::ForecastError;
use crate::models::{ModelRegistry, Scaler};
use crate::types::channel_index;

/// Runs one target's regressor over a scaled history.
#[derive(Debug, Clone)]
pub struct ForecastDispatcher<'a> {
    registry: &'a ModelRegistry,
    scaler: &'a Arc<dyn Scaler>,
    lag_depth: usize,
}

impl<'a> ForecastDispatcher<'a> {
    pub fn new(registry: &'a ModelRegistry, scaler: &'a Arc<dyn Scaler>, lag_depth: usize) -> Self {
        Self {
            registry,
            scaler,
            lag_depth,
        }
    }

    /// Predict `target` for every lag-eligible row of `scaled`.
    ///
    /// Returns `T - lag_depth` values in engineering units, or nothing when
    /// the history is too short (the regressor is not called).
    pub fn dispatch(&self, scaled: &[Vec<f64>], target: &str) -> Result<Vec<f64>, ForecastError> {
        let index = channel_index(target).ok_or_else(|| ForecastError::UnknownChannel(target.to_string()))?;
        let model = self
            .registry
            .get(target)
            .ok_or_else(|| ForecastError::ModelNotFound(target.to_string()))?;

        let table = LagFeatureTable::build(scaled, index, self.lag_depth)?;
        if table.is_empty() {
            return Ok(Vec::new());
        }

        let predicted = model.predict(&table.features)?;
        if predicted.len() != table.len() {
            return Err(ForecastError::ShapeMismatch {
                expected: table.len(),
                actual: predicted.len(),
            });
        }

        // The scaler only inverts full rows: place each prediction at the
        // target's column of an otherwise zero row, then read it back out.
        let width = self.scaler.n_features();
        let padded: Vec<Vec<f64>> = predicted
            .iter()
            .map(|&y| {
                let mut row = vec![0.0; width];
                row[index] = y;
                row
            })
            .collect();

        let unscaled = self.scaler.inverse_transform(&padded)?;
        debug!(target, rows = unscaled.len(), "Forecast dispatched");
        Ok(unscaled.into_iter().map(|row| row[index]).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::regressor::LinearRegressor;
    use crate::models::{Regressor, StandardScaler};
    use crate::types::NUM_CHANNELS;

    #[derive(Debug)]
    struct Failing;

    impl Regressor for Failing {
        fn n_features(&self) -> usize {
            NUM_CHANNELS * 10
        }
        fn predict(&self, _: &[Vec<f64>]) -> Result<Vec<f64>, crate::models::ModelError> {
            Err(crate::models::ModelError::Prediction("boom".into()))
        }
    }

    fn scaler() -> Arc<dyn Scaler> {
        let mean: Vec<f64> = (0..NUM_CHANNELS).map(|c| c as f64 * 10.0).collect();
        let scale = vec![2.0; NUM_CHANNELS];
        Arc::new(StandardScaler::new(mean, scale).unwrap())
    }

    /// Regressor returning the lag-1 value of channel `c`.
    fn persistence(c: usize) -> Arc<dyn Regressor> {
        let mut coefficients = vec![0.0; NUM_CHANNELS * 10];
        coefficients[c * 10] = 1.0;
        Arc::new(LinearRegressor {
            intercept: 0.0,
            coefficients,
        })
    }

    fn scaled(t: usize) -> Vec<Vec<f64>> {
        (0..t).map(|i| vec![i as f64; NUM_CHANNELS]).collect()
    }

    #[test]
    fn test_predictions_are_inverse_scaled_into_target_column() {
        let mut registry = ModelRegistry::new();
        registry.insert("310A_PI_0316", persistence(2));
        let scaler = scaler();
        let dispatcher = ForecastDispatcher::new(&registry, &scaler, 10);

        let out = dispatcher.dispatch(&scaled(13), "310A_PI_0316").unwrap();
        // scaled lag-1 at t=10..12 is 9, 10, 11; channel 2 has mean 20, scale 2
        assert_eq!(out, vec![38.0, 40.0, 42.0]);
    }

    #[test]
    fn test_short_history_skips_model() {
        let mut registry = ModelRegistry::new();
        registry.insert("310A_FI_4303", Arc::new(Failing) as Arc<dyn Regressor>);
        let scaler = scaler();
        let dispatcher = ForecastDispatcher::new(&registry, &scaler, 10);
        assert!(dispatcher.dispatch(&scaled(10), "310A_FI_4303").unwrap().is_empty());
        assert!(dispatcher.dispatch(&scaled(11), "310A_FI_4303").is_err());
    }

    #[test]
    fn test_missing_and_unknown_targets() {
        let registry = ModelRegistry::new();
        let scaler = scaler();
        let dispatcher = ForecastDispatcher::new(&registry, &scaler, 10);
        assert!(matches!(
            dispatcher.dispatch(&scaled(20), "310A_FI_4303"),
            Err(ForecastError::ModelNotFound(_))
        ));
        assert!(matches!(
            dispatcher.dispatch(&scaled(20), "bogus"),
            Err(ForecastError::UnknownChannel(_))
        ));
    }
}
