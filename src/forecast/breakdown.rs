//! Fault probability for the most recent observation.

use tracing::warn;

use crate::config::defaults::MIN_ROWS_FOR_BREAKDOWN;
use crate::models::{BreakdownModels, FaultProbabilities, ModelError};
use crate::types::ObservationRow;

/// Classify the last row of `rows`.
///
/// Too short a history yields [`FaultProbabilities::INSUFFICIENT_DATA`];
/// missing artifacts or a classifier error yield
/// [`FaultProbabilities::UNAVAILABLE`].
pub fn predict_breakdown(rows: &[ObservationRow], models: &BreakdownModels) -> FaultProbabilities {
    let Some(latest) = rows.last().filter(|_| rows.len() >= MIN_ROWS_FOR_BREAKDOWN) else {
        return FaultProbabilities::INSUFFICIENT_DATA;
    };

    let (Some(scaler), Some(classifier)) = (&models.scaler, &models.classifier) else {
        warn!("Breakdown models not loaded, reporting zero probabilities");
        return FaultProbabilities::UNAVAILABLE;
    };

    let result = scaler
        .transform(&[latest.channels.to_vec()])
        .and_then(|scaled| {
            let features = scaled
                .into_iter()
                .next()
                .ok_or_else(|| ModelError::Prediction("scaler returned no rows".into()))?;
            classifier.predict_proba(&features)
        });

    match result {
        Ok(probs) => probs,
        Err(e) => {
            warn!(error = %e, "Breakdown prediction failed");
            FaultProbabilities::UNAVAILABLE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::SyntheticGenerator;
    use crate::models::breakdown::LogisticClassifier;
    use crate::models::regressor::LinearRegressor;
    use crate::models::{FaultClassifier, Scaler, StandardScaler};
    use crate::types::{FAULT_COLUMNS, NUM_CHANNELS};
    use chrono::Utc;
    use std::sync::Arc;

    fn rows(n: usize) -> Vec<ObservationRow> {
        SyntheticGenerator::new(11).generate(n, Utc::now().naive_utc())
    }

    fn models(intercept: f64) -> BreakdownModels {
        let outputs = FAULT_COLUMNS
            .iter()
            .map(|c| {
                (
                    (*c).to_string(),
                    LinearRegressor {
                        intercept,
                        coefficients: vec![0.0; NUM_CHANNELS],
                    },
                )
            })
            .collect();
        BreakdownModels {
            scaler: Some(Arc::new(StandardScaler::new(vec![0.0; NUM_CHANNELS], vec![1.0; NUM_CHANNELS]).unwrap())
                as Arc<dyn Scaler>),
            classifier: Some(Arc::new(LogisticClassifier { outputs }) as Arc<dyn FaultClassifier>),
        }
    }

    #[test]
    fn test_short_history_uses_fallback() {
        assert_eq!(predict_breakdown(&rows(9), &models(0.0)), FaultProbabilities::INSUFFICIENT_DATA);
        assert_eq!(predict_breakdown(&[], &models(0.0)), FaultProbabilities::INSUFFICIENT_DATA);
    }

    #[test]
    fn test_classifier_output_returned() {
        let p = predict_breakdown(&rows(10), &models(0.0));
        assert!((p.sp - 0.5).abs() < 1e-12);
        assert!((p.vp - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_missing_models_give_zeros() {
        let p = predict_breakdown(&rows(20), &BreakdownModels::default());
        assert_eq!(p, FaultProbabilities::UNAVAILABLE);
    }
}
