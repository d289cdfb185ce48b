//! Forecast regressors.
//!
//! Each forecastable channel has a dedicated regressor trained offline on
//! lag features. The crate treats them as black boxes behind [`Regressor`];
//! the JSON backends below cover linear models and gradient-boosted trees.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::tree::DecisionTree;
use super::ModelError;

/// Batch predictor over a row-major feature matrix.
pub trait Regressor: Send + Sync + std::fmt::Debug {
    /// Width of the feature vectors the model was trained on.
    fn n_features(&self) -> usize;

    /// One prediction per feature row, in row order.
    fn predict(&self, features: &[Vec<f64>]) -> Result<Vec<f64>, ModelError>;
}

/// On-disk regressor artifact, dispatched on its `kind` field.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RegressorArtifact {
    Linear(LinearRegressor),
    TreeEnsemble(TreeEnsembleRegressor),
}

impl RegressorArtifact {
    /// Validate the artifact and wrap it as a shareable regressor.
    pub fn into_regressor(self) -> Result<Arc<dyn Regressor>, ModelError> {
        match self {
            RegressorArtifact::Linear(m) => {
                m.validate()?;
                Ok(Arc::new(m))
            }
            RegressorArtifact::TreeEnsemble(m) => {
                m.validate()?;
                Ok(Arc::new(m))
            }
        }
    }
}

// ============================================================================
// Linear
// ============================================================================

/// `y = intercept + Σ coefficients[i] · x[i]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearRegressor {
    pub intercept: f64,
    pub coefficients: Vec<f64>,
}

impl LinearRegressor {
    fn validate(&self) -> Result<(), ModelError> {
        if self.coefficients.is_empty() {
            return Err(ModelError::InvalidArtifact("linear model has no coefficients".into()));
        }
        if !self.intercept.is_finite() || self.coefficients.iter().any(|c| !c.is_finite()) {
            return Err(ModelError::InvalidArtifact(
                "linear model weights must be finite".into(),
            ));
        }
        Ok(())
    }
}

impl Regressor for LinearRegressor {
    fn n_features(&self) -> usize {
        self.coefficients.len()
    }

    fn predict(&self, features: &[Vec<f64>]) -> Result<Vec<f64>, ModelError> {
        features
            .iter()
            .map(|row| {
                if row.len() != self.coefficients.len() {
                    return Err(ModelError::ShapeMismatch {
                        expected: self.coefficients.len(),
                        actual: row.len(),
                    });
                }
                Ok(self.intercept
                    + row
                        .iter()
                        .zip(&self.coefficients)
                        .map(|(x, w)| x * w)
                        .sum::<f64>())
            })
            .collect()
    }
}

// ============================================================================
// Gradient-boosted trees
// ============================================================================

/// Additive tree ensemble: `y = base_score + Σ tree_k(x)`.
///
/// Leaf values are expected to already include the learning rate, as in
/// boosted-tree model dumps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeEnsembleRegressor {
    pub n_features: usize,
    #[serde(default)]
    pub base_score: f64,
    pub trees: Vec<DecisionTree>,
}

impl TreeEnsembleRegressor {
    fn validate(&self) -> Result<(), ModelError> {
        if self.n_features == 0 {
            return Err(ModelError::InvalidArtifact("tree ensemble has zero features".into()));
        }
        if self.trees.is_empty() {
            return Err(ModelError::InvalidArtifact("tree ensemble has no trees".into()));
        }
        if !self.base_score.is_finite() {
            return Err(ModelError::InvalidArtifact("base_score must be finite".into()));
        }
        self.trees
            .iter()
            .try_for_each(|t| t.validate(self.n_features))
    }
}

impl Regressor for TreeEnsembleRegressor {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict(&self, features: &[Vec<f64>]) -> Result<Vec<f64>, ModelError> {
        features
            .iter()
            .map(|row| {
                if row.len() != self.n_features {
                    return Err(ModelError::ShapeMismatch {
                        expected: self.n_features,
                        actual: row.len(),
                    });
                }
                self.trees
                    .iter()
                    .try_fold(self.base_score, |acc, t| -> Result<f64, ModelError> {
                        Ok(acc + t.evaluate(row)?)
                    })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_predict() {
        let m = LinearRegressor {
            intercept: 1.0,
            coefficients: vec![2.0, -1.0],
        };
        let y = m.predict(&[vec![1.0, 1.0], vec![0.5, 3.0]]).unwrap();
        assert_eq!(y, vec![2.0, -1.0]);
        assert!(m.predict(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_linear_rejects_wrong_width() {
        let m = LinearRegressor {
            intercept: 0.0,
            coefficients: vec![1.0; 3],
        };
        assert!(matches!(
            m.predict(&[vec![1.0]]),
            Err(ModelError::ShapeMismatch { expected: 3, actual: 1 })
        ));
    }

    #[test]
    fn test_tree_ensemble_artifact_sums_trees() {
        let json = r#"{
            "kind": "tree_ensemble",
            "n_features": 2,
            "base_score": 0.5,
            "trees": [
                {"nodes": [
                    {"feature": 0, "threshold": 0.0, "left": 1, "right": 2},
                    {"value": -1.0},
                    {"value": 1.0}
                ]},
                {"nodes": [{"value": 0.25}]}
            ]
        }"#;
        let artifact: RegressorArtifact = serde_json::from_str(json).unwrap();
        let model = artifact.into_regressor().unwrap();
        assert_eq!(model.n_features(), 2);
        let y = model.predict(&[vec![-2.0, 0.0], vec![2.0, 0.0]]).unwrap();
        assert_eq!(y, vec![-0.25, 1.75]);
    }

    #[test]
    fn test_linear_artifact_round_trip_through_kind_tag() {
        let json = r#"{"kind": "linear", "intercept": 0.0, "coefficients": [1.0]}"#;
        let artifact: RegressorArtifact = serde_json::from_str(json).unwrap();
        assert!(matches!(artifact, RegressorArtifact::Linear(_)));
    }

    #[test]
    fn test_invalid_artifacts_rejected() {
        let empty = RegressorArtifact::Linear(LinearRegressor {
            intercept: 0.0,
            coefficients: vec![],
        });
        assert!(empty.into_regressor().is_err());

        let no_trees = RegressorArtifact::TreeEnsemble(TreeEnsembleRegressor {
            n_features: 3,
            base_score: 0.0,
            trees: vec![],
        });
        assert!(no_trees.into_regressor().is_err());
    }
}
