//! Breakdown (fault probability) classifiers.
//!
//! Given the scaled channel readings of the latest observation, a
//! [`FaultClassifier`] estimates the probability that each equipment
//! subsystem is in a faulty state.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use super::regressor::{LinearRegressor, Regressor};
use super::tree::DecisionTree;
use super::ModelError;
use crate::types::{Equipment, FAULT_COLUMNS};

/// Probability of each fault mode, serialized with the fault column names.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FaultProbabilities {
    #[serde(rename = "faulty_SP")]
    pub sp: f64,
    #[serde(rename = "faulty_TK")]
    pub tk: f64,
    #[serde(rename = "faulty_VP")]
    pub vp: f64,
}

impl FaultProbabilities {
    /// Reported while the window holds too few observations to classify.
    pub const INSUFFICIENT_DATA: Self = Self::uniform(0.1);

    /// Reported when classification fails.
    pub const UNAVAILABLE: Self = Self::uniform(0.0);

    pub const fn uniform(p: f64) -> Self {
        Self { sp: p, tk: p, vp: p }
    }

    pub fn get(&self, equipment: Equipment) -> f64 {
        match equipment {
            Equipment::Sp => self.sp,
            Equipment::Tk => self.tk,
            Equipment::Vp => self.vp,
        }
    }

    fn set(&mut self, equipment: Equipment, p: f64) {
        let p = if p.is_finite() { p.clamp(0.0, 1.0) } else { 0.0 };
        match equipment {
            Equipment::Sp => self.sp = p,
            Equipment::Tk => self.tk = p,
            Equipment::Vp => self.vp = p,
        }
    }
}

/// Multi-output fault classifier over a single scaled feature vector.
pub trait FaultClassifier: Send + Sync + std::fmt::Debug {
    fn n_features(&self) -> usize;

    /// Probability of the positive (faulty) class for every equipment key.
    fn predict_proba(&self, features: &[f64]) -> Result<FaultProbabilities, ModelError>;
}

/// On-disk classifier artifact, dispatched on its `kind` field.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClassifierArtifact {
    RandomForest(RandomForestClassifier),
    Logistic(LogisticClassifier),
}

impl ClassifierArtifact {
    pub fn into_classifier(self) -> Result<Arc<dyn FaultClassifier>, ModelError> {
        match self {
            ClassifierArtifact::RandomForest(m) => {
                m.validate()?;
                Ok(Arc::new(m))
            }
            ClassifierArtifact::Logistic(m) => {
                m.validate()?;
                Ok(Arc::new(m))
            }
        }
    }
}

fn require_all_outputs<T>(outputs: &BTreeMap<String, T>) -> Result<(), ModelError> {
    match FAULT_COLUMNS.iter().find(|c| !outputs.contains_key(**c)) {
        Some(missing) => Err(ModelError::InvalidArtifact(format!(
            "classifier has no output for {missing}"
        ))),
        None => Ok(()),
    }
}

fn check_len(features: &[f64], expected: usize) -> Result<(), ModelError> {
    if features.len() == expected {
        Ok(())
    } else {
        Err(ModelError::ShapeMismatch {
            expected,
            actual: features.len(),
        })
    }
}

// ============================================================================
// Random forest
// ============================================================================

/// One forest per fault column; each leaf holds the positive-class
/// probability and the forest averages its trees.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForestClassifier {
    pub n_features: usize,
    pub outputs: BTreeMap<String, Vec<DecisionTree>>,
}

impl RandomForestClassifier {
    fn validate(&self) -> Result<(), ModelError> {
        require_all_outputs(&self.outputs)?;
        for (name, trees) in &self.outputs {
            if trees.is_empty() {
                return Err(ModelError::InvalidArtifact(format!("forest for {name} has no trees")));
            }
            trees.iter().try_for_each(|t| t.validate(self.n_features))?;
        }
        Ok(())
    }
}

impl FaultClassifier for RandomForestClassifier {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict_proba(&self, features: &[f64]) -> Result<FaultProbabilities, ModelError> {
        check_len(features, self.n_features)?;
        let mut probs = FaultProbabilities::UNAVAILABLE;
        for eq in Equipment::ALL {
            let trees = self
                .outputs
                .get(eq.fault_column())
                .ok_or_else(|| ModelError::Prediction(format!("no forest for {}", eq.fault_column())))?;
            let mut total = 0.0;
            for tree in trees {
                total += tree.evaluate(features)?;
            }
            probs.set(eq, total / trees.len() as f64);
        }
        Ok(probs)
    }
}

// ============================================================================
// Logistic
// ============================================================================

/// Independent logistic model per fault column: `σ(intercept + w·x)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticClassifier {
    pub outputs: BTreeMap<String, LinearRegressor>,
}

impl LogisticClassifier {
    fn validate(&self) -> Result<(), ModelError> {
        require_all_outputs(&self.outputs)?;
        let widths: Vec<usize> = self.outputs.values().map(Regressor::n_features).collect();
        if widths.iter().any(|w| *w == 0 || *w != widths[0]) {
            return Err(ModelError::InvalidArtifact(
                "logistic outputs must share a non-zero feature width".into(),
            ));
        }
        Ok(())
    }
}

impl FaultClassifier for LogisticClassifier {
    fn n_features(&self) -> usize {
        self.outputs.values().next().map_or(0, Regressor::n_features)
    }

    fn predict_proba(&self, features: &[f64]) -> Result<FaultProbabilities, ModelError> {
        check_len(features, self.n_features())?;
        let row = [features.to_vec()];
        let mut probs = FaultProbabilities::UNAVAILABLE;
        for eq in Equipment::ALL {
            let model = self
                .outputs
                .get(eq.fault_column())
                .ok_or_else(|| ModelError::Prediction(format!("no model for {}", eq.fault_column())))?;
            let logit = model.predict(&row)?.first().copied().unwrap_or_default();
            probs.set(eq, 1.0 / (1.0 + (-logit).exp()));
        }
        Ok(probs)
    }
}
