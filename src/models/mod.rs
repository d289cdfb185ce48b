//! Pre-trained model artifacts
//!
//! Models are trained offline and shipped as JSON artifacts. This module
//! loads them once at startup into read-only registries:
//!
//! - `models/Forecast/scaler.json` plus one `<channel>.json` regressor per
//!   forecastable channel
//! - `models/Breakdown/scaler.json` plus `classifier.json`
//!
//! Every model sits behind a trait ([`Scaler`], [`Regressor`],
//! [`FaultClassifier`]) so other backends can be registered in code.

pub mod breakdown;
pub mod regressor;
pub mod scaler;
pub mod tree;

pub use breakdown::{ClassifierArtifact, FaultClassifier, FaultProbabilities};
pub use regressor::{Regressor, RegressorArtifact};
pub use scaler::{Scaler, StandardScaler};

use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::defaults::LAG_DEPTH;
use crate::types::{channel_index, CHANNELS, NUM_CHANNELS};

/// File name of a scaler artifact inside a model directory.
pub const SCALER_FILE: &str = "scaler.json";

/// File name of the breakdown classifier artifact.
pub const CLASSIFIER_FILE: &str = "classifier.json";

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid JSON in {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Invalid model artifact: {0}")]
    InvalidArtifact(String),

    #[error("Shape mismatch: expected {expected} columns, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    #[error("Column order mismatch: expected {expected:?}, got {actual:?}")]
    ColumnOrder {
        expected: Vec<String>,
        actual: Vec<String>,
    },

    #[error("Prediction failed: {0}")]
    Prediction(String),
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ModelError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ModelError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&contents).map_err(|source| ModelError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Load a scaler artifact and check it was fit on the channel layout.
pub fn load_scaler(path: &Path) -> Result<Arc<dyn Scaler>, ModelError> {
    let scaler: StandardScaler = read_json(path)?;
    scaler.validate()?;
    scaler.ensure_columns(&CHANNELS)?;
    Ok(Arc::new(scaler))
}

// ============================================================================
// Forecast registry
// ============================================================================

/// Target channel name → dedicated regressor. Read-only after load.
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    models: HashMap<String, Arc<dyn Regressor>>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, target: impl Into<String>, model: Arc<dyn Regressor>) {
        self.models.insert(target.into(), model);
    }

    pub fn get(&self, target: &str) -> Option<&Arc<dyn Regressor>> {
        self.models.get(target)
    }

    pub fn contains(&self, target: &str) -> bool {
        self.models.contains_key(target)
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Registered targets in channel order.
    pub fn targets(&self) -> Vec<&'static str> {
        CHANNELS
            .iter()
            .copied()
            .filter(|c| self.models.contains_key(*c))
            .collect()
    }
}

/// Everything the forecast path needs: per-channel regressors plus the
/// scaler they were trained against.
#[derive(Debug, Clone, Default)]
pub struct ForecastModels {
    pub registry: ModelRegistry,
    pub scaler: Option<Arc<dyn Scaler>>,
}

impl ForecastModels {
    /// Load every artifact in `dir`. Problems are logged and the offending
    /// artifact skipped; a missing directory yields an empty set.
    pub fn load_dir(dir: &Path) -> Self {
        let mut models = Self::default();

        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "Forecast model directory unavailable");
                return models;
            }
        };

        let mut paths: Vec<PathBuf> = entries
            .flatten()
            .map(|e| e.path())
            .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
            .collect();
        paths.sort();

        for path in paths {
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };

            if path.file_name().is_some_and(|n| n == SCALER_FILE) {
                match load_scaler(&path) {
                    Ok(scaler) => models.scaler = Some(scaler),
                    Err(e) => warn!(path = %path.display(), error = %e, "Skipping forecast scaler"),
                }
                continue;
            }

            if channel_index(stem).is_none() {
                warn!(path = %path.display(), "Skipping regressor for unknown channel");
                continue;
            }

            match read_json::<RegressorArtifact>(&path).and_then(RegressorArtifact::into_regressor) {
                Ok(model) if model.n_features() == NUM_CHANNELS * LAG_DEPTH => {
                    models.registry.insert(stem, model);
                }
                Ok(model) => warn!(
                    path = %path.display(),
                    expected = NUM_CHANNELS * LAG_DEPTH,
                    actual = model.n_features(),
                    "Skipping regressor with wrong feature width"
                ),
                Err(e) => warn!(path = %path.display(), error = %e, "Skipping regressor"),
            }
        }

        info!(
            dir = %dir.display(),
            regressors = models.registry.len(),
            scaler = models.scaler.is_some(),
            "Loaded forecast models"
        );
        models
    }
}

// ============================================================================
// Breakdown models
// ============================================================================

/// Fault classifier plus the scaler it was trained against.
#[derive(Debug, Clone, Default)]
pub struct BreakdownModels {
    pub scaler: Option<Arc<dyn Scaler>>,
    pub classifier: Option<Arc<dyn FaultClassifier>>,
}

impl BreakdownModels {
    /// Load `scaler.json` and `classifier.json` from `dir`; either may be
    /// missing, which disables breakdown prediction.
    pub fn load_dir(dir: &Path) -> Self {
        let scaler_path = dir.join(SCALER_FILE);
        let scaler = if scaler_path.exists() {
            load_scaler(&scaler_path)
                .map_err(|e| warn!(path = %scaler_path.display(), error = %e, "Skipping breakdown scaler"))
                .ok()
        } else {
            None
        };

        let classifier_path = dir.join(CLASSIFIER_FILE);
        let classifier = if classifier_path.exists() {
            read_json::<ClassifierArtifact>(&classifier_path)
                .and_then(ClassifierArtifact::into_classifier)
                .and_then(|clf| {
                    if clf.n_features() == NUM_CHANNELS {
                        Ok(clf)
                    } else {
                        Err(ModelError::ShapeMismatch {
                            expected: NUM_CHANNELS,
                            actual: clf.n_features(),
                        })
                    }
                })
                .map_err(|e| warn!(path = %classifier_path.display(), error = %e, "Skipping breakdown classifier"))
                .ok()
        } else {
            None
        };

        info!(
            dir = %dir.display(),
            scaler = scaler.is_some(),
            classifier = classifier.is_some(),
            "Loaded breakdown models"
        );
        Self { scaler, classifier }
    }
}

/// All model artifacts, loaded once and shared read-only.
#[derive(Debug, Clone, Default)]
pub struct ModelStore {
    pub forecast: ForecastModels,
    pub breakdown: BreakdownModels,
}

impl ModelStore {
    pub fn load(forecast_dir: &Path, breakdown_dir: &Path) -> Self {
        Self {
            forecast: ForecastModels::load_dir(forecast_dir),
            breakdown: BreakdownModels::load_dir(breakdown_dir),
        }
    }
}
