//! Column-wise standard scaling.
//!
//! A scaler is fit once over a reference matrix and then applied to any
//! number of matrices with the same column layout. Forecast and breakdown
//! models each ship their own fitted scaler as a JSON artifact.

use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

use super::ModelError;

/// Affine, column-indexed scaling transform with an exact inverse.
///
/// Implementations are immutable after construction and shared read-only
/// between request handlers.
pub trait Scaler: Send + Sync + std::fmt::Debug {
    /// Number of columns the scaler was fit on.
    fn n_features(&self) -> usize;

    /// Scale every row of `matrix`. Fails with [`ModelError::ShapeMismatch`]
    /// when any row has a different width than the fitted one.
    fn transform(&self, matrix: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, ModelError>;

    /// Undo [`Scaler::transform`].
    fn inverse_transform(&self, matrix: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, ModelError>;
}

/// Zero-mean, unit-variance scaler: `(x - mean_j) / scale_j`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    mean: Vec<f64>,
    scale: Vec<f64>,
    /// Column names in fit order, when the artifact records them
    #[serde(default, skip_serializing_if = "Option::is_none")]
    columns: Option<Vec<String>>,
}

impl StandardScaler {
    /// Build a scaler from explicit per-column statistics.
    pub fn new(mean: Vec<f64>, scale: Vec<f64>) -> Result<Self, ModelError> {
        let scaler = Self {
            mean,
            scale,
            columns: None,
        };
        scaler.validate()?;
        Ok(scaler)
    }

    /// Fit per-column mean and population standard deviation.
    ///
    /// Columns with zero spread get a scale of 1.0 so they pass through
    /// centred but unscaled.
    pub fn fit(reference: &[Vec<f64>]) -> Result<Self, ModelError> {
        let width = reference
            .first()
            .map(Vec::len)
            .ok_or_else(|| ModelError::InvalidArtifact("cannot fit scaler on an empty matrix".into()))?;
        check_width(reference, width)?;

        let mut mean = Vec::with_capacity(width);
        let mut scale = Vec::with_capacity(width);
        for j in 0..width {
            let column: Vec<f64> = reference.iter().map(|row| row[j]).collect();
            let std = column.iter().population_std_dev();
            mean.push(column.iter().mean());
            scale.push(if std.is_finite() && std > 0.0 { std } else { 1.0 });
        }

        Self::new(mean, scale)
    }

    /// Attach the column names the scaler was fit on.
    pub fn with_columns(mut self, columns: Vec<String>) -> Result<Self, ModelError> {
        self.columns = Some(columns);
        self.validate()?;
        Ok(self)
    }

    pub fn columns(&self) -> Option<&[String]> {
        self.columns.as_deref()
    }

    pub fn mean(&self) -> &[f64] {
        &self.mean
    }

    pub fn scale(&self) -> &[f64] {
        &self.scale
    }

    /// Reject artifacts whose statistics cannot be applied safely.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.mean.is_empty() {
            return Err(ModelError::InvalidArtifact("scaler has no columns".into()));
        }
        if self.mean.len() != self.scale.len() {
            return Err(ModelError::InvalidArtifact(format!(
                "scaler mean has {} columns but scale has {}",
                self.mean.len(),
                self.scale.len()
            )));
        }
        if let Some(columns) = &self.columns {
            if columns.len() != self.mean.len() {
                return Err(ModelError::InvalidArtifact(format!(
                    "scaler lists {} column names for {} columns",
                    columns.len(),
                    self.mean.len()
                )));
            }
        }
        if self.mean.iter().any(|m| !m.is_finite()) {
            return Err(ModelError::InvalidArtifact("scaler mean must be finite".into()));
        }
        if self.scale.iter().any(|s| !s.is_finite() || *s == 0.0) {
            return Err(ModelError::InvalidArtifact(
                "scaler scale must be finite and non-zero".into(),
            ));
        }
        Ok(())
    }

    /// Check that the recorded column names match `expected` exactly.
    ///
    /// Scalers without recorded names are accepted when the width matches.
    pub fn ensure_columns(&self, expected: &[&str]) -> Result<(), ModelError> {
        if self.n_features() != expected.len() {
            return Err(ModelError::ShapeMismatch {
                expected: expected.len(),
                actual: self.n_features(),
            });
        }
        match &self.columns {
            Some(columns) if columns.iter().map(String::as_str).ne(expected.iter().copied()) => {
                Err(ModelError::ColumnOrder {
                    expected: expected.iter().map(|c| (*c).to_string()).collect(),
                    actual: columns.clone(),
                })
            }
            _ => Ok(()),
        }
    }
}

impl Scaler for StandardScaler {
    fn n_features(&self) -> usize {
        self.mean.len()
    }

    fn transform(&self, matrix: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, ModelError> {
        check_width(matrix, self.n_features())?;
        Ok(matrix
            .iter()
            .map(|row| {
                row.iter()
                    .zip(self.mean.iter().zip(&self.scale))
                    .map(|(x, (m, s))| (x - m) / s)
                    .collect()
            })
            .collect())
    }

    fn inverse_transform(&self, matrix: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, ModelError> {
        check_width(matrix, self.n_features())?;
        Ok(matrix
            .iter()
            .map(|row| {
                row.iter()
                    .zip(self.mean.iter().zip(&self.scale))
                    .map(|(z, (m, s))| z * s + m)
                    .collect()
            })
            .collect())
    }
}

fn check_width(matrix: &[Vec<f64>], expected: usize) -> Result<(), ModelError> {
    match matrix.iter().find(|row| row.len() != expected) {
        Some(row) => Err(ModelError::ShapeMismatch {
            expected,
            actual: row.len(),
        }),
        None => Ok(()),
    }
}
