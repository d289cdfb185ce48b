//! Lag-feature construction.
//!
//! For a target channel the regressors expect, at every time `t`, the
//! previous `lag_depth` scaled values of every channel laid out
//! channel-major, lag-minor:
//!
//! ```text
//! c0[t-1], c0[t-2], ..., c0[t-L], c1[t-1], ..., c{C-1}[t-L]
//! ```
//!
//! Rows with `t < lag_depth` have incomplete history and are dropped.

use super::ForecastError;

/// Feature matrix plus the scaled target value each row should predict.
#[derive(Debug, Clone, PartialEq)]
pub struct LagFeatureTable {
    /// One row per `t >= lag_depth`, width `C * lag_depth`
    pub features: Vec<Vec<f64>>,
    /// Scaled target at `t`
    pub labels: Vec<f64>,
}

impl LagFeatureTable {
    /// Build the table for `target` from a scaled `T × C` matrix.
    pub fn build(scaled: &[Vec<f64>], target: usize, lag_depth: usize) -> Result<Self, ForecastError> {
        let width = scaled.first().map_or(0, Vec::len);
        if let Some(row) = scaled.iter().find(|r| r.len() != width) {
            return Err(ForecastError::ShapeMismatch {
                expected: width,
                actual: row.len(),
            });
        }
        if !scaled.is_empty() && target >= width {
            return Err(ForecastError::ShapeMismatch {
                expected: width,
                actual: target + 1,
            });
        }

        let rows = scaled.len().saturating_sub(lag_depth);
        let mut features = Vec::with_capacity(rows);
        let mut labels = Vec::with_capacity(rows);

        for t in lag_depth..scaled.len() {
            let mut row = Vec::with_capacity(width * lag_depth);
            for c in 0..width {
                row.extend((1..=lag_depth).map(|j| scaled[t - j][c]));
            }
            features.push(row);
            labels.push(scaled[t][target]);
        }

        Ok(Self { features, labels })
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}
