//! Statistical process control.
//!
//! Limits use the sample standard deviation (n - 1). Fewer than two points
//! give a zero deviation, so every limit collapses onto the centre line.

use serde::Serialize;
use statrs::statistics::Statistics;

use super::column_series;
use crate::config::defaults::{CONTROL_LIMIT_SIGMA, WARNING_LIMIT_SIGMA};
use crate::types::ObservationRow;

/// Sample standard deviation, 0 for fewer than two values.
pub fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let std = values.std_dev();
    if std.is_finite() {
        std
    } else {
        0.0
    }
}

/// Shewhart individuals chart for one parameter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ControlChart {
    pub data: Vec<f64>,
    pub timestamps: Vec<String>,
    pub center_line: f64,
    pub ucl: f64,
    pub lcl: f64,
    pub uwl: f64,
    pub lwl: f64,
    pub out_of_control: Vec<bool>,
    /// Mean absolute difference of consecutive points
    pub mr_mean: Option<f64>,
    pub parameter: String,
}

impl ControlChart {
    /// Chart over raw values. `None` when `data` is empty.
    pub fn from_values(parameter: &str, data: Vec<f64>, timestamps: Vec<String>) -> Option<Self> {
        if data.is_empty() {
            return None;
        }

        let center_line = data.iter().mean();
        let std = sample_std(&data);
        let ucl = center_line + CONTROL_LIMIT_SIGMA * std;
        let lcl = center_line - CONTROL_LIMIT_SIGMA * std;

        let out_of_control = data.iter().map(|&x| x > ucl || x < lcl).collect();
        let mr_mean = (data.len() >= 2).then(|| {
            data.windows(2).map(|w| (w[1] - w[0]).abs()).sum::<f64>() / (data.len() - 1) as f64
        });

        Some(Self {
            center_line,
            ucl,
            lcl,
            uwl: center_line + WARNING_LIMIT_SIGMA * std,
            lwl: center_line - WARNING_LIMIT_SIGMA * std,
            out_of_control,
            mr_mean,
            parameter: parameter.to_string(),
            data,
            timestamps,
        })
    }

    pub fn violations(&self) -> usize {
        self.out_of_control.iter().filter(|v| **v).count()
    }
}

/// Control chart for a named column of `rows`.
pub fn control_chart(rows: &[ObservationRow], parameter: &str) -> Option<ControlChart> {
    let series = column_series(rows, parameter)?;
    let (timestamps, data) = series
        .into_iter()
        .map(|(i, v)| (rows[i].formatted_timestamp(), v))
        .unzip();
    ControlChart::from_values(parameter, data, timestamps)
}

/// Process capability indices against optional specification limits.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessCapability {
    pub mean: f64,
    pub std: f64,
    #[serde(rename = "Cp")]
    pub cp: Option<f64>,
    #[serde(rename = "Cpk")]
    pub cpk: Option<f64>,
    #[serde(rename = "USL")]
    pub usl: Option<f64>,
    #[serde(rename = "LSL")]
    pub lsl: Option<f64>,
}

impl ProcessCapability {
    /// `None` for fewer than two values. `Cp`/`Cpk` need both limits and a
    /// non-zero deviation.
    pub fn from_values(data: &[f64], usl: Option<f64>, lsl: Option<f64>) -> Option<Self> {
        if data.len() < 2 {
            return None;
        }

        let mean = data.iter().mean();
        let std = sample_std(data);

        let (cp, cpk) = match (usl, lsl) {
            (Some(u), Some(l)) if std > 0.0 => {
                let upper = (u - mean) / (3.0 * std);
                let lower = (mean - l) / (3.0 * std);
                (Some((u - l) / (6.0 * std)), Some(upper.min(lower)))
            }
            _ => (None, None),
        };

        Some(Self {
            mean,
            std,
            cp,
            cpk,
            usl,
            lsl,
        })
    }
}

/// Capability for a named column of `rows`.
pub fn process_capability(
    rows: &[ObservationRow],
    parameter: &str,
    usl: Option<f64>,
    lsl: Option<f64>,
) -> Option<ProcessCapability> {
    let data: Vec<f64> = column_series(rows, parameter)?
        .into_iter()
        .map(|(_, v)| v)
        .collect();
    ProcessCapability::from_values(&data, usl, lsl)
}
