//! System-wide default constants.
//!
//! Grouped by subsystem. Values marked as contracts are baked into the
//! trained models or the KPI definitions and are not configurable.

// ============================================================================
// Forecasting
// ============================================================================

/// Number of prior time steps per channel in a forecast feature vector.
///
/// Contract: the regressors were trained on exactly this lag depth.
pub const LAG_DEPTH: usize = 10;

/// Default number of future timestamps returned by `/api/predictions`.
pub const DEFAULT_FORECAST_STEPS: usize = 10;

/// Hours between consecutive future prediction timestamps.
pub const FORECAST_STEP_HOURS: i64 = 1;

// ============================================================================
// Breakdown
// ============================================================================

/// Minimum observations before the breakdown classifier is consulted.
pub const MIN_ROWS_FOR_BREAKDOWN: usize = 10;

// ============================================================================
// Reliability KPIs
// ============================================================================

/// Operating hours represented by one observation row.
pub const HOURS_PER_ROW: u64 = 2;

/// Mean time to repair assumed for every fault (hours).
pub const MTTR_HOURS: f64 = 0.25;

// ============================================================================
// SPC
// ============================================================================

/// Sigma multiplier for control limits (UCL/LCL).
pub const CONTROL_LIMIT_SIGMA: f64 = 3.0;

/// Sigma multiplier for warning limits (UWL/LWL).
pub const WARNING_LIMIT_SIGMA: f64 = 2.0;

/// Default z-score above which a reading is flagged as anomalous.
pub const ANOMALY_Z_THRESHOLD: f64 = 3.0;

// ============================================================================
// Health score
// ============================================================================

/// Points deducted per active fault.
pub const HEALTH_FAULT_PENALTY: f64 = 30.0;

/// Deviation (in standard deviations) beyond which a channel is penalised.
pub const HEALTH_DEVIATION_LIMIT: f64 = 2.0;

/// Points deducted per unit of deviation beyond the limit.
pub const HEALTH_DEVIATION_WEIGHT: f64 = 5.0;

/// Maximum deduction per channel.
pub const HEALTH_MAX_CHANNEL_PENALTY: f64 = 20.0;

/// Floor applied to a channel's standard deviation before dividing by it.
pub const HEALTH_MIN_STD: f64 = 0.1;

// ============================================================================
// Simulation
// ============================================================================

/// Seconds between simulated observations.
pub const SIMULATION_INTERVAL_SECS: f64 = 5.0;

/// Cursor position at startup: the first 250 rows are visible immediately.
pub const SIMULATION_START_INDEX: usize = 250;

/// Hours between consecutive synthetic row timestamps.
pub const ROW_SPACING_HOURS: i64 = 2;
