//! API route handlers
//!
//! Request handling logic for all API endpoints including:
//! - Historical data and model inference
//! - Reliability KPIs, SPC and equipment health
//! - Simulation clock control and liveness

mod data;
mod kpis;
mod predictions;
mod quality;
mod simulation;
mod status;

pub use data::*;
pub use kpis::*;
pub use predictions::*;
pub use quality::*;
pub use simulation::*;
pub use status::*;

use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

use super::error::ApiError;
use crate::config::DashboardConfig;
use crate::data::HistoryStore;
use crate::models::ModelStore;
use crate::simulation::SimulationController;

// ============================================================================
// API State
// ============================================================================

/// Shared state for API handlers
#[derive(Clone)]
pub struct DashboardState {
    /// Observation history bounded by the simulation cursor
    pub history: Arc<HistoryStore>,
    /// Forecast and breakdown models, read-only after startup
    pub models: Arc<ModelStore>,
    /// Replay clock; the only writer of `history`
    pub simulation: Arc<SimulationController>,
    pub config: Arc<DashboardConfig>,
    pub started_at: Instant,
}

impl DashboardState {
    /// Build the state and its simulation controller. `shutdown` stops any
    /// running replay when cancelled.
    pub fn new(
        history: Arc<HistoryStore>,
        models: Arc<ModelStore>,
        config: Arc<DashboardConfig>,
        shutdown: CancellationToken,
    ) -> Self {
        let simulation = Arc::new(SimulationController::new(
            Arc::clone(&history),
            config.simulation.interval(),
            shutdown,
        ));
        Self {
            history,
            models,
            simulation,
            config,
            started_at: Instant::now(),
        }
    }

    fn inference_timeout(&self) -> Duration {
        self.config.inference.timeout()
    }
}

/// Run CPU-bound model inference on the blocking pool, bounded by `timeout`.
async fn run_inference<T, F>(timeout: Duration, f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    match tokio::time::timeout(timeout, tokio::task::spawn_blocking(f)).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(ApiError::Internal(format!("Inference task failed: {e}"))),
        Err(_) => Err(ApiError::Timeout(timeout)),
    }
}

/// Lenient numeric query parameter: absent or unparsable values are `None`.
fn parse_param<T: std::str::FromStr>(raw: Option<&str>) -> Option<T> {
    raw.and_then(|s| s.trim().parse().ok())
}
