//! API route definitions
//!
//! - /api/current-data - Visible history, all channels and fault flags
//! - /api/predictions - Per-channel forecasts
//! - /api/breakdown-prediction - Fault probabilities for the latest row
//! - /api/kpis - Reliability KPIs per equipment
//! - /api/control-chart, /api/process-capability - SPC
//! - /api/health-score, /api/anomalies - Equipment health
//! - /api/simulation/{start,stop,status} - Replay clock

use axum::{routing::{get, post}, Router};

use super::handlers::{self, DashboardState};

/// Create all API routes for the dashboard
pub fn api_routes(state: DashboardState) -> Router {
    Router::new()
        .route("/current-data", get(handlers::get_current_data))
        .route("/predictions", get(handlers::get_predictions))
        .route("/breakdown-prediction", get(handlers::get_breakdown_prediction))
        .route("/kpis", get(handlers::get_kpis))
        // SPC
        .route("/control-chart", get(handlers::get_control_chart))
        .route("/process-capability", get(handlers::get_process_capability))
        // Equipment health
        .route("/health-score", get(handlers::get_health_score))
        .route("/anomalies", get(handlers::get_anomalies))
        // Simulation clock
        .route("/simulation/start", post(handlers::start_simulation))
        .route("/simulation/stop", post(handlers::stop_simulation))
        .route("/simulation/status", get(handlers::get_simulation_status))
        .with_state(state)
}

/// Liveness endpoint at root level
pub fn root_routes(state: DashboardState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .with_state(state)
}
