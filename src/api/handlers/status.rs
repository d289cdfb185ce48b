//! Liveness endpoint

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use super::DashboardState;

#[derive(Debug, Serialize)]
pub struct HealthCheckResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub uptime_secs: u64,
    pub total_rows: usize,
    pub forecast_models: usize,
    pub breakdown_ready: bool,
}

/// GET /health - Liveness check
pub async fn health_check(State(state): State<DashboardState>) -> Json<HealthCheckResponse> {
    let breakdown = &state.models.breakdown;
    Json(HealthCheckResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        uptime_secs: state.started_at.elapsed().as_secs(),
        total_rows: state.history.total_rows(),
        forecast_models: state.models.forecast.registry.len(),
        breakdown_ready: breakdown.scaler.is_some() && breakdown.classifier.is_some(),
    })
}
