//! SPC and equipment health endpoints

use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use super::{parse_param, DashboardState};
use crate::analytics::{anomalies, control_chart, health_scores, process_capability};
use crate::api::error::ApiError;

/// `{}`, returned when a statistic cannot be computed.
fn empty_object() -> Response {
    Json(serde_json::Map::new()).into_response()
}

fn required_parameter(raw: Option<String>) -> Result<String, ApiError> {
    raw.map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Query parameter 'parameter' is required".to_string()))
}

// ============================================================================
// SPC
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ControlChartParams {
    pub parameter: Option<String>,
}

/// GET /api/control-chart?parameter=P
pub async fn get_control_chart(
    State(state): State<DashboardState>,
    Query(params): Query<ControlChartParams>,
) -> Result<Response, ApiError> {
    let parameter = required_parameter(params.parameter)?;
    let window = state.history.snapshot();
    Ok(match control_chart(window.rows(), &parameter) {
        Some(chart) => Json(chart).into_response(),
        None => empty_object(),
    })
}

#[derive(Debug, Deserialize)]
pub struct CapabilityParams {
    pub parameter: Option<String>,
    pub usl: Option<String>,
    pub lsl: Option<String>,
}

/// GET /api/process-capability?parameter=P&usl=U&lsl=L
pub async fn get_process_capability(
    State(state): State<DashboardState>,
    Query(params): Query<CapabilityParams>,
) -> Result<Response, ApiError> {
    let parameter = required_parameter(params.parameter)?;
    let usl = parse_param::<f64>(params.usl.as_deref()).filter(|v| v.is_finite());
    let lsl = parse_param::<f64>(params.lsl.as_deref()).filter(|v| v.is_finite());

    let window = state.history.snapshot();
    Ok(match process_capability(window.rows(), &parameter, usl, lsl) {
        Some(capability) => Json(capability).into_response(),
        None => empty_object(),
    })
}

// ============================================================================
// Equipment health
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthScoreResponse {
    pub timestamps: Vec<String>,
    pub scores: Vec<f64>,
}

/// GET /api/health-score - Health score per visible row
pub async fn get_health_score(State(state): State<DashboardState>) -> Json<HealthScoreResponse> {
    let window = state.history.snapshot();
    let rows = window.rows();
    Json(HealthScoreResponse {
        timestamps: rows.iter().map(|r| r.formatted_timestamp()).collect(),
        scores: health_scores(rows),
    })
}

#[derive(Debug, Deserialize)]
pub struct AnomalyParams {
    pub threshold: Option<String>,
}

/// GET /api/anomalies?threshold=T - Z-score anomalies per channel
pub async fn get_anomalies(State(state): State<DashboardState>, Query(params): Query<AnomalyParams>) -> Response {
    let threshold = parse_param::<f64>(params.threshold.as_deref())
        .filter(|t| t.is_finite() && *t > 0.0)
        .unwrap_or(state.config.analytics.anomaly_z_threshold);
    let window = state.history.snapshot();
    Json(anomalies(window.rows(), threshold)).into_response()
}
