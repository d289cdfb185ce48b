//! Model inference endpoints: forecasts and breakdown probabilities

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

use super::{parse_param, run_inference, DashboardState};
use crate::api::error::ApiError;
use crate::config::defaults::DEFAULT_FORECAST_STEPS;
use crate::forecast::{forecast, future_timestamps, predict_breakdown};
use crate::models::FaultProbabilities;

#[derive(Debug, Deserialize)]
pub struct PredictionParams {
    pub steps: Option<String>,
}

#[derive(Debug, Default, Serialize)]
pub struct PredictionsResponse {
    /// Future timestamps, one hour apart after the last visible row
    pub timestamps: Vec<String>,
    /// `[channel, values]` pairs in channel order
    pub predictions: Vec<(String, Vec<f64>)>,
}

/// Requested step count: default when absent, zero or invalid; capped.
fn forecast_steps(raw: Option<&str>, max: usize) -> usize {
    parse_param::<usize>(raw)
        .filter(|s| *s > 0)
        .unwrap_or(DEFAULT_FORECAST_STEPS)
        .min(max)
}

/// GET /api/predictions?steps=N - Per-channel forecasts over the window
pub async fn get_predictions(
    State(state): State<DashboardState>,
    Query(params): Query<PredictionParams>,
) -> Result<Json<PredictionsResponse>, ApiError> {
    let steps = forecast_steps(params.steps.as_deref(), state.config.inference.max_forecast_steps);
    let window = state.history.snapshot();
    let Some(last) = window.last() else {
        return Ok(Json(PredictionsResponse::default()));
    };
    let timestamps = future_timestamps(last.timestamp, steps);

    let models = Arc::clone(&state.models);
    let report = run_inference(state.inference_timeout(), move || {
        let targets = models.forecast.registry.targets();
        forecast(window.rows(), &models.forecast, &targets)
    })
    .await??;

    Ok(Json(PredictionsResponse {
        timestamps,
        predictions: report.predictions,
    }))
}

/// GET /api/breakdown-prediction - Fault probabilities for the latest row
pub async fn get_breakdown_prediction(State(state): State<DashboardState>) -> Json<FaultProbabilities> {
    let window = state.history.snapshot();
    let models = Arc::clone(&state.models);
    let result = run_inference(state.inference_timeout(), move || {
        predict_breakdown(window.rows(), &models.breakdown)
    })
    .await;

    match result {
        Ok(probs) => Json(probs),
        Err(e) => {
            warn!(error = %e, "Breakdown prediction unavailable");
            Json(FaultProbabilities::UNAVAILABLE)
        }
    }
}
