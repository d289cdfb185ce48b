//! Error responses for the dashboard API.
//!
//! Every failure renders as `{ "error": "<message>" }` with a matching
//! status code.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use tracing::error;

use crate::forecast::ForecastError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unavailable(String),

    #[error("Computation timed out after {0:?}")]
    Timeout(Duration),

    #[error("{0}")]
    Internal(String),
}

/// Body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(status = %status, error = %self, "Request failed");
        }
        (status, Json(ErrorBody { error: self.to_string() })).into_response()
    }
}

impl From<ForecastError> for ApiError {
    fn from(e: ForecastError) -> Self {
        match e {
            ForecastError::ScalerMissing => ApiError::Unavailable(e.to_string()),
            ForecastError::ModelNotFound(_) | ForecastError::UnknownChannel(_) => ApiError::NotFound(e.to_string()),
            ForecastError::ShapeMismatch { .. } | ForecastError::Model(_) => ApiError::Internal(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body(resp: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_error_shape() {
        let resp = ApiError::NotFound("No data available".into()).into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(body(resp).await, serde_json::json!({"error": "No data available"}));
    }

    #[tokio::test]
    async fn test_timeout_maps_to_gateway_timeout() {
        let resp = ApiError::Timeout(Duration::from_secs(30)).into_response();
        assert_eq!(resp.status(), StatusCode::GATEWAY_TIMEOUT);
        assert!(body(resp).await["error"].as_str().unwrap().contains("timed out"));
    }

    #[test]
    fn test_forecast_error_mapping() {
        assert_eq!(ApiError::from(ForecastError::ScalerMissing).status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            ApiError::from(ForecastError::ShapeMismatch { expected: 12, actual: 3 }).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
