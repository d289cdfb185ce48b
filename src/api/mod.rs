//! REST API module using Axum
//!
//! Provides HTTP endpoints for the pump/valve maintenance dashboard:
//! - JSON API under `/api` (data, inference, KPIs, SPC, simulation control)
//! - Liveness check at `/health`
//! - Dashboard page served via `rust-embed` (compiled into the binary)

pub mod error;
pub mod handlers;
mod routes;

pub use error::ApiError;
pub use handlers::DashboardState;

use axum::extract::OriginalUri;
use axum::http::{header, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Router;
use rust_embed::Embed;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Environment variable listing allowed cross-origin origins.
pub const CORS_ENV_VAR: &str = "PUMPGUARD_CORS_ORIGINS";

/// Dashboard assets compiled from `dashboard/`.
#[derive(Embed)]
#[folder = "dashboard/"]
struct DashboardAssets;

/// Serve a static asset, falling back to `index.html`.
///
/// Unknown `/api/*` paths get a JSON 404 instead of the page.
async fn serve_asset(OriginalUri(uri): OriginalUri) -> Response {
    let path = uri.path().trim_start_matches('/');

    if path.starts_with("api/") {
        return ApiError::NotFound(format!("No such endpoint: /{path}")).into_response();
    }

    if let Some(content) = DashboardAssets::get(path) {
        let mime = mime_guess::from_path(path).first_or_octet_stream();
        return (
            StatusCode::OK,
            [(header::CONTENT_TYPE, mime.as_ref())],
            content.data.into_owned(),
        )
            .into_response();
    }

    if let Some(index) = DashboardAssets::get("index.html") {
        return (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/html")],
            index.data.into_owned(),
        )
            .into_response();
    }

    (StatusCode::OK, "pumpguard is running. Dashboard assets not found.").into_response()
}

/// Build a CORS layer that is restrictive by default (same-origin only).
///
/// Set `PUMPGUARD_CORS_ORIGINS` to a comma-separated list of allowed origins
/// to serve a dashboard hosted elsewhere.
fn build_cors_layer() -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    match std::env::var(CORS_ENV_VAR) {
        Ok(origins) => {
            let allowed: Vec<_> = origins
                .split(',')
                .filter_map(|o| o.trim().parse().ok())
                .collect();
            tracing::info!(origins = %origins, "CORS: allowing configured origins");
            base.allow_origin(allowed)
        }
        Err(_) => base,
    }
}

/// Create the complete application router with API and dashboard serving.
pub fn create_app(state: DashboardState) -> Router {
    let cors = build_cors_layer();

    Router::new()
        .nest("/api", routes::api_routes(state.clone()))
        .merge(routes::root_routes(state))
        .fallback(serve_asset)
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
}
