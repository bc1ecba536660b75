//! System endpoints: health check and the static dashboard.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;

use crate::api::dto::HealthResponse;
use crate::app_state::AppState;

const DASHBOARD_MISSING: &str = "<h1>Error: dashboard.html not found</h1>";

/// `GET /health`: Service health status.
#[utoipa::path(
    get,
    path = "/health",
    tag = "System",
    summary = "Health check",
    description = "Returns service health, version, storage backend and ingest counters.",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
    )
)]
pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".to_string(),
            timestamp: Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            storage_backend: state.storage_kind,
            ingest: state.ingest.stats(),
        }),
    )
}

/// `GET /`: Static dashboard page read from disk on every request.
pub async fn dashboard_handler(State(state): State<AppState>) -> Response {
    match tokio::fs::read_to_string(&state.dashboard_path).await {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            tracing::warn!(
                path = %state.dashboard_path.display(),
                error = %e,
                "dashboard not available"
            );
            (StatusCode::NOT_FOUND, Html(DASHBOARD_MISSING)).into_response()
        }
    }
}

/// System routes mounted at the root level.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(dashboard_handler))
        .route("/health", get(health_handler))
}
