//! REST endpoint handlers organized by resource.

pub mod leads;
pub mod system;
pub mod webhook;

use axum::Router;
use axum::routing::{get, post};

use crate::app_state::AppState;

/// Composes the ingest and read routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/webhook/{source}", post(webhook::receive_webhook))
        .route("/api/leads", get(leads::list_leads))
}
