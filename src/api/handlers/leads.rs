//! Lead listing for the dashboard.

use axum::Json;
use axum::extract::State;

use crate::app_state::AppState;
use crate::domain::Lead;
use crate::error::{ErrorResponse, ServiceError};

/// `GET /api/leads`: Latest stored leads.
///
/// # Errors
///
/// Returns [`ServiceError`] when the relational backend cannot be read.
#[utoipa::path(
    get,
    path = "/api/leads",
    tag = "Leads",
    summary = "List recent leads",
    description = "Returns at most 100 leads, newest `saved_at` first. No filtering or pagination.",
    responses(
        (status = 200, description = "Recent leads", body = Vec<Lead>),
        (status = 500, description = "Storage read failed", body = ErrorResponse),
    )
)]
pub async fn list_leads(State(state): State<AppState>) -> Result<Json<Vec<Lead>>, ServiceError> {
    let leads = state.repository.recent().await?;
    Ok(Json(leads))
}
