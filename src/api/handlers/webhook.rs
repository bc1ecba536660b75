//! Webhook receiver: decode, classify, enqueue, acknowledge.

use axum::Json;
use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::api::dto::WebhookAck;
use crate::app_state::AppState;
use crate::domain::{ClassifiedEvent, classify, decode_payload};
use crate::service::IngestJob;

/// `POST /webhook/{source}`: Receive a payment-platform event.
///
/// Always answers `200 {"status": "recibido"}`. Classification happens
/// inline; persistence is queued and never awaited here, so neither an
/// unreadable body nor a storage outage changes the response.
#[utoipa::path(
    post,
    path = "/webhook/{source}",
    tag = "Webhooks",
    summary = "Receive a webhook delivery",
    description = "Accepts a JSON or form-encoded body with an `event` field. \
        Sales and cart abandonments are queued for storage; other events are discarded. \
        The acknowledgment is sent before anything is stored.",
    params(
        ("source" = String, Path, description = "Sending platform, e.g. `hotmart`"),
    ),
    request_body(
        content = String,
        description = "JSON object, or form-encoded fields, carrying an `event` name",
        content_type = "application/json"
    ),
    responses(
        (status = 200, description = "Delivery acknowledged", body = WebhookAck),
    )
)]
pub async fn receive_webhook(
    State(state): State<AppState>,
    Path(source): Path<String>,
    body: Result<Bytes, BytesRejection>,
) -> impl IntoResponse {
    let body = body.unwrap_or_else(|rejection| {
        tracing::warn!(%source, error = %rejection, "webhook body unreadable, treating as empty");
        Bytes::new()
    });
    let payload = decode_payload(&body);

    match classify(&payload) {
        ClassifiedEvent::Unrecognized { event } => {
            state.ingest.record_unrecognized();
            tracing::debug!(%source, ?event, "unrecognized webhook event discarded");
        }
        recognized => {
            let kind = recognized.label();
            if let Some(lead) = recognized.into_new_lead() {
                tracing::info!(%source, kind, name = %lead.name, "webhook lead queued");
                if let Err(e) = state.ingest.submit(IngestJob::new(source.as_str(), lead)) {
                    tracing::warn!(
                        %source,
                        kind,
                        error = %e,
                        "webhook lead dropped before persistence"
                    );
                }
            }
        }
    }

    (StatusCode::OK, Json(WebhookAck::received()))
}
