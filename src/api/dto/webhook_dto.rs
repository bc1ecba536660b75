//! Webhook acknowledgment body.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Status string returned for every webhook delivery.
pub const ACK_STATUS: &str = "recibido";

/// Fixed response to `POST /webhook/{source}`.
///
/// Sent before the lead is persisted; it says nothing about whether
/// storage will succeed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct WebhookAck {
    /// Always `"recibido"`.
    pub status: String,
}

impl WebhookAck {
    /// The one acknowledgment the gateway ever sends.
    #[must_use]
    pub fn received() -> Self {
        Self {
            status: ACK_STATUS.to_string(),
        }
    }
}
