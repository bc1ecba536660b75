//! Service error types with HTTP status code mapping.
//!
//! [`ServiceError`] is the central error type for the gateway. Each variant
//! maps to a specific HTTP status code and structured JSON error response.
//!
//! Most of these never reach an HTTP client: the webhook path always
//! acknowledges, and persistence failures are absorbed by the ingest worker.
//! Only the read API surfaces them.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 3002,
///     "message": "database error: pool timed out while waiting for an open connection",
///     "details": null
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code.
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category      | HTTP Status                   |
/// |-----------|---------------|-------------------------------|
/// | 1000–1999 | Configuration | 500 Internal Server Error     |
/// | 3001–3005 | Storage       | 500 Internal Server Error     |
/// | 3006–3007 | Ingest queue  | 503 Service Unavailable       |
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Invalid or missing configuration value.
    #[error("configuration error: {0}")]
    Config(String),

    /// Generic persistence layer failure.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// Error raised by the relational driver.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Filesystem failure while reading or writing a document.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding or decoding failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The lead document exists but does not hold a valid lead array.
    #[error("corrupt lead document: {0}")]
    CorruptDocument(String),

    /// The ingest queue is at capacity.
    #[error("ingest queue is full")]
    QueueFull,

    /// The ingest worker has stopped.
    #[error("ingest queue is closed")]
    QueueClosed,
}

impl ServiceError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::Config(_) => 1001,
            Self::Persistence(_) => 3001,
            Self::Database(_) => 3002,
            Self::Io(_) => 3003,
            Self::Serialization(_) => 3004,
            Self::CorruptDocument(_) => 3005,
            Self::QueueFull => 3006,
            Self::QueueClosed => 3007,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::QueueFull | Self::QueueClosed => StatusCode::SERVICE_UNAVAILABLE,
            Self::Config(_)
            | Self::Persistence(_)
            | Self::Database(_)
            | Self::Io(_)
            | Self::Serialization(_)
            | Self::CorruptDocument(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(code = self.error_code(), error = %self, "request failed");
        }
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}
