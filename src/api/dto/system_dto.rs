//! Health report shapes.

use serde::Serialize;
use utoipa::ToSchema;

use crate::config::StorageKind;
use crate::service::IngestStatsSnapshot;

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Always `"healthy"` while the server answers.
    pub status: String,
    /// Current server time, RFC 3339.
    pub timestamp: String,
    /// Crate version.
    pub version: String,
    /// Backend selected at startup.
    pub storage_backend: StorageKind,
    /// Ingest counters since startup.
    pub ingest: IngestStatsSnapshot,
}
