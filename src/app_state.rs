//! Shared application state injected into all Axum handlers.

use std::path::PathBuf;

use crate::config::StorageKind;
use crate::service::{IngestQueue, LeadRepository};

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Producer side of the background persistence queue.
    pub ingest: IngestQueue,
    /// Read access to stored leads.
    pub repository: LeadRepository,
    /// Backend chosen at startup, reported by `/health`.
    pub storage_kind: StorageKind,
    /// Static dashboard served at `/`.
    pub dashboard_path: PathBuf,
}
