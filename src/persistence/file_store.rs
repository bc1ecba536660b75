//! Whole-document JSON lead store.
//!
//! The file holds one JSON array of [`Lead`] objects, newest first. Every
//! append rewrites the whole document.
//!
//! # Concurrency
//!
//! The read → insert → write cycle runs under an async mutex, and the new
//! document is written to a sibling temp file and renamed over the old one.
//! Concurrent appends through the same `FileStore` are therefore never
//! lost, and readers never observe a half-written file. Two `FileStore`
//! instances (or two processes) sharing one path are not coordinated.

use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use super::{SortOrder, StorageBackend};
use crate::config::StorageKind;
use crate::domain::{Lead, NewLead};
use crate::error::ServiceError;

/// JSON document store for leads.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStore {
    /// Creates a store backed by the document at `path`.
    ///
    /// The file is created on the first append.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Location of the backing document.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the whole document. A missing file is an empty document.
    async fn load(&self) -> Result<Vec<Lead>, ServiceError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        serde_json::from_slice(&bytes).map_err(|e| ServiceError::CorruptDocument(e.to_string()))
    }

    /// Reads the document ahead of a rewrite. Any failure yields an empty
    /// dataset; a corrupt document is moved aside first.
    async fn load_for_write(&self) -> Vec<Lead> {
        match self.load().await {
            Ok(leads) => leads,
            Err(ServiceError::CorruptDocument(reason)) => {
                self.quarantine(&reason).await;
                Vec::new()
            }
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "lead document unreadable, starting empty"
                );
                Vec::new()
            }
        }
    }

    async fn quarantine(&self, reason: &str) {
        let target = sibling(
            &self.path,
            &format!("corrupt-{}", Utc::now().timestamp_millis()),
        );
        match tokio::fs::rename(&self.path, &target).await {
            Ok(()) => tracing::warn!(
                path = %self.path.display(),
                moved_to = %target.display(),
                reason,
                "corrupt lead document moved aside"
            ),
            Err(e) => tracing::warn!(
                path = %self.path.display(),
                error = %e,
                reason,
                "corrupt lead document could not be moved aside"
            ),
        }
    }

    async fn write_document(&self, leads: &[Lead]) -> Result<(), ServiceError> {
        let bytes = serde_json::to_vec_pretty(leads)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let tmp = sibling(&self.path, "tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(&bytes).await?;
        file.sync_all().await?;
        drop(file);

        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl StorageBackend for FileStore {
    fn kind(&self) -> StorageKind {
        StorageKind::File
    }

    async fn append(&self, lead: NewLead) -> Result<Lead, ServiceError> {
        let _guard = self.write_lock.lock().await;

        let mut leads = self.load_for_write().await;
        let saved_at = Utc::now();
        let stored = lead.into_lead(next_id(&leads, saved_at), saved_at);
        leads.insert(0, stored.clone());

        self.write_document(&leads).await?;

        tracing::debug!(id = stored.id, total = leads.len(), "lead appended to document");
        Ok(stored)
    }

    async fn list(&self, limit: usize, order: SortOrder) -> Result<Vec<Lead>, ServiceError> {
        let leads = match self.load().await {
            Ok(leads) => leads,
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "lead document unreadable, returning empty list"
                );
                return Ok(Vec::new());
            }
        };

        Ok(match order {
            SortOrder::NewestFirst => leads.into_iter().take(limit).collect(),
            SortOrder::OldestFirst => leads.into_iter().rev().take(limit).collect(),
        })
    }
}

/// Millisecond timestamp, bumped past every id already in the document.
fn next_id(leads: &[Lead], now: DateTime<Utc>) -> i64 {
    let now_ms = now.timestamp_millis();
    leads
        .iter()
        .map(|lead| lead.id)
        .max()
        .map_or(now_ms, |max| now_ms.max(max.saturating_add(1)))
}

/// `<dir>/<file>.<suffix>`
fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path
        .file_name()
        .map_or_else(|| OsString::from("leads.json"), OsString::from);
    name.push(".");
    name.push(suffix);
    path.with_file_name(name)
}
