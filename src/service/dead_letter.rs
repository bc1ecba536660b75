//! JSON-lines sink for leads the ingest worker gave up on.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::io::AsyncWriteExt;

use super::ingest_queue::IngestJob;
use crate::domain::NewLead;
use crate::error::ServiceError;

/// One dead-lettered lead, as written to the log.
#[derive(Debug, Serialize)]
struct DeadLetter<'a> {
    source: &'a str,
    received_at: DateTime<Utc>,
    failed_at: DateTime<Utc>,
    attempts: u32,
    error: String,
    lead: &'a NewLead,
}

/// Append-only dead-letter file.
#[derive(Debug, Clone)]
pub struct DeadLetterLog {
    path: PathBuf,
}

impl DeadLetterLog {
    /// Creates a log writing to `path`. The file is created on first use.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the log file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one line describing a job that exhausted its retries.
    ///
    /// # Errors
    ///
    /// Returns a [`ServiceError`] if the entry cannot be encoded or the
    /// file cannot be opened or written.
    pub async fn record(
        &self,
        job: &IngestJob,
        attempts: u32,
        error: &ServiceError,
    ) -> Result<(), ServiceError> {
        let entry = DeadLetter {
            source: &job.source,
            received_at: job.received_at,
            failed_at: Utc::now(),
            attempts,
            error: error.to_string(),
            lead: &job.lead,
        };
        let mut line = serde_json::to_vec(&entry)?;
        line.push(b'\n');

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(&line).await?;
        file.flush().await?;
        Ok(())
    }
}
