//! Bounded ingest queue and its persistence worker.
//!
//! The webhook handler hands classified leads to [`IngestQueue::submit`],
//! which never waits: a full queue drops the job and counts it. A single
//! worker task drains the channel and appends through the
//! [`PersistenceGateway`], retrying with exponential backoff. Jobs that
//! exhaust their retries are counted, logged, and optionally written to a
//! [`DeadLetterLog`].

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use utoipa::ToSchema;

use super::dead_letter::DeadLetterLog;
use crate::config::ServiceConfig;
use crate::domain::NewLead;
use crate::error::ServiceError;
use crate::persistence::PersistenceGateway;

/// A classified lead waiting to be persisted.
#[derive(Debug, Clone)]
pub struct IngestJob {
    /// Path segment the webhook arrived on (e.g. `hotmart`).
    pub source: String,
    /// Lead to store.
    pub lead: NewLead,
    /// When the webhook was received.
    pub received_at: DateTime<Utc>,
}

impl IngestJob {
    /// Creates a job stamped with the current time.
    #[must_use]
    pub fn new(source: impl Into<String>, lead: NewLead) -> Self {
        Self {
            source: source.into(),
            lead,
            received_at: Utc::now(),
        }
    }
}

/// How failed appends are retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first failed attempt.
    pub max_retries: u32,
    /// Delay before the first retry; doubled for each later one.
    pub initial_backoff: Duration,
}

impl RetryPolicy {
    /// Delay before retry number `retry` (1-based).
    #[must_use]
    pub fn delay(&self, retry: u32) -> Duration {
        let factor = 2_u32.saturating_pow(retry.saturating_sub(1));
        self.initial_backoff.saturating_mul(factor)
    }
}

/// Queue sizing and failure handling.
#[derive(Debug, Clone)]
pub struct IngestSettings {
    /// Channel capacity.
    pub capacity: usize,
    /// Retry policy for failed appends.
    pub retry: RetryPolicy,
    /// Where to record jobs that exhausted their retries.
    pub dead_letter: Option<DeadLetterLog>,
}

impl IngestSettings {
    /// Extracts the ingest settings from the service configuration.
    #[must_use]
    pub fn from_config(config: &ServiceConfig) -> Self {
        Self {
            capacity: config.ingest_queue_capacity,
            retry: RetryPolicy {
                max_retries: config.persist_max_retries,
                initial_backoff: Duration::from_millis(config.persist_retry_backoff_ms),
            },
            dead_letter: config.dead_letter_path.clone().map(DeadLetterLog::new),
        }
    }
}

/// Live counters shared by the queue handle and the worker.
#[derive(Debug, Default)]
struct IngestStats {
    accepted: AtomicU64,
    unrecognized: AtomicU64,
    dropped: AtomicU64,
    persisted: AtomicU64,
    retried: AtomicU64,
    failed: AtomicU64,
}

impl IngestStats {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Point-in-time copy of the ingest counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct IngestStatsSnapshot {
    /// Jobs placed on the queue.
    pub accepted: u64,
    /// Webhooks whose event was not recognized.
    pub unrecognized: u64,
    /// Jobs rejected because the queue was full or closed.
    pub dropped: u64,
    /// Jobs stored successfully.
    pub persisted: u64,
    /// Individual retry attempts.
    pub retried: u64,
    /// Jobs given up after exhausting retries.
    pub failed: u64,
}

/// Producer handle for the ingest worker.
#[derive(Debug, Clone)]
pub struct IngestQueue {
    sender: mpsc::Sender<IngestJob>,
    stats: Arc<IngestStats>,
}

impl IngestQueue {
    /// Spawns the persistence worker and returns the producer handle.
    ///
    /// The worker stops once every clone of the returned queue is dropped
    /// and the channel is drained; await the handle to wait for that.
    #[must_use]
    pub fn start(gateway: PersistenceGateway, settings: IngestSettings) -> (Self, JoinHandle<()>) {
        let (queue, receiver) = Self::channel(settings.capacity);
        let worker = IngestWorker {
            receiver,
            gateway,
            retry: settings.retry,
            dead_letter: settings.dead_letter,
            stats: Arc::clone(&queue.stats),
        };
        let handle = tokio::spawn(worker.run());
        (queue, handle)
    }

    fn channel(capacity: usize) -> (Self, mpsc::Receiver<IngestJob>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let queue = Self {
            sender,
            stats: Arc::new(IngestStats::default()),
        };
        (queue, receiver)
    }

    /// Enqueues a job without waiting.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::QueueFull`] when the channel is at capacity
    /// and [`ServiceError::QueueClosed`] when the worker has stopped. The
    /// job is dropped in both cases.
    pub fn submit(&self, job: IngestJob) -> Result<(), ServiceError> {
        match self.sender.try_send(job) {
            Ok(()) => {
                IngestStats::bump(&self.stats.accepted);
                Ok(())
            }
            Err(mpsc::error::TrySendError::Full(_)) => {
                IngestStats::bump(&self.stats.dropped);
                Err(ServiceError::QueueFull)
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                IngestStats::bump(&self.stats.dropped);
                Err(ServiceError::QueueClosed)
            }
        }
    }

    /// Counts a webhook that produced no lead.
    pub fn record_unrecognized(&self) {
        IngestStats::bump(&self.stats.unrecognized);
    }

    /// Returns the current counters.
    #[must_use]
    pub fn stats(&self) -> IngestStatsSnapshot {
        Self::snapshot(&self.stats)
    }

    fn snapshot(stats: &IngestStats) -> IngestStatsSnapshot {
        let load = |counter: &AtomicU64| counter.load(Ordering::Relaxed);
        IngestStatsSnapshot {
            accepted: load(&stats.accepted),
            unrecognized: load(&stats.unrecognized),
            dropped: load(&stats.dropped),
            persisted: load(&stats.persisted),
            retried: load(&stats.retried),
            failed: load(&stats.failed),
        }
    }
}

/// Consumer side: owns the receiver and appends one job at a time.
struct IngestWorker {
    receiver: mpsc::Receiver<IngestJob>,
    gateway: PersistenceGateway,
    retry: RetryPolicy,
    dead_letter: Option<DeadLetterLog>,
    stats: Arc<IngestStats>,
}

impl IngestWorker {
    async fn run(mut self) {
        tracing::info!(backend = %self.gateway.kind(), "ingest worker started");
        while let Some(job) = self.receiver.recv().await {
            self.process(job).await;
        }
        tracing::info!("ingest worker stopped");
    }

    async fn process(&self, job: IngestJob) {
        let mut retries = 0_u32;
        loop {
            match self.gateway.append(job.lead.clone()).await {
                Ok(lead) => {
                    IngestStats::bump(&self.stats.persisted);
                    tracing::info!(
                        id = lead.id,
                        source = %job.source,
                        lead_type = %lead.lead_type,
                        name = %lead.name,
                        "lead persisted"
                    );
                    return;
                }
                Err(e) if retries < self.retry.max_retries => {
                    retries += 1;
                    IngestStats::bump(&self.stats.retried);
                    let delay = self.retry.delay(retries);
                    tracing::warn!(
                        source = %job.source,
                        error = %e,
                        retry = retries,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        "lead append failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    IngestStats::bump(&self.stats.failed);
                    tracing::error!(
                        source = %job.source,
                        error = %e,
                        attempts = retries + 1,
                        "lead append failed, giving up"
                    );
                    if let Some(dead_letter) = &self.dead_letter
                        && let Err(dl_err) = dead_letter.record(&job, retries + 1, &e).await
                    {
                        tracing::error!(
                            path = %dead_letter.path().display(),
                            error = %dl_err,
                            "dead letter write failed, lead lost"
                        );
                    }
                    return;
                }
            }
        }
    }
}
