//! Service layer: ingest scheduling and read access.
//!
//! [`IngestQueue`] moves classified leads from the webhook handler to
//! storage in the background; [`LeadRepository`] serves the read API.

pub mod dead_letter;
pub mod ingest_queue;
pub mod lead_repository;

pub use dead_letter::DeadLetterLog;
pub use ingest_queue::{IngestJob, IngestQueue, IngestSettings, IngestStatsSnapshot, RetryPolicy};
pub use lead_repository::{LEADS_PAGE_SIZE, LeadRepository};
