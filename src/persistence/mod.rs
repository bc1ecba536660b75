//! Persistence layer: lead storage backends.
//!
//! Provides the [`StorageBackend`] trait with two implementations:
//! [`FileStore`] (one JSON document on disk) and [`RelationalStore`]
//! (a `leads` table behind an `sqlx` pool). [`PersistenceGateway`] picks
//! one of them from configuration at startup.

pub mod file_store;
pub mod gateway;
pub mod relational;

use async_trait::async_trait;

pub use file_store::FileStore;
pub use gateway::PersistenceGateway;
pub use relational::RelationalStore;

use crate::config::StorageKind;
use crate::domain::{Lead, NewLead};
use crate::error::ServiceError;

/// Largest page any backend returns from a single `list` call.
pub const MAX_PAGE_SIZE: usize = 100;

/// Direction in which `list` walks the stored leads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Most recently saved first.
    #[default]
    NewestFirst,
    /// Oldest saved first.
    OldestFirst,
}

/// Durable storage for leads.
///
/// Leads are append-only: there is no update or delete. Implementations
/// assign `id` and `saved_at` inside [`StorageBackend::append`].
#[async_trait]
pub trait StorageBackend: Send + Sync + std::fmt::Debug {
    /// Which backend this is.
    fn kind(&self) -> StorageKind;

    /// Persists one lead and returns the stored record.
    ///
    /// # Errors
    ///
    /// Returns a [`ServiceError`] when the record could not be written.
    async fn append(&self, lead: NewLead) -> Result<Lead, ServiceError>;

    /// Returns up to `limit` leads in the requested order.
    ///
    /// # Errors
    ///
    /// Returns a [`ServiceError`] when the backend cannot be read. The file
    /// backend never errors here; it reports an unreadable document as empty.
    async fn list(&self, limit: usize, order: SortOrder) -> Result<Vec<Lead>, ServiceError>;
}
