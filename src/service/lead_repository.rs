//! Read-only query surface for the reporting API.

use crate::domain::Lead;
use crate::error::ServiceError;
use crate::persistence::{MAX_PAGE_SIZE, PersistenceGateway, SortOrder};

/// Number of leads returned by [`LeadRepository::recent`].
pub const LEADS_PAGE_SIZE: usize = MAX_PAGE_SIZE;

/// Read-only facade over the active storage backend.
///
/// No filtering and no cursors: callers get the latest page.
#[derive(Debug, Clone)]
pub struct LeadRepository {
    gateway: PersistenceGateway,
}

impl LeadRepository {
    /// Creates a repository reading through `gateway`.
    #[must_use]
    pub fn new(gateway: PersistenceGateway) -> Self {
        Self { gateway }
    }

    /// Returns up to [`LEADS_PAGE_SIZE`] leads, newest `saved_at` first.
    ///
    /// # Errors
    ///
    /// Propagates relational read failures. The file backend reports an
    /// unreadable document as an empty list instead.
    pub async fn recent(&self) -> Result<Vec<Lead>, ServiceError> {
        self.gateway
            .list(LEADS_PAGE_SIZE, SortOrder::NewestFirst)
            .await
    }
}

#[cfg(test)]
#[allow(clippy::panic, clippy::indexing_slicing)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::domain::{LeadType, NewLead};
    use crate::persistence::FileStore;

    #[tokio::test]
    async fn recent_is_newest_first_and_capped() {
        let Ok(dir) = tempfile::tempdir() else {
            panic!("tempdir");
        };
        let gateway = PersistenceGateway::new(Arc::new(FileStore::new(dir.path().join("db.json"))));
        for i in 0..(LEADS_PAGE_SIZE + 3) {
            let lead = NewLead {
                lead_type: LeadType::Abandonment,
                name: format!("visitor-{i}"),
                email: "v@x.com".to_string(),
                product: "Course".to_string(),
                price: 0.0,
                phone: None,
            };
            let Ok(_) = gateway.append(lead).await else {
                panic!("append {i}");
            };
        }

        let repository = LeadRepository::new(gateway);
        let Ok(leads) = repository.recent().await else {
            panic!("recent");
        };
        assert_eq!(leads.len(), LEADS_PAGE_SIZE);
        assert_eq!(leads[0].name, format!("visitor-{}", LEADS_PAGE_SIZE + 2));
        assert!(leads.windows(2).all(|w| w[0].saved_at >= w[1].saved_at));
    }

    #[tokio::test]
    async fn empty_store_yields_empty_page() {
        let Ok(dir) = tempfile::tempdir() else {
            panic!("tempdir");
        };
        let repository = LeadRepository::new(PersistenceGateway::new(Arc::new(FileStore::new(
            dir.path().join("missing.json"),
        ))));
        let Ok(leads) = repository.recent().await else {
            panic!("recent");
        };
        assert!(leads.is_empty());
    }
}
