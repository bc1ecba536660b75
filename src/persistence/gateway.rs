//! Startup-time backend selection.

use std::sync::Arc;

use crate::config::{ServiceConfig, StorageKind};
use crate::domain::{Lead, NewLead};
use crate::error::ServiceError;

use super::{FileStore, RelationalStore, SortOrder, StorageBackend};

/// Handle to the one storage backend chosen for this process.
///
/// Cheap to clone; every clone shares the same backend. Injected into the
/// ingest worker and the lead repository.
#[derive(Debug, Clone)]
pub struct PersistenceGateway {
    backend: Arc<dyn StorageBackend>,
}

impl PersistenceGateway {
    /// Wraps an already constructed backend.
    #[must_use]
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self { backend }
    }

    /// Builds the backend named by `config.storage_kind`.
    ///
    /// # Errors
    ///
    /// Returns a [`ServiceError`] if the relational backend cannot connect
    /// or create its schema. The file backend never fails here.
    pub async fn from_config(config: &ServiceConfig) -> Result<Self, ServiceError> {
        let backend: Arc<dyn StorageBackend> = match config.storage_kind {
            StorageKind::File => {
                tracing::info!(path = %config.leads_file.display(), "using file lead store");
                Arc::new(FileStore::new(config.leads_file.clone()))
            }
            StorageKind::Relational => Arc::new(RelationalStore::connect(&config.database).await?),
        };
        Ok(Self::new(backend))
    }

    /// Active backend kind.
    #[must_use]
    pub fn kind(&self) -> StorageKind {
        self.backend.kind()
    }

    /// Persists one lead.
    ///
    /// # Errors
    ///
    /// Propagates the backend's [`ServiceError`].
    pub async fn append(&self, lead: NewLead) -> Result<Lead, ServiceError> {
        self.backend.append(lead).await
    }

    /// Lists stored leads.
    ///
    /// # Errors
    ///
    /// Propagates the backend's [`ServiceError`].
    pub async fn list(&self, limit: usize, order: SortOrder) -> Result<Vec<Lead>, ServiceError> {
        self.backend.list(limit, order).await
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn file_config_builds_file_backend() {
        let Ok(dir) = tempfile::tempdir() else {
            panic!("tempdir");
        };
        let leads_file = dir.path().join("db.json");
        let Ok(mut config) = ServiceConfig::from_lookup(|_| None) else {
            panic!("default config");
        };
        config.leads_file = leads_file;

        let Ok(gateway) = PersistenceGateway::from_config(&config).await else {
            panic!("file gateway");
        };
        assert_eq!(gateway.kind(), StorageKind::File);
    }

    #[tokio::test]
    async fn relational_config_without_url_uses_sqlite() {
        let Ok(dir) = tempfile::tempdir() else {
            panic!("tempdir");
        };
        let sqlite_path = dir.path().join("fallback.db");
        let Ok(mut config) = ServiceConfig::from_lookup(|key| {
            (key == "STORAGE_BACKEND").then(|| "relational".to_string())
        }) else {
            panic!("relational config");
        };
        config.database.sqlite_path = sqlite_path.clone();

        let gateway = match PersistenceGateway::from_config(&config).await {
            Ok(gateway) => gateway,
            Err(e) => panic!("sqlite gateway: {e}"),
        };
        assert_eq!(gateway.kind(), StorageKind::Relational);
        assert!(sqlite_path.exists());
    }

    #[tokio::test]
    async fn unsupported_database_scheme_is_a_config_error() {
        let Ok(config) = ServiceConfig::from_lookup(|key| {
            (key == "DATABASE_URL").then(|| "mysql://u@h/db".to_string())
        }) else {
            panic!("config");
        };
        let result = PersistenceGateway::from_config(&config).await;
        assert!(matches!(result, Err(ServiceError::Config(_))));
    }
}
