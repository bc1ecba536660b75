//! Gateway configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`). The storage backend is resolved here
//! exactly once and never changes for the lifetime of the process.

use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::Serialize;
use utoipa::ToSchema;

use crate::error::ServiceError;

/// Which [`crate::persistence::StorageBackend`] implementation to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum StorageKind {
    /// Single JSON document on local disk.
    File,
    /// SQL table in PostgreSQL or an embedded SQLite file.
    Relational,
}

impl StorageKind {
    /// Returns the canonical lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Relational => "relational",
        }
    }
}

impl fmt::Display for StorageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StorageKind {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "file" | "json" => Ok(Self::File),
            "relational" | "sql" | "database" => Ok(Self::Relational),
            other => Err(ServiceError::Config(format!(
                "unknown STORAGE_BACKEND '{other}' (expected 'file' or 'relational')"
            ))),
        }
    }
}

/// Connection settings for the relational backend.
#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    /// Connection string. `None` selects the embedded SQLite fallback.
    pub url: Option<String>,
    /// Path of the SQLite file used when `url` is `None`.
    pub sqlite_path: PathBuf,
    /// Maximum number of pooled connections.
    pub max_connections: u32,
    /// Minimum idle connections kept in the pool.
    pub min_connections: u32,
    /// Timeout for acquiring a pooled connection.
    pub connect_timeout: Duration,
}

/// Top-level gateway configuration.
///
/// Loaded once at startup via [`ServiceConfig::from_env`].
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Socket address to bind the HTTP server to (e.g. `0.0.0.0:8000`).
    pub listen_addr: SocketAddr,

    /// Active storage backend.
    pub storage_kind: StorageKind,

    /// Location of the lead document for the file backend.
    pub leads_file: PathBuf,

    /// Relational backend connection settings.
    pub database: DatabaseSettings,

    /// Capacity of the bounded ingest channel.
    pub ingest_queue_capacity: usize,

    /// Retries after the first failed append before a lead is given up.
    pub persist_max_retries: u32,

    /// Backoff before the first retry; doubles on every further attempt.
    pub persist_retry_backoff_ms: u64,

    /// Optional JSON-lines file receiving leads that exhausted their retries.
    pub dead_letter_path: Option<PathBuf>,

    /// Static dashboard served at `/`.
    pub dashboard_path: PathBuf,

    /// Emit logs as JSON instead of human-readable text.
    pub json_logs: bool,
}

impl ServiceConfig {
    /// Loads configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Config`] if `LISTEN_ADDR` cannot be parsed or
    /// `STORAGE_BACKEND` names an unknown backend.
    pub fn from_env() -> Result<Self, ServiceError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    ///
    /// Falls back to sensible defaults when a key is not set. Blank values
    /// are treated as unset.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Config`] if `LISTEN_ADDR` cannot be parsed or
    /// `STORAGE_BACKEND` names an unknown backend.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ServiceError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let listen_addr: SocketAddr = get("LISTEN_ADDR")
            .unwrap_or_else(|| "0.0.0.0:8000".to_string())
            .trim()
            .parse()
            .map_err(|e| ServiceError::Config(format!("invalid LISTEN_ADDR: {e}")))?;

        let database_url = get("DATABASE_URL").map(|url| url.trim().to_string());

        let storage_kind = match get("STORAGE_BACKEND") {
            Some(raw) => raw.parse()?,
            None if database_url.is_some() => StorageKind::Relational,
            None => StorageKind::File,
        };

        let database = DatabaseSettings {
            url: database_url,
            sqlite_path: get("SQLITE_PATH")
                .map_or_else(|| PathBuf::from("leads.db"), PathBuf::from),
            max_connections: parse_value(get("DATABASE_MAX_CONNECTIONS"), 10),
            min_connections: parse_value(get("DATABASE_MIN_CONNECTIONS"), 1),
            connect_timeout: Duration::from_secs(parse_value(
                get("DATABASE_CONNECT_TIMEOUT_SECS"),
                5,
            )),
        };

        Ok(Self {
            listen_addr,
            storage_kind,
            leads_file: get("LEADS_FILE")
                .map_or_else(|| PathBuf::from("database.json"), PathBuf::from),
            database,
            ingest_queue_capacity: parse_value(get("INGEST_QUEUE_CAPACITY"), 1024_usize).max(1),
            persist_max_retries: parse_value(get("PERSIST_MAX_RETRIES"), 2),
            persist_retry_backoff_ms: parse_value(get("PERSIST_RETRY_BACKOFF_MS"), 200),
            dead_letter_path: get("DEAD_LETTER_PATH").map(PathBuf::from),
            dashboard_path: get("DASHBOARD_PATH")
                .map_or_else(|| PathBuf::from("dashboard.html"), PathBuf::from),
            json_logs: get("LOG_FORMAT").is_some_and(|v| v.trim().eq_ignore_ascii_case("json")),
        })
    }
}

/// Parses an optional raw value as `T`, returning `default` on missing
/// or invalid values.
fn parse_value<T: FromStr>(raw: Option<String>, default: T) -> T {
    raw.and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}
