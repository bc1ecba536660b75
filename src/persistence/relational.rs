//! SQL lead store over an `sqlx` connection pool.
//!
//! Runs against PostgreSQL when a connection string is configured and
//! against an embedded SQLite file otherwise. Both go through the `Any`
//! driver so one set of queries serves both dialects; only the DDL
//! differs.
//!
//! `saved_at` is stored as fixed-width RFC 3339 UTC text with microsecond
//! precision, so ordering by the column text is chronological on both
//! databases.

use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::AnyPool;
use sqlx::any::AnyPoolOptions;

use super::{MAX_PAGE_SIZE, SortOrder, StorageBackend};
use crate::config::{DatabaseSettings, StorageKind};
use crate::domain::{Lead, LeadStatus, LeadType, NewLead};
use crate::error::ServiceError;

const INSERT_LEAD: &str = "INSERT INTO leads \
     (lead_type, name, email, product, price, phone, status, saved_at) \
     VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING id";

const SELECT_NEWEST: &str = "SELECT id, lead_type, name, email, product, price, phone, status, \
     saved_at FROM leads ORDER BY saved_at DESC, id DESC LIMIT $1";

const SELECT_OLDEST: &str = "SELECT id, lead_type, name, email, product, price, phone, status, \
     saved_at FROM leads ORDER BY saved_at ASC, id ASC LIMIT $1";

const CREATE_SAVED_AT_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_leads_saved_at ON leads (saved_at)";

/// Row shape returned by the `SELECT` queries.
type LeadRow = (
    i64,
    String,
    String,
    String,
    String,
    f64,
    Option<String>,
    String,
    String,
);

/// SQL flavour behind the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// PostgreSQL server.
    Postgres,
    /// Embedded SQLite file.
    Sqlite,
}

impl Dialect {
    /// Detects the dialect from a normalized connection string.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Config`] for schemes other than
    /// `postgres`/`postgresql` and `sqlite`.
    pub fn from_url(url: &str) -> Result<Self, ServiceError> {
        let lower = url.trim_start().to_ascii_lowercase();
        if lower.starts_with("postgresql://") || lower.starts_with("postgres://") {
            Ok(Self::Postgres)
        } else if lower.starts_with("sqlite:") {
            Ok(Self::Sqlite)
        } else {
            let scheme = lower.split(':').next().unwrap_or_default().to_string();
            Err(ServiceError::Config(format!(
                "unsupported database scheme '{scheme}'"
            )))
        }
    }

    const fn create_table(self) -> &'static str {
        match self {
            Self::Postgres => {
                "CREATE TABLE IF NOT EXISTS leads (\
                 id BIGSERIAL PRIMARY KEY, \
                 lead_type TEXT NOT NULL, \
                 name TEXT NOT NULL, \
                 email TEXT NOT NULL, \
                 product TEXT NOT NULL, \
                 price DOUBLE PRECISION NOT NULL, \
                 phone TEXT, \
                 status TEXT NOT NULL, \
                 saved_at TEXT NOT NULL)"
            }
            Self::Sqlite => {
                "CREATE TABLE IF NOT EXISTS leads (\
                 id INTEGER PRIMARY KEY AUTOINCREMENT, \
                 lead_type TEXT NOT NULL, \
                 name TEXT NOT NULL, \
                 email TEXT NOT NULL, \
                 product TEXT NOT NULL, \
                 price REAL NOT NULL, \
                 phone TEXT, \
                 status TEXT NOT NULL, \
                 saved_at TEXT NOT NULL)"
            }
        }
    }
}

/// Rewrites legacy or driver-qualified connection strings into the form
/// `sqlx` accepts: `postgres://` and `postgresql+psycopg2://` both become
/// `postgresql://`. Other strings pass through trimmed.
#[must_use]
pub fn normalize_dsn(raw: &str) -> String {
    let trimmed = raw.trim();
    let Some((scheme, rest)) = trimmed.split_once("://") else {
        return trimmed.to_string();
    };

    let base = scheme.split_once('+').map_or(scheme, |(base, _driver)| base);
    let base = base.to_ascii_lowercase();
    let base = match base.as_str() {
        "postgres" | "postgresql" => "postgresql",
        other => other,
    };
    format!("{base}://{rest}")
}

/// Connection string for the embedded fallback database, created on
/// first connect.
fn sqlite_fallback_url(path: &Path) -> String {
    format!("sqlite://{}?mode=rwc", path.display())
}

/// Fixed-width RFC 3339 text used for the `saved_at` column.
fn encode_saved_at(saved_at: &DateTime<Utc>) -> String {
    saved_at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn decode_saved_at(raw: &str) -> Result<DateTime<Utc>, ServiceError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| ServiceError::Persistence(format!("invalid saved_at '{raw}': {e}")))
}

fn row_to_lead(row: LeadRow) -> Result<Lead, ServiceError> {
    let (id, lead_type, name, email, product, price, phone, status, saved_at) = row;
    Ok(Lead {
        id,
        lead_type: lead_type
            .parse::<LeadType>()
            .map_err(ServiceError::Persistence)?,
        name,
        email,
        product,
        price,
        phone,
        status: status.parse::<LeadStatus>().map_err(ServiceError::Persistence)?,
        saved_at: decode_saved_at(&saved_at)?,
    })
}

/// Relational lead store backed by an [`AnyPool`].
#[derive(Debug, Clone)]
pub struct RelationalStore {
    pool: AnyPool,
    dialect: Dialect,
}

impl RelationalStore {
    /// Opens the pool and creates the `leads` table if it does not exist.
    ///
    /// Uses `settings.url` after [`normalize_dsn`], or the SQLite file at
    /// `settings.sqlite_path` when no URL is configured.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Config`] for an unsupported scheme and
    /// [`ServiceError::Database`] when connecting or creating the schema
    /// fails.
    pub async fn connect(settings: &DatabaseSettings) -> Result<Self, ServiceError> {
        sqlx::any::install_default_drivers();

        let url = match settings.url.as_deref() {
            Some(raw) => normalize_dsn(raw),
            None => {
                tracing::info!(
                    path = %settings.sqlite_path.display(),
                    "no DATABASE_URL, using embedded sqlite"
                );
                sqlite_fallback_url(&settings.sqlite_path)
            }
        };
        let dialect = Dialect::from_url(&url)?;

        let max_connections = settings.max_connections.max(1);
        let pool = AnyPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(settings.min_connections.min(max_connections))
            .acquire_timeout(settings.connect_timeout)
            .connect(&url)
            .await?;

        let store = Self { pool, dialect };
        store.ensure_schema().await?;

        tracing::info!(?dialect, max_connections, "relational lead store ready");
        Ok(store)
    }

    /// SQL flavour in use.
    #[must_use]
    pub const fn dialect(&self) -> Dialect {
        self.dialect
    }

    async fn ensure_schema(&self) -> Result<(), ServiceError> {
        sqlx::query(self.dialect.create_table())
            .execute(&self.pool)
            .await?;
        sqlx::query(CREATE_SAVED_AT_INDEX)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Closes every pooled connection.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl StorageBackend for RelationalStore {
    fn kind(&self) -> StorageKind {
        StorageKind::Relational
    }

    async fn append(&self, lead: NewLead) -> Result<Lead, ServiceError> {
        let now = Utc::now();
        let saved_at =
            DateTime::<Utc>::from_timestamp_micros(now.timestamp_micros()).unwrap_or(now);

        // The transaction owns a pooled connection; it goes back to the
        // pool on drop and rolls back if commit was never reached.
        let mut tx = self.pool.begin().await?;
        let id: i64 = sqlx::query_scalar(INSERT_LEAD)
            .bind(lead.lead_type.as_str())
            .bind(lead.name.as_str())
            .bind(lead.email.as_str())
            .bind(lead.product.as_str())
            .bind(lead.price)
            .bind(lead.phone.as_deref())
            .bind(lead.status().as_str())
            .bind(encode_saved_at(&saved_at))
            .fetch_one(&mut *tx)
            .await?;
        tx.commit().await?;

        tracing::debug!(id, "lead row inserted");
        Ok(lead.into_lead(id, saved_at))
    }

    async fn list(&self, limit: usize, order: SortOrder) -> Result<Vec<Lead>, ServiceError> {
        let sql = match order {
            SortOrder::NewestFirst => SELECT_NEWEST,
            SortOrder::OldestFirst => SELECT_OLDEST,
        };
        let limit = i64::try_from(limit.min(MAX_PAGE_SIZE)).unwrap_or(i64::MAX);

        let rows = sqlx::query_as::<_, LeadRow>(sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(row_to_lead).collect()
    }
}

#[cfg(test)]
#[allow(clippy::panic, clippy::indexing_slicing)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn settings(dir: &tempfile::TempDir) -> DatabaseSettings {
        DatabaseSettings {
            url: None,
            sqlite_path: dir.path().join("leads.db"),
            max_connections: 2,
            min_connections: 0,
            connect_timeout: Duration::from_secs(5),
        }
    }

    async fn sqlite_store() -> (tempfile::TempDir, RelationalStore) {
        let Ok(dir) = tempfile::tempdir() else {
            panic!("tempdir");
        };
        let store = match RelationalStore::connect(&settings(&dir)).await {
            Ok(store) => store,
            Err(e) => panic!("sqlite store should open: {e}"),
        };
        (dir, store)
    }

    fn lead(lead_type: LeadType, name: &str, phone: Option<&str>) -> NewLead {
        NewLead {
            lead_type,
            name: name.to_string(),
            email: "a@x.com".to_string(),
            product: "Course".to_string(),
            price: if lead_type == LeadType::Sale { 99.9 } else { 0.0 },
            phone: phone.map(str::to_string),
        }
    }

    #[test]
    fn normalizes_legacy_schemes() {
        assert_eq!(
            normalize_dsn("postgres://u:p@host:5432/db"),
            "postgresql://u:p@host:5432/db"
        );
        assert_eq!(
            normalize_dsn("  postgresql+psycopg2://u@host/db "),
            "postgresql://u@host/db"
        );
        assert_eq!(normalize_dsn("postgresql://u@host/db"), "postgresql://u@host/db");
        assert_eq!(normalize_dsn("sqlite::memory:"), "sqlite::memory:");
        assert_eq!(normalize_dsn("sqlite://leads.db"), "sqlite://leads.db");
    }

    #[test]
    fn detects_dialect() {
        assert!(matches!(
            Dialect::from_url("postgresql://h/db"),
            Ok(Dialect::Postgres)
        ));
        assert!(matches!(Dialect::from_url("sqlite://x.db"), Ok(Dialect::Sqlite)));
        assert!(matches!(
            Dialect::from_url("mysql://h/db"),
            Err(ServiceError::Config(_))
        ));
    }

    #[test]
    fn saved_at_text_is_fixed_width() {
        let Some(a) = DateTime::<Utc>::from_timestamp_micros(1_700_000_000_000_000) else {
            panic!("valid timestamp");
        };
        let encoded = encode_saved_at(&a);
        assert_eq!(encoded, "2023-11-14T22:13:20.000000Z");
        let Ok(decoded) = decode_saved_at(&encoded) else {
            panic!("round trip");
        };
        assert_eq!(decoded, a);
    }

    #[tokio::test]
    async fn append_then_list_newest_first() {
        let (_dir, store) = sqlite_store().await;
        assert_eq!(store.dialect(), Dialect::Sqlite);

        let Ok(first) = store.append(lead(LeadType::Sale, "Ana", Some("555"))).await else {
            panic!("append sale");
        };
        let Ok(second) = store.append(lead(LeadType::Abandonment, "Luis", None)).await else {
            panic!("append abandonment");
        };
        assert!(second.id > first.id);

        let Ok(leads) = store.list(10, SortOrder::NewestFirst).await else {
            panic!("list");
        };
        assert_eq!(leads, vec![second.clone(), first.clone()]);
        assert_eq!(leads[0].status, LeadStatus::Abandoned);
        assert_eq!(leads[1].phone.as_deref(), Some("555"));

        let Ok(oldest) = store.list(1, SortOrder::OldestFirst).await else {
            panic!("list");
        };
        assert_eq!(oldest, vec![first]);
        store.close().await;
    }

    #[tokio::test]
    async fn list_is_capped_at_page_size() {
        let (_dir, store) = sqlite_store().await;
        for i in 0..(MAX_PAGE_SIZE + 5) {
            let Ok(_) = store.append(lead(LeadType::Sale, &format!("n{i}"), None)).await else {
                panic!("append {i}");
            };
        }
        let Ok(leads) = store.list(1_000, SortOrder::NewestFirst).await else {
            panic!("list");
        };
        assert_eq!(leads.len(), MAX_PAGE_SIZE);
        assert_eq!(leads[0].name, format!("n{}", MAX_PAGE_SIZE + 4));
        store.close().await;
    }

    #[tokio::test]
    async fn schema_creation_is_idempotent() {
        let Ok(dir) = tempfile::tempdir() else {
            panic!("tempdir");
        };
        let Ok(first) = RelationalStore::connect(&settings(&dir)).await else {
            panic!("first open");
        };
        let Ok(_) = first.append(lead(LeadType::Sale, "kept", None)).await else {
            panic!("append");
        };
        first.close().await;

        let Ok(second) = RelationalStore::connect(&settings(&dir)).await else {
            panic!("reopen");
        };
        let Ok(leads) = second.list(10, SortOrder::NewestFirst).await else {
            panic!("list");
        };
        assert_eq!(leads.len(), 1);
        assert_eq!(leads[0].name, "kept");
        second.close().await;
    }
}
