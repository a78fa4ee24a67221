#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Database plumbing for the fleet inventory.
//!
//! This crate owns everything that is not specific to one entity:
//! - a connection handle over `SeaORM` backed by `SQLx` pools (`SQLite`, `PostgreSQL`)
//! - layered configuration loaded with `figment`
//! - the uniform DAO contract ([`Dao`]) and its generic `SeaORM` implementation ([`SeaDao`])
//! - ordering/pagination ([`paging`]) and predicate building ([`filter`])
//! - the [`Traced`] decorator that wraps any DAO in `tracing` spans
//!
//! # Features
//! - `sqlite` (default), `pg`: enable `SQLx` backends
//!
//! # Example
//! ```rust,no_run
//! use fleet_db::{DbHandle, FleetDbConfig};
//!
//! # async fn demo() -> fleet_db::Result<()> {
//! let cfg = FleetDbConfig::load(None)?;
//! let db = DbHandle::from_config(&cfg).await?;
//! let conn = db.conn();
//! # let _ = conn;
//! # Ok(())
//! # }
//! ```

#![cfg_attr(
    not(any(feature = "pg", feature = "sqlite")),
    allow(
        unused_imports,
        unused_variables,
        dead_code,
        unreachable_code,
        clippy::unused_async,
    )
)]

pub mod audit;
pub mod config;
pub mod dao;
pub mod error;
pub mod filter;
pub mod paging;
pub mod sea_dao;
pub mod traced;

mod pool_opts;

pub use audit::{Audited, stamp, stamp_at};
pub use config::{FleetDbConfig, JournalMode, PagingCfg, PoolCfg, SqliteCfg};
pub use dao::{Dao, DaoResult, DaoSettings, DbConn};
pub use error::DaoError;
pub use paging::{OrderKey, Page, PageRequest, SortDir, SortField, SortKey, SortTable};
pub use sea_dao::{EntitySchema, SeaDao};
pub use traced::Traced;

use std::time::Duration;

#[cfg(any(feature = "pg", feature = "sqlite"))]
use pool_opts::ApplyPoolOpts;

#[cfg(feature = "pg")]
use sea_orm::SqlxPostgresConnector;
#[cfg(feature = "sqlite")]
use sea_orm::SqlxSqliteConnector;
#[cfg(feature = "pg")]
use sea_orm::sqlx::postgres::PgPoolOptions;
#[cfg(feature = "sqlite")]
use sea_orm::sqlx::sqlite::SqlitePoolOptions;

use sea_orm::DatabaseConnection;
use thiserror::Error;

/// Library-local result type for the connection/config layer.
pub type Result<T> = std::result::Result<T, DbError>;

/// Typed error for the DB handle and configuration.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("Unknown DSN: {0}")]
    UnknownDsn(String),

    #[error("Feature not enabled: {0}")]
    FeatureDisabled(&'static str),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Config(#[from] Box<figment::Error>),

    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[cfg(any(feature = "pg", feature = "sqlite"))]
    #[error(transparent)]
    Sqlx(#[from] sea_orm::sqlx::Error),

    #[error(transparent)]
    Sea(#[from] sea_orm::DbErr),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<figment::Error> for DbError {
    fn from(e: figment::Error) -> Self {
        Self::Config(Box::new(e))
    }
}

/// Supported engines.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DbEngine {
    Postgres,
    Sqlite,
}

/// Connection pool options.
/// Each driver applies the subset of knobs it supports.
#[derive(Clone, Debug)]
pub struct ConnectOpts {
    /// Maximum number of connections in the pool.
    pub max_conns: Option<u32>,
    /// Minimum number of connections in the pool.
    pub min_conns: Option<u32>,
    /// Timeout to acquire a connection from the pool.
    pub acquire_timeout: Option<Duration>,
    /// Idle timeout before a connection is closed.
    pub idle_timeout: Option<Duration>,
    /// Maximum lifetime for a connection.
    pub max_lifetime: Option<Duration>,
    /// Test connection health before acquire.
    pub test_before_acquire: bool,
    /// `SQLite` journal mode applied on every new connection.
    pub sqlite_journal_mode: Option<JournalMode>,
    /// `SQLite` busy timeout in milliseconds (ignored for in-memory databases).
    pub sqlite_busy_timeout_ms: u32,
}

impl Default for ConnectOpts {
    fn default() -> Self {
        Self {
            max_conns: Some(10),
            min_conns: None,
            acquire_timeout: Some(Duration::from_secs(30)),
            idle_timeout: None,
            max_lifetime: None,
            test_before_acquire: false,
            sqlite_journal_mode: None,
            sqlite_busy_timeout_ms: DEFAULT_SQLITE_BUSY_TIMEOUT,
        }
    }
}

impl From<&FleetDbConfig> for ConnectOpts {
    fn from(cfg: &FleetDbConfig) -> Self {
        Self {
            max_conns: cfg.pool.max_conns,
            min_conns: cfg.pool.min_conns,
            acquire_timeout: Some(cfg.pool.acquire_timeout),
            idle_timeout: cfg.pool.idle_timeout,
            max_lifetime: cfg.pool.max_lifetime,
            test_before_acquire: cfg.pool.test_before_acquire,
            sqlite_journal_mode: cfg.sqlite.journal_mode,
            sqlite_busy_timeout_ms: cfg.sqlite.busy_timeout_ms,
        }
    }
}

const DEFAULT_SQLITE_BUSY_TIMEOUT: u32 = 5000;

/// Main handle: a pooled `SeaORM` connection plus the engine it talks to.
#[derive(Debug, Clone)]
pub struct DbHandle {
    engine: DbEngine,
    dsn: String,
    sea: DatabaseConnection,
}

impl DbHandle {
    /// Detect engine by DSN.
    ///
    /// Only scheme prefixes are inspected; the tail (credentials etc.) is left alone.
    ///
    /// # Errors
    /// Returns `DbError::UnknownDsn` if the DSN scheme is not recognized.
    pub fn detect(dsn: &str) -> Result<DbEngine> {
        // Trim only leading spaces/newlines to be forgiving with env files.
        let s = dsn.trim_start();

        if s.starts_with("postgres://") || s.starts_with("postgresql://") {
            Ok(DbEngine::Postgres)
        } else if s.starts_with("sqlite:") {
            Ok(DbEngine::Sqlite)
        } else {
            Err(DbError::UnknownDsn(redact_credentials_in_dsn(dsn)))
        }
    }

    /// Connect using a loaded configuration.
    ///
    /// # Errors
    /// Returns an error if the DSN is invalid or the pool cannot be opened.
    pub async fn from_config(cfg: &FleetDbConfig) -> Result<Self> {
        Self::connect(&cfg.dsn, ConnectOpts::from(cfg)).await
    }

    /// Connect and build handle.
    ///
    /// # Errors
    /// Returns an error if the connection fails or the DSN is invalid.
    pub async fn connect(dsn: &str, opts: ConnectOpts) -> Result<Self> {
        let engine = Self::detect(dsn)?;
        tracing::debug!(engine = ?engine, dsn = %redact_credentials_in_dsn(dsn), "opening database pool");
        match engine {
            #[cfg(feature = "pg")]
            DbEngine::Postgres => {
                let pool = PgPoolOptions::new().apply(&opts).connect(dsn).await?;
                Ok(Self {
                    engine,
                    dsn: redact_credentials_in_dsn(dsn),
                    sea: SqlxPostgresConnector::from_sqlx_postgres_pool(pool),
                })
            }
            #[cfg(not(feature = "pg"))]
            DbEngine::Postgres => Err(DbError::FeatureDisabled("PostgreSQL feature not enabled")),
            #[cfg(feature = "sqlite")]
            DbEngine::Sqlite => {
                let is_memory = dsn.contains(":memory:") || dsn.contains("mode=memory");
                // Default: DELETE for memory, WAL for file
                let journal_mode = opts.sqlite_journal_mode.unwrap_or(if is_memory {
                    JournalMode::Delete
                } else {
                    JournalMode::Wal
                });
                let busy_timeout = opts.sqlite_busy_timeout_ms;

                let mut pool_opts = SqlitePoolOptions::new().apply(&opts);
                if is_memory {
                    // Every connection to `:memory:` is a distinct database.
                    pool_opts = pool_opts
                        .max_connections(1)
                        .min_connections(1)
                        .idle_timeout(None)
                        .max_lifetime(None);
                }

                let pool = pool_opts
                    .after_connect(move |conn, _meta| {
                        Box::pin(async move {
                            let stmt = format!("PRAGMA journal_mode = {}", journal_mode.as_sql());
                            sea_orm::sqlx::query(&stmt).execute(&mut *conn).await?;

                            // PRAGMA takes no bound parameters.
                            if !is_memory {
                                let stmt = format!("PRAGMA busy_timeout = {busy_timeout}");
                                sea_orm::sqlx::query(&stmt).execute(&mut *conn).await?;
                            }
                            Ok(())
                        })
                    })
                    .connect(dsn)
                    .await?;

                Ok(Self {
                    engine,
                    dsn: dsn.to_owned(),
                    sea: SqlxSqliteConnector::from_sqlx_sqlite_pool(pool),
                })
            }
            #[cfg(not(feature = "sqlite"))]
            DbEngine::Sqlite => Err(DbError::FeatureDisabled("SQLite feature not enabled")),
        }
    }

    /// Graceful pool close. Dropping the handle also closes it; this just makes it explicit.
    ///
    /// # Errors
    /// Returns an error if the driver fails while closing the pool.
    pub async fn close(self) -> Result<()> {
        self.sea.close().await?;
        Ok(())
    }

    /// Get the backend.
    #[must_use]
    pub fn engine(&self) -> DbEngine {
        self.engine
    }

    /// Get the DSN used for this connection, with credentials redacted.
    #[must_use]
    pub fn dsn(&self) -> &str {
        &self.dsn
    }

    /// Pooled `SeaORM` connection. Pass it (or a transaction opened on it) to any DAO.
    #[must_use]
    pub fn conn(&self) -> &DatabaseConnection {
        &self.sea
    }
}

/// Replace the password part of a URL-style DSN with `***`.
///
/// Non-URL DSNs (e.g. `sqlite::memory:`) are returned unchanged.
#[must_use]
pub fn redact_credentials_in_dsn(dsn: &str) -> String {
    match url::Url::parse(dsn) {
        Ok(mut url) if url.password().is_some() => {
            if url.set_password(Some("***")).is_ok() {
                url.to_string()
            } else {
                dsn.to_owned()
            }
        }
        _ => dsn.to_owned(),
    }
}

// ===================== tests =====================

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use sea_orm::ConnectionTrait;

    #[test]
    fn detect_recognizes_supported_schemes() {
        assert_eq!(
            DbHandle::detect("postgres://u:p@localhost/db").unwrap(),
            DbEngine::Postgres
        );
        assert_eq!(
            DbHandle::detect("postgresql://localhost/db").unwrap(),
            DbEngine::Postgres
        );
        assert_eq!(DbHandle::detect("  sqlite::memory:").unwrap(), DbEngine::Sqlite);
        assert!(matches!(
            DbHandle::detect("mysql://localhost/db"),
            Err(DbError::UnknownDsn(_))
        ));
    }

    #[test]
    fn redact_hides_password_only() {
        let redacted = redact_credentials_in_dsn("postgres://fleet:secret@db:5432/inventory");
        assert_eq!(redacted, "postgres://fleet:***@db:5432/inventory");
        assert_eq!(redact_credentials_in_dsn("sqlite::memory:"), "sqlite::memory:");
    }

    #[cfg(feature = "sqlite")]
    #[tokio::test]
    async fn test_sqlite_connection() -> Result<()> {
        let db = DbHandle::connect("sqlite::memory:", ConnectOpts::default()).await?;
        assert_eq!(db.engine(), DbEngine::Sqlite);
        db.conn().execute_unprepared("SELECT 1").await?;
        db.close().await?;
        Ok(())
    }
}
