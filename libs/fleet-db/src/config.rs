//! Layered configuration for the database layer.
//!
//! Sources are merged in this order, later ones winning:
//! 1. built-in defaults
//! 2. an optional YAML file (`database:` section)
//! 3. environment variables prefixed with `FLEET_DB__`, nested with `__`
//!    (e.g. `FLEET_DB__DATABASE__PAGING__DEFAULT_LIMIT=50`)

use std::path::Path;
use std::time::Duration;

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use serde::{Deserialize, Serialize};

use crate::dao::DaoSettings;
use crate::{DbError, Result};

/// Figment key holding the database section.
pub const CONFIG_KEY: &str = "database";

/// Environment prefix for overrides.
pub const ENV_PREFIX: &str = "FLEET_DB__";

/// Top-level database configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FleetDbConfig {
    /// Connection string: `postgres://...` or `sqlite:...`.
    pub dsn: String,
    pub pool: PoolCfg,
    pub paging: PagingCfg,
    /// Hard cap on items accepted by `create_multiple`/`update_multiple`.
    pub max_batch_items: usize,
    pub sqlite: SqliteCfg,
}

impl Default for FleetDbConfig {
    fn default() -> Self {
        Self {
            dsn: "sqlite::memory:".to_owned(),
            pool: PoolCfg::default(),
            paging: PagingCfg::default(),
            max_batch_items: DaoSettings::DEFAULT_MAX_BATCH_ITEMS,
            sqlite: SqliteCfg::default(),
        }
    }
}

/// Pool sizing and timeouts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PoolCfg {
    pub max_conns: Option<u32>,
    pub min_conns: Option<u32>,
    #[serde(with = "humantime_serde")]
    pub acquire_timeout: Duration,
    #[serde(with = "humantime_serde")]
    pub idle_timeout: Option<Duration>,
    #[serde(with = "humantime_serde")]
    pub max_lifetime: Option<Duration>,
    pub test_before_acquire: bool,
}

impl Default for PoolCfg {
    fn default() -> Self {
        Self {
            max_conns: Some(10),
            min_conns: None,
            acquire_timeout: Duration::from_secs(30),
            idle_timeout: None,
            max_lifetime: None,
            test_before_acquire: false,
        }
    }
}

/// Page window defaults shared by every DAO.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PagingCfg {
    pub default_limit: u64,
    pub max_limit: u64,
}

impl Default for PagingCfg {
    fn default() -> Self {
        Self {
            default_limit: DaoSettings::DEFAULT_LIMIT,
            max_limit: DaoSettings::DEFAULT_MAX_LIMIT,
        }
    }
}

/// `SQLite` journal modes. Only these are ever written into a `PRAGMA`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum JournalMode {
    #[serde(alias = "delete")]
    Delete,
    #[serde(alias = "truncate")]
    Truncate,
    #[serde(alias = "persist")]
    Persist,
    #[serde(alias = "memory")]
    Memory,
    #[serde(alias = "wal")]
    Wal,
    #[serde(alias = "off")]
    Off,
}

impl JournalMode {
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Delete => "DELETE",
            Self::Truncate => "TRUNCATE",
            Self::Persist => "PERSIST",
            Self::Memory => "MEMORY",
            Self::Wal => "WAL",
            Self::Off => "OFF",
        }
    }
}

/// `SQLite`-only connection pragmas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SqliteCfg {
    /// When unset: `DELETE` for memory, `WAL` for files.
    pub journal_mode: Option<JournalMode>,
    pub busy_timeout_ms: u32,
}

impl Default for SqliteCfg {
    fn default() -> Self {
        Self {
            journal_mode: None,
            busy_timeout_ms: 5000,
        }
    }
}

impl FleetDbConfig {
    /// Extract the `database` section from an already-built figment.
    ///
    /// # Errors
    /// Returns an error if the section cannot be deserialized or fails validation.
    pub fn from_figment(figment: &Figment) -> Result<Self> {
        let cfg: Self = figment.extract_inner(CONFIG_KEY)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Defaults, then the optional YAML file, then `FLEET_DB__*` environment overrides.
    ///
    /// # Errors
    /// Returns an error if the file is missing, malformed, or the result fails validation.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::new().merge(Serialized::default(CONFIG_KEY, Self::default()));
        if let Some(path) = path {
            if !path.is_file() {
                return Err(DbError::InvalidConfig(format!(
                    "config file does not exist: {}",
                    path.display()
                )));
            }
            figment = figment.merge(Yaml::file(path));
        }
        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));
        Self::from_figment(&figment)
    }

    /// Reject values that would make every DAO call fail.
    ///
    /// # Errors
    /// Returns `DbError::InvalidConfig` describing the first offending field.
    pub fn validate(&self) -> Result<()> {
        if self.dsn.trim().is_empty() {
            return Err(DbError::InvalidConfig("dsn must not be empty".to_owned()));
        }
        if self.paging.default_limit == 0 {
            return Err(DbError::InvalidConfig(
                "paging.default_limit must be greater than zero".to_owned(),
            ));
        }
        if self.paging.default_limit > self.paging.max_limit {
            return Err(DbError::InvalidConfig(format!(
                "paging.default_limit ({}) exceeds paging.max_limit ({})",
                self.paging.default_limit, self.paging.max_limit
            )));
        }
        if self.max_batch_items == 0 {
            return Err(DbError::InvalidConfig(
                "max_batch_items must be greater than zero".to_owned(),
            ));
        }
        Ok(())
    }

    /// Settings handed to every DAO.
    #[must_use]
    pub fn dao_settings(&self) -> DaoSettings {
        DaoSettings {
            default_limit: self.paging.default_limit,
            max_limit: self.paging.max_limit,
            max_batch_items: self.max_batch_items,
        }
    }
}
