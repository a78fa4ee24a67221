#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Fleet inventory storage.
//!
//! `SeaORM` entities for providers, tenants, sites, allocations and their
//! constraints, machines, instances, `InfiniBand` partitions, `NVLink`
//! interfaces and SSH key group associations, the schema
//! [`migrations::Migrator`] that creates them, and one [`fleet_db::SeaDao`]
//! per top-level entity.
//!
//! # Example
//! ```rust,no_run
//! use fleet_db::{Dao, DbHandle, FleetDbConfig, PageRequest};
//! use fleet_inventory::dao::{MachineDao, MachineFilter};
//! use fleet_inventory::migrations::Migrator;
//! use sea_orm_migration::MigratorTrait;
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let db = DbHandle::from_config(&FleetDbConfig::load(None)?).await?;
//! Migrator::up(db.conn(), None).await?;
//!
//! let machines = MachineDao::default();
//! let page = machines
//!     .get_all(db.conn(), &MachineFilter::default(), &PageRequest::default(), &[])
//!     .await?;
//! # let _ = page;
//! # Ok(())
//! # }
//! ```

pub mod dao;
pub mod entity;
pub mod migrations;

pub use dao::{CountByStatus, ProviderQueries, StatusCounts, StatusSchema};
pub use migrations::Migrator;
