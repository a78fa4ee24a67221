//! Per-entity DAO definitions.
//!
//! Each submodule plugs one entity into [`fleet_db::SeaDao`] through an
//! [`EntitySchema`] and exposes a `XxxDao` alias. Queries that only some
//! entities support live in extension traits here.

use std::collections::BTreeMap;

use async_trait::async_trait;
use fleet_db::{DaoResult, DbConn, EntitySchema, SeaDao};
use sea_orm::{EntityTrait, Iterable, TryGetable};
use serde::Serialize;

pub mod allocation;
pub mod allocation_constraint;
pub mod infiniband_partition;
pub mod infrastructure_provider;
pub mod instance;
pub mod machine;
pub mod nvlink_interface;
pub mod ssh_key_group_instance_association;

pub use allocation::{
    AllocationClearInput, AllocationCreateInput, AllocationDao, AllocationFilter,
    AllocationRecord, AllocationSchema, AllocationUpdateInput,
};
pub use allocation_constraint::{
    AllocationConstraintClearInput, AllocationConstraintCreateInput, AllocationConstraintDao,
    AllocationConstraintFilter, AllocationConstraintRecord, AllocationConstraintSchema,
    AllocationConstraintUpdateInput,
};
pub use infiniband_partition::{
    InfiniBandPartitionClearInput, InfiniBandPartitionCreateInput, InfiniBandPartitionDao,
    InfiniBandPartitionFilter, InfiniBandPartitionRecord, InfiniBandPartitionSchema,
    InfiniBandPartitionUpdateInput,
};
pub use infrastructure_provider::{
    InfrastructureProviderClearInput, InfrastructureProviderCreateInput,
    InfrastructureProviderDao, InfrastructureProviderFilter, InfrastructureProviderRecord,
    InfrastructureProviderSchema, InfrastructureProviderUpdateInput, ProviderQueries,
};
pub use instance::{
    InstanceClearInput, InstanceCreateInput, InstanceDao, InstanceFilter, InstanceRecord,
    InstanceSchema, InstanceUpdateInput,
};
pub use machine::{
    MachineClearInput, MachineCreateInput, MachineDao, MachineFilter, MachineRecord,
    MachineSchema, MachineUpdateInput,
};
pub use nvlink_interface::{
    NvLinkInterfaceClearInput, NvLinkInterfaceCreateInput, NvLinkInterfaceDao,
    NvLinkInterfaceFilter, NvLinkInterfaceRecord, NvLinkInterfaceSchema,
    NvLinkInterfaceUpdateInput,
};
pub use ssh_key_group_instance_association::{
    SshKeyGroupInstanceAssociationClearInput, SshKeyGroupInstanceAssociationCreateInput,
    SshKeyGroupInstanceAssociationDao, SshKeyGroupInstanceAssociationFilter,
    SshKeyGroupInstanceAssociationRecord, SshKeyGroupInstanceAssociationSchema,
    SshKeyGroupInstanceAssociationUpdateInput,
};

/// An entity whose rows carry a closed status enumeration.
pub trait StatusSchema: EntitySchema {
    type Status: Copy + Ord + Iterable + TryGetable + Send + Sync + 'static;

    const STATUS: <Self::Entity as EntityTrait>::Column;
}

/// Live-row counts per status. Every status is present, zero when unused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusCounts<S: Ord> {
    pub by_status: BTreeMap<S, u64>,
    pub total: u64,
}

impl<S: Ord + Copy> StatusCounts<S> {
    #[must_use]
    pub fn get(&self, status: S) -> u64 {
        self.by_status.get(&status).copied().unwrap_or(0)
    }
}

#[async_trait]
pub trait CountByStatus {
    type Status: Ord;
    type Filter;

    /// Count live rows matching `filter`, grouped by status.
    ///
    /// # Errors
    /// Storage errors only.
    async fn get_count_by_status<C: DbConn>(
        &self,
        conn: &C,
        filter: &Self::Filter,
    ) -> DaoResult<StatusCounts<Self::Status>>;
}

#[async_trait]
impl<S: StatusSchema> CountByStatus for SeaDao<S> {
    type Status = S::Status;
    type Filter = S::Filter;

    #[tracing::instrument(skip_all, fields(entity = S::NAME))]
    async fn get_count_by_status<C: DbConn>(
        &self,
        conn: &C,
        filter: &S::Filter,
    ) -> DaoResult<StatusCounts<S::Status>> {
        let found: BTreeMap<S::Status, u64> = self.count_by(conn, filter, S::STATUS).await?;
        let by_status: BTreeMap<S::Status, u64> = <S::Status as Iterable>::iter()
            .map(|status| (status, found.get(&status).copied().unwrap_or(0)))
            .collect();
        let total = by_status.values().sum();
        Ok(StatusCounts { by_status, total })
    }
}
