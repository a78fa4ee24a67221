//! `SeaORM` entities for the fleet inventory tables.
//!
//! Every table carries `created`, `updated` and a nullable `deleted` column;
//! [`audited_entity!`] wires those into [`fleet_db::Audited`] and the
//! `before_save` hook for each entity.

use std::collections::BTreeMap;

use sea_orm::FromJsonQueryResult;
use serde::{Deserialize, Serialize};

/// Implements the write hook and [`fleet_db::Audited`] for the entity in scope.
macro_rules! audited_entity {
    () => {
        #[async_trait::async_trait]
        impl ActiveModelBehavior for ActiveModel {
            async fn before_save<C>(mut self, _db: &C, insert: bool) -> Result<Self, DbErr>
            where
                C: ConnectionTrait,
            {
                fleet_db::stamp(&mut self, insert);
                Ok(self)
            }
        }

        impl fleet_db::Audited for Entity {
            const ID: Column = Column::Id;
            const CREATED: Column = Column::Created;
            const UPDATED: Column = Column::Updated;
            const DELETED: Column = Column::Deleted;
        }
    };
}

pub mod allocation;
pub mod allocation_constraint;
pub mod infiniband_partition;
pub mod infrastructure_provider;
pub mod instance;
pub mod machine;
pub mod nvlink_interface;
pub mod site;
pub mod ssh_key_group;
pub mod ssh_key_group_instance_association;
pub mod tenant;

pub use allocation::Entity as AllocationEntity;
pub use allocation_constraint::Entity as AllocationConstraintEntity;
pub use infiniband_partition::Entity as InfiniBandPartitionEntity;
pub use infrastructure_provider::Entity as InfrastructureProviderEntity;
pub use instance::Entity as InstanceEntity;
pub use machine::Entity as MachineEntity;
pub use nvlink_interface::Entity as NvLinkInterfaceEntity;
pub use site::Entity as SiteEntity;
pub use ssh_key_group::Entity as SshKeyGroupEntity;
pub use ssh_key_group_instance_association::Entity as SshKeyGroupInstanceAssociationEntity;
pub use tenant::Entity as TenantEntity;

/// Free-form key/value labels, stored as a JSON object.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
pub struct Labels(pub BTreeMap<String, String>);

impl<K, V> FromIterator<(K, V)> for Labels
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}
