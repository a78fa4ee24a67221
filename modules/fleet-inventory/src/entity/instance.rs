use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::Labels;

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum InstanceStatus {
    #[sea_orm(string_value = "Pending")]
    Pending,
    #[sea_orm(string_value = "Provisioning")]
    Provisioning,
    #[sea_orm(string_value = "Configuring")]
    Configuring,
    #[sea_orm(string_value = "Ready")]
    Ready,
    #[sea_orm(string_value = "Updating")]
    Updating,
    #[sea_orm(string_value = "Error")]
    Error,
    #[sea_orm(string_value = "Terminating")]
    Terminating,
    #[sea_orm(string_value = "Terminated")]
    Terminated,
    #[sea_orm(string_value = "Unknown")]
    Unknown,
}

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum InstancePowerStatus {
    #[sea_orm(string_value = "BootCompleted")]
    BootCompleted,
    #[sea_orm(string_value = "Rebooting")]
    Rebooting,
    #[sea_orm(string_value = "Error")]
    Error,
}

/// A tenant workload placed on (at most) one machine.
#[allow(clippy::struct_excessive_bools)]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "instance")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub allocation_id: Option<Uuid>,
    pub tenant_id: Uuid,
    pub infrastructure_provider_id: Uuid,
    pub site_id: Uuid,
    pub machine_id: Option<String>,
    pub controller_instance_id: Option<Uuid>,
    pub hostname: Option<String>,
    pub ipxe_script: Option<String>,
    pub always_boot_with_custom_ipxe: bool,
    pub phone_home_enabled: bool,
    pub user_data: Option<String>,
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub labels: Option<Labels>,
    pub is_update_pending: bool,
    pub status: InstanceStatus,
    pub power_status: Option<InstancePowerStatus>,
    pub is_missing_on_site: bool,
    pub created_by: Uuid,
    pub created: DateTimeUtc,
    pub updated: DateTimeUtc,
    pub deleted: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::allocation::Entity",
        from = "Column::AllocationId",
        to = "super::allocation::Column::Id"
    )]
    Allocation,
    #[sea_orm(
        belongs_to = "super::tenant::Entity",
        from = "Column::TenantId",
        to = "super::tenant::Column::Id"
    )]
    Tenant,
    #[sea_orm(
        belongs_to = "super::infrastructure_provider::Entity",
        from = "Column::InfrastructureProviderId",
        to = "super::infrastructure_provider::Column::Id"
    )]
    InfrastructureProvider,
    #[sea_orm(
        belongs_to = "super::site::Entity",
        from = "Column::SiteId",
        to = "super::site::Column::Id"
    )]
    Site,
    #[sea_orm(
        belongs_to = "super::machine::Entity",
        from = "Column::MachineId",
        to = "super::machine::Column::Id"
    )]
    Machine,
}

impl Related<super::allocation::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Allocation.def()
    }
}

impl Related<super::tenant::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tenant.def()
    }
}

impl Related<super::infrastructure_provider::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::InfrastructureProvider.def()
    }
}

impl Related<super::site::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Site.def()
    }
}

impl Related<super::machine::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Machine.def()
    }
}

audited_entity!();
