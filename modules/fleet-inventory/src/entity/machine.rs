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
pub enum MachineStatus {
    #[sea_orm(string_value = "Initializing")]
    Initializing,
    #[sea_orm(string_value = "Ready")]
    Ready,
    #[sea_orm(string_value = "InUse")]
    InUse,
    #[sea_orm(string_value = "Reset")]
    Reset,
    #[sea_orm(string_value = "Maintenance")]
    Maintenance,
    #[sea_orm(string_value = "Error")]
    Error,
    #[sea_orm(string_value = "Decommissioned")]
    Decommissioned,
    #[sea_orm(string_value = "Unknown")]
    Unknown,
}

/// A bare-metal host as reported by the site controller.
///
/// The id is the controller's machine id and is supplied by the caller.
#[allow(clippy::struct_excessive_bools)]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "machine")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub infrastructure_provider_id: Uuid,
    pub site_id: Uuid,
    pub controller_machine_id: String,
    pub controller_machine_type: Option<String>,
    pub vendor: Option<String>,
    pub product_name: Option<String>,
    pub serial_number: Option<String>,
    pub hostname: Option<String>,
    pub default_mac_address: Option<String>,
    pub is_in_maintenance: bool,
    pub maintenance_message: Option<String>,
    pub is_network_degraded: bool,
    pub network_health_message: Option<String>,
    pub is_assigned: bool,
    pub is_missing_on_site: bool,
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub labels: Option<Labels>,
    pub status: MachineStatus,
    pub created: DateTimeUtc,
    pub updated: DateTimeUtc,
    pub deleted: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, EnumIter, DeriveRelation)]
pub enum Relation {
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

audited_entity!();
