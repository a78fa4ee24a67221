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
pub enum InfiniBandPartitionStatus {
    #[sea_orm(string_value = "Pending")]
    Pending,
    #[sea_orm(string_value = "Provisioning")]
    Provisioning,
    #[sea_orm(string_value = "Ready")]
    Ready,
    #[sea_orm(string_value = "Configuring")]
    Configuring,
    #[sea_orm(string_value = "Error")]
    Error,
    #[sea_orm(string_value = "Deleting")]
    Deleting,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "infiniband_partition")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub org: String,
    pub site_id: Uuid,
    pub tenant_id: Uuid,
    pub controller_ib_partition_id: Option<Uuid>,
    pub partition_key: Option<String>,
    pub partition_name: Option<String>,
    pub service_level: Option<i32>,
    pub rate_limit: Option<f64>,
    pub mtu: Option<i32>,
    pub enable_sharp: Option<bool>,
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub labels: Option<Labels>,
    pub status: InfiniBandPartitionStatus,
    pub is_missing_on_site: bool,
    pub created_by: Uuid,
    pub created: DateTimeUtc,
    pub updated: DateTimeUtc,
    pub deleted: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::site::Entity",
        from = "Column::SiteId",
        to = "super::site::Column::Id"
    )]
    Site,
    #[sea_orm(
        belongs_to = "super::tenant::Entity",
        from = "Column::TenantId",
        to = "super::tenant::Column::Id"
    )]
    Tenant,
}

impl Related<super::site::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Site.def()
    }
}

impl Related<super::tenant::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tenant.def()
    }
}

audited_entity!();
