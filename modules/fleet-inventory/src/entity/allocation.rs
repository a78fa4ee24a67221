use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

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
pub enum AllocationStatus {
    #[sea_orm(string_value = "Pending")]
    Pending,
    #[sea_orm(string_value = "Registered")]
    Registered,
    #[sea_orm(string_value = "Error")]
    Error,
    #[sea_orm(string_value = "Deleting")]
    Deleting,
}

/// Capacity of a site handed by a provider to a tenant.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "allocation")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub infrastructure_provider_id: Uuid,
    pub tenant_id: Uuid,
    pub site_id: Uuid,
    pub status: AllocationStatus,
    pub created_by: Uuid,
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
        belongs_to = "super::tenant::Entity",
        from = "Column::TenantId",
        to = "super::tenant::Column::Id"
    )]
    Tenant,
    #[sea_orm(
        belongs_to = "super::site::Entity",
        from = "Column::SiteId",
        to = "super::site::Column::Id"
    )]
    Site,
    #[sea_orm(has_many = "super::allocation_constraint::Entity")]
    AllocationConstraint,
}

impl Related<super::infrastructure_provider::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::InfrastructureProvider.def()
    }
}

impl Related<super::tenant::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tenant.def()
    }
}

impl Related<super::site::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Site.def()
    }
}

impl Related<super::allocation_constraint::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AllocationConstraint.def()
    }
}

audited_entity!();
