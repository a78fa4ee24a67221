use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A datacenter site operated by an infrastructure provider.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "site")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub org: String,
    pub infrastructure_provider_id: Uuid,
    pub status: String,
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
}

impl Related<super::infrastructure_provider::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::InfrastructureProvider.def()
    }
}

audited_entity!();
