use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Kind of resource an allocation constraint limits.
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
pub enum ResourceType {
    #[sea_orm(string_value = "InstanceType")]
    InstanceType,
    #[sea_orm(string_value = "IPBlock")]
    IpBlock,
}

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
pub enum ConstraintType {
    #[sea_orm(string_value = "Reserved")]
    Reserved,
    #[sea_orm(string_value = "OnDemand")]
    OnDemand,
    #[sea_orm(string_value = "Preemptible")]
    Preemptible,
}

/// A limit on one resource granted through an allocation.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "allocation_constraint")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub allocation_id: Uuid,
    pub resource_type: ResourceType,
    pub resource_type_id: Uuid,
    pub constraint_type: ConstraintType,
    pub constraint_value: i32,
    /// Set for IP blocks carved out of the parent block.
    pub derived_resource_id: Option<Uuid>,
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
}

impl Related<super::allocation::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Allocation.def()
    }
}

audited_entity!();
