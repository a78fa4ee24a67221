//! Allocation constraints: per-resource limits granted through an allocation.

use std::str::FromStr;

use async_trait::async_trait;
use fleet_db::filter::{Predicates, load_one_if};
use fleet_db::{DaoError, EntitySchema, SeaDao, SortField, SortTable};
use sea_orm::ActiveValue::Set;
use sea_orm::{ActiveModelBehavior, Condition, ConnectionTrait, DbBackend, DbErr};
use serde::Serialize;
use uuid::Uuid;

use crate::entity::allocation;
use crate::entity::allocation_constraint::{
    self, Column, ConstraintType, Relation, ResourceType,
};

pub struct AllocationConstraintSchema;

pub type AllocationConstraintDao = SeaDao<AllocationConstraintSchema>;

#[derive(Debug, Clone)]
pub struct AllocationConstraintCreateInput {
    pub allocation_id: Uuid,
    pub resource_type: ResourceType,
    pub resource_type_id: Uuid,
    pub constraint_type: ConstraintType,
    pub constraint_value: i32,
    pub derived_resource_id: Option<Uuid>,
    pub created_by: Uuid,
}

#[derive(Debug, Clone, Default)]
pub struct AllocationConstraintUpdateInput {
    pub id: Uuid,
    pub allocation_id: Option<Uuid>,
    pub resource_type: Option<ResourceType>,
    pub resource_type_id: Option<Uuid>,
    pub constraint_type: Option<ConstraintType>,
    pub constraint_value: Option<i32>,
    pub derived_resource_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default)]
pub struct AllocationConstraintClearInput {
    pub id: Uuid,
    pub derived_resource_id: bool,
}

#[derive(Debug, Clone, Default)]
pub struct AllocationConstraintFilter {
    pub ids: Option<Vec<Uuid>>,
    pub allocation_ids: Option<Vec<Uuid>>,
    pub resource_types: Option<Vec<ResourceType>>,
    pub resource_type_ids: Option<Vec<Uuid>>,
    pub constraint_types: Option<Vec<ConstraintType>>,
    pub derived_resource_ids: Option<Vec<Uuid>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AllocationConstraintRecord {
    #[serde(flatten)]
    pub allocation_constraint: allocation_constraint::Model,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allocation: Option<allocation::Model>,
}

impl FromStr for Relation {
    type Err = DaoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "allocation" => Ok(Self::Allocation),
            _ => Err(DaoError::InvalidRelation {
                entity: AllocationConstraintSchema::NAME,
                relation: s.to_owned(),
            }),
        }
    }
}

#[async_trait]
impl EntitySchema for AllocationConstraintSchema {
    const NAME: &'static str = "AllocationConstraint";

    type Entity = allocation_constraint::Entity;
    type Model = allocation_constraint::Model;
    type ActiveModel = allocation_constraint::ActiveModel;

    type Id = Uuid;
    type Relation = Relation;
    type Record = AllocationConstraintRecord;

    type CreateInput = AllocationConstraintCreateInput;
    type UpdateInput = AllocationConstraintUpdateInput;
    type ClearInput = AllocationConstraintClearInput;
    type Filter = AllocationConstraintFilter;

    const SORT: SortTable<Column, Relation> = SortTable::new(
        &[
            SortField::column("resource_type", Column::ResourceType),
            SortField::column("constraint_type", Column::ConstraintType),
            SortField::column("constraint_value", Column::ConstraintValue),
            SortField::column("created", Column::Created),
            SortField::column("updated", Column::Updated),
        ],
        "created",
    );

    fn id_of(model: &allocation_constraint::Model) -> Uuid {
        model.id
    }

    fn create_model(
        input: AllocationConstraintCreateInput,
    ) -> (Uuid, allocation_constraint::ActiveModel) {
        let id = Uuid::new_v4();
        let am = allocation_constraint::ActiveModel {
            id: Set(id),
            allocation_id: Set(input.allocation_id),
            resource_type: Set(input.resource_type),
            resource_type_id: Set(input.resource_type_id),
            constraint_type: Set(input.constraint_type),
            constraint_value: Set(input.constraint_value),
            derived_resource_id: Set(input.derived_resource_id),
            created_by: Set(input.created_by),
            ..allocation_constraint::ActiveModel::new()
        };
        (id, am)
    }

    fn update_model(
        input: AllocationConstraintUpdateInput,
    ) -> (Uuid, allocation_constraint::ActiveModel) {
        let mut am = allocation_constraint::ActiveModel::new();
        am.id = Set(input.id);
        if let Some(v) = input.allocation_id {
            am.allocation_id = Set(v);
        }
        if let Some(v) = input.resource_type {
            am.resource_type = Set(v);
        }
        if let Some(v) = input.resource_type_id {
            am.resource_type_id = Set(v);
        }
        if let Some(v) = input.constraint_type {
            am.constraint_type = Set(v);
        }
        if let Some(v) = input.constraint_value {
            am.constraint_value = Set(v);
        }
        if let Some(v) = input.derived_resource_id {
            am.derived_resource_id = Set(Some(v));
        }
        (input.id, am)
    }

    fn clear_model(
        input: AllocationConstraintClearInput,
    ) -> (Uuid, allocation_constraint::ActiveModel) {
        let mut am = allocation_constraint::ActiveModel::new();
        am.id = Set(input.id);
        if input.derived_resource_id {
            am.derived_resource_id = Set(None);
        }
        (input.id, am)
    }

    fn filter_condition(filter: &AllocationConstraintFilter, _: DbBackend) -> Condition {
        Predicates::new()
            .one_of(Column::Id, filter.ids.as_deref())
            .one_of(Column::AllocationId, filter.allocation_ids.as_deref())
            .one_of(Column::ResourceType, filter.resource_types.as_deref())
            .one_of(Column::ResourceTypeId, filter.resource_type_ids.as_deref())
            .one_of(Column::ConstraintType, filter.constraint_types.as_deref())
            .one_of(
                Column::DerivedResourceId,
                filter.derived_resource_ids.as_deref(),
            )
            .build()
    }

    async fn load<C: ConnectionTrait>(
        conn: &C,
        rows: Vec<allocation_constraint::Model>,
        relations: &[Relation],
    ) -> Result<Vec<AllocationConstraintRecord>, DbErr> {
        let by_allocation = load_one_if(
            relations.contains(&Relation::Allocation),
            &rows,
            allocation::Entity,
            conn,
        )
        .await?;

        Ok(rows
            .into_iter()
            .zip(by_allocation)
            .map(|(allocation_constraint, allocation)| AllocationConstraintRecord {
                allocation_constraint,
                allocation,
            })
            .collect())
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn clear_without_flags_sets_nothing() {
        let id = Uuid::new_v4();
        let (got, am) = AllocationConstraintSchema::clear_model(AllocationConstraintClearInput {
            id,
            derived_resource_id: false,
        });
        assert_eq!(got, id);
        assert!(!am.derived_resource_id.is_set());
    }
}
