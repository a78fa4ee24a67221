//! Allocations: a tenant's share of a provider's capacity at one site.

use std::str::FromStr;

use async_trait::async_trait;
use fleet_db::filter::{Predicates, load_many_if, load_one_if};
use fleet_db::{DaoError, EntitySchema, SeaDao, SortDir, SortField, SortTable};
use sea_orm::ActiveValue::Set;
use sea_orm::sea_query::{Expr, Func, Query, SelectStatement, SimpleExpr};
use sea_orm::{
    ActiveModelBehavior, ColumnTrait, Condition, ConnectionTrait, DbBackend, DbErr, EntityTrait,
    QueryFilter, QuerySelect, QueryTrait,
};
use serde::Serialize;
use uuid::Uuid;

use crate::entity::allocation::{self, AllocationStatus, Column, Relation};
use crate::entity::allocation_constraint::{self as constraint, ConstraintType, ResourceType};
use crate::entity::{infrastructure_provider, site, tenant};

pub struct AllocationSchema;

pub type AllocationDao = SeaDao<AllocationSchema>;

#[derive(Debug, Clone)]
pub struct AllocationCreateInput {
    pub name: String,
    pub description: Option<String>,
    pub infrastructure_provider_id: Uuid,
    pub tenant_id: Uuid,
    pub site_id: Uuid,
    pub status: AllocationStatus,
    pub created_by: Uuid,
}

/// Fields left `None` keep their stored value.
#[derive(Debug, Clone, Default)]
pub struct AllocationUpdateInput {
    pub id: Uuid,
    pub name: Option<String>,
    pub description: Option<String>,
    pub infrastructure_provider_id: Option<Uuid>,
    pub tenant_id: Option<Uuid>,
    pub site_id: Option<Uuid>,
    pub status: Option<AllocationStatus>,
}

#[derive(Debug, Clone, Default)]
pub struct AllocationClearInput {
    pub id: Uuid,
    pub description: bool,
}

#[derive(Debug, Clone, Default)]
pub struct AllocationFilter {
    pub name: Option<String>,
    pub infrastructure_provider_ids: Option<Vec<Uuid>>,
    pub tenant_ids: Option<Vec<Uuid>>,
    pub site_ids: Option<Vec<Uuid>>,
    pub statuses: Option<Vec<AllocationStatus>>,
    pub ids: Option<Vec<Uuid>>,
    /// Matched against the allocation's live constraints: an allocation
    /// qualifies when one constraint satisfies all four lists together.
    pub resource_types: Option<Vec<ResourceType>>,
    pub resource_type_ids: Option<Vec<Uuid>>,
    pub constraint_types: Option<Vec<ConstraintType>>,
    pub constraint_values: Option<Vec<i32>>,
    pub search: Option<String>,
}

impl AllocationFilter {
    fn constrains_children(&self) -> bool {
        self.resource_types.is_some()
            || self.resource_type_ids.is_some()
            || self.constraint_types.is_some()
            || self.constraint_values.is_some()
    }

    /// Ids of allocations owning a matching live constraint.
    fn constraint_owners(&self) -> Option<SelectStatement> {
        if !self.constrains_children() {
            return None;
        }
        let matching = Predicates::new()
            .one_of(constraint::Column::ResourceType, self.resource_types.as_deref())
            .one_of(constraint::Column::ResourceTypeId, self.resource_type_ids.as_deref())
            .one_of(constraint::Column::ConstraintType, self.constraint_types.as_deref())
            .one_of(constraint::Column::ConstraintValue, self.constraint_values.as_deref())
            .build();
        Some(
            constraint::Entity::find()
                .select_only()
                .column(constraint::Column::AllocationId)
                .filter(constraint::Column::Deleted.is_null())
                .filter(matching)
                .into_query(),
        )
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AllocationRecord {
    #[serde(flatten)]
    pub allocation: allocation::Model,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub infrastructure_provider: Option<infrastructure_provider::Model>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant: Option<tenant::Model>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site: Option<site::Model>,
    /// Live constraints only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allocation_constraints: Option<Vec<constraint::Model>>,
}

const SEARCH_COLUMNS: [Column; 3] = [Column::Name, Column::Description, Column::Status];

/// Smallest live constraint value ascending, largest descending. Allocations
/// without constraints sort as NULL.
fn constraint_value_key(dir: SortDir) -> SimpleExpr {
    let value = Expr::col((constraint::Entity, constraint::Column::ConstraintValue));
    let folded = match dir {
        SortDir::Asc => Func::min(value),
        SortDir::Desc => Func::max(value),
    };
    let per_allocation = Query::select()
        .expr(folded)
        .from(constraint::Entity)
        .and_where(
            Expr::col((constraint::Entity, constraint::Column::AllocationId))
                .equals((allocation::Entity, Column::Id)),
        )
        .and_where(Expr::col((constraint::Entity, constraint::Column::Deleted)).is_null())
        .to_owned();
    SimpleExpr::SubQuery(None, Box::new(per_allocation.into_sub_query_statement()))
}

impl FromStr for Relation {
    type Err = DaoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "infrastructureprovider" | "infrastructure_provider" => {
                Ok(Self::InfrastructureProvider)
            }
            "tenant" => Ok(Self::Tenant),
            "site" => Ok(Self::Site),
            "allocationconstraint" | "allocation_constraint" | "allocation_constraints" => {
                Ok(Self::AllocationConstraint)
            }
            _ => Err(DaoError::InvalidRelation {
                entity: AllocationSchema::NAME,
                relation: s.to_owned(),
            }),
        }
    }
}

#[async_trait]
impl EntitySchema for AllocationSchema {
    const NAME: &'static str = "Allocation";

    type Entity = allocation::Entity;
    type Model = allocation::Model;
    type ActiveModel = allocation::ActiveModel;

    type Id = Uuid;
    type Relation = Relation;
    type Record = AllocationRecord;

    type CreateInput = AllocationCreateInput;
    type UpdateInput = AllocationUpdateInput;
    type ClearInput = AllocationClearInput;
    type Filter = AllocationFilter;

    const SORT: SortTable<Column, Relation> = SortTable::new(
        &[
            SortField::column("name", Column::Name),
            SortField::column("status", Column::Status),
            SortField::column("created", Column::Created),
            SortField::column("updated", Column::Updated),
            SortField::related("site_name", Relation::Site, "site_sort", "name"),
            SortField::related(
                "tenant_org_display_name",
                Relation::Tenant,
                "tenant_sort",
                "org_display_name",
            ),
            SortField::aggregate("constraint_value", constraint_value_key),
        ],
        "created",
    );

    fn id_of(model: &allocation::Model) -> Uuid {
        model.id
    }

    fn create_model(input: AllocationCreateInput) -> (Uuid, allocation::ActiveModel) {
        let id = Uuid::new_v4();
        let am = allocation::ActiveModel {
            id: Set(id),
            name: Set(input.name),
            description: Set(input.description),
            infrastructure_provider_id: Set(input.infrastructure_provider_id),
            tenant_id: Set(input.tenant_id),
            site_id: Set(input.site_id),
            status: Set(input.status),
            created_by: Set(input.created_by),
            ..allocation::ActiveModel::new()
        };
        (id, am)
    }

    fn update_model(input: AllocationUpdateInput) -> (Uuid, allocation::ActiveModel) {
        let mut am = allocation::ActiveModel::new();
        am.id = Set(input.id);
        if let Some(v) = input.name {
            am.name = Set(v);
        }
        if let Some(v) = input.description {
            am.description = Set(Some(v));
        }
        if let Some(v) = input.infrastructure_provider_id {
            am.infrastructure_provider_id = Set(v);
        }
        if let Some(v) = input.tenant_id {
            am.tenant_id = Set(v);
        }
        if let Some(v) = input.site_id {
            am.site_id = Set(v);
        }
        if let Some(v) = input.status {
            am.status = Set(v);
        }
        (input.id, am)
    }

    fn clear_model(input: AllocationClearInput) -> (Uuid, allocation::ActiveModel) {
        let mut am = allocation::ActiveModel::new();
        am.id = Set(input.id);
        if input.description {
            am.description = Set(None);
        }
        (input.id, am)
    }

    fn filter_condition(filter: &AllocationFilter, backend: DbBackend) -> Condition {
        Predicates::new()
            .eq(Column::Name, filter.name.as_ref())
            .one_of(
                Column::InfrastructureProviderId,
                filter.infrastructure_provider_ids.as_deref(),
            )
            .one_of(Column::TenantId, filter.tenant_ids.as_deref())
            .one_of(Column::SiteId, filter.site_ids.as_deref())
            .one_of(Column::Status, filter.statuses.as_deref())
            .one_of(Column::Id, filter.ids.as_deref())
            .in_subquery(Column::Id, filter.constraint_owners())
            .search(backend, &SEARCH_COLUMNS, filter.search.as_deref())
            .build()
    }

    async fn load<C: ConnectionTrait>(
        conn: &C,
        rows: Vec<allocation::Model>,
        relations: &[Relation],
    ) -> Result<Vec<AllocationRecord>, DbErr> {
        let by_provider = load_one_if(
            relations.contains(&Relation::InfrastructureProvider),
            &rows,
            infrastructure_provider::Entity,
            conn,
        )
        .await?;
        let by_tenant = load_one_if(
            relations.contains(&Relation::Tenant),
            &rows,
            tenant::Entity,
            conn,
        )
        .await?;
        let by_site =
            load_one_if(relations.contains(&Relation::Site), &rows, site::Entity, conn).await?;
        let by_constraints = load_many_if(
            relations.contains(&Relation::AllocationConstraint),
            &rows,
            constraint::Entity::find().filter(constraint::Column::Deleted.is_null()),
            conn,
        )
        .await?;

        Ok(rows
            .into_iter()
            .zip(by_provider)
            .zip(by_tenant)
            .zip(by_site)
            .zip(by_constraints)
            .map(
                |((((allocation, infrastructure_provider), tenant), site), allocation_constraints)| {
                    AllocationRecord {
                        allocation,
                        infrastructure_provider,
                        tenant,
                        site,
                        allocation_constraints,
                    }
                },
            )
            .collect())
    }
}
