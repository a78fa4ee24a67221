//! Infrastructure providers: the organisations that own sites and machines.

use std::str::FromStr;

use async_trait::async_trait;
use fleet_db::filter::Predicates;
use fleet_db::{DaoError, DaoResult, DbConn, EntitySchema, SeaDao, SortField, SortTable};
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelBehavior, ColumnTrait, Condition, ConnectionTrait, DbBackend, DbErr, QueryFilter,
    QueryOrder,
};
use serde::Serialize;
use tracing::instrument;
use uuid::Uuid;

use crate::entity::infrastructure_provider::{self, Column, Relation};

pub struct InfrastructureProviderSchema;

pub type InfrastructureProviderDao = SeaDao<InfrastructureProviderSchema>;

#[derive(Debug, Clone)]
pub struct InfrastructureProviderCreateInput {
    pub name: String,
    pub display_name: Option<String>,
    pub org: String,
    pub org_display_name: Option<String>,
    pub created_by: Uuid,
}

#[derive(Debug, Clone, Default)]
pub struct InfrastructureProviderUpdateInput {
    pub id: Uuid,
    pub name: Option<String>,
    pub display_name: Option<String>,
    pub org_display_name: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct InfrastructureProviderClearInput {
    pub id: Uuid,
    pub display_name: bool,
    pub org_display_name: bool,
}

#[derive(Debug, Clone, Default)]
pub struct InfrastructureProviderFilter {
    pub ids: Option<Vec<Uuid>>,
    pub orgs: Option<Vec<String>>,
    pub search: Option<String>,
}

/// Providers have no outgoing relations, so the record is the row.
#[derive(Debug, Clone, Serialize)]
pub struct InfrastructureProviderRecord {
    #[serde(flatten)]
    pub infrastructure_provider: infrastructure_provider::Model,
}

const SEARCH_COLUMNS: [Column; 3] = [Column::Name, Column::DisplayName, Column::Org];

impl FromStr for Relation {
    type Err = DaoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Err(DaoError::InvalidRelation {
            entity: InfrastructureProviderSchema::NAME,
            relation: s.to_owned(),
        })
    }
}

#[async_trait]
impl EntitySchema for InfrastructureProviderSchema {
    const NAME: &'static str = "InfrastructureProvider";

    type Entity = infrastructure_provider::Entity;
    type Model = infrastructure_provider::Model;
    type ActiveModel = infrastructure_provider::ActiveModel;

    type Id = Uuid;
    type Relation = Relation;
    type Record = InfrastructureProviderRecord;

    type CreateInput = InfrastructureProviderCreateInput;
    type UpdateInput = InfrastructureProviderUpdateInput;
    type ClearInput = InfrastructureProviderClearInput;
    type Filter = InfrastructureProviderFilter;

    const SORT: SortTable<Column, Relation> = SortTable::new(
        &[
            SortField::column("name", Column::Name),
            SortField::column("org", Column::Org),
            SortField::column("created", Column::Created),
            SortField::column("updated", Column::Updated),
        ],
        "created",
    );

    fn id_of(model: &infrastructure_provider::Model) -> Uuid {
        model.id
    }

    fn create_model(
        input: InfrastructureProviderCreateInput,
    ) -> (Uuid, infrastructure_provider::ActiveModel) {
        let id = Uuid::new_v4();
        let am = infrastructure_provider::ActiveModel {
            id: Set(id),
            name: Set(input.name),
            display_name: Set(input.display_name),
            org: Set(input.org),
            org_display_name: Set(input.org_display_name),
            created_by: Set(input.created_by),
            ..infrastructure_provider::ActiveModel::new()
        };
        (id, am)
    }

    fn update_model(
        input: InfrastructureProviderUpdateInput,
    ) -> (Uuid, infrastructure_provider::ActiveModel) {
        let mut am = infrastructure_provider::ActiveModel::new();
        am.id = Set(input.id);
        if let Some(v) = input.name {
            am.name = Set(v);
        }
        if let Some(v) = input.display_name {
            am.display_name = Set(Some(v));
        }
        if let Some(v) = input.org_display_name {
            am.org_display_name = Set(Some(v));
        }
        (input.id, am)
    }

    fn clear_model(
        input: InfrastructureProviderClearInput,
    ) -> (Uuid, infrastructure_provider::ActiveModel) {
        let mut am = infrastructure_provider::ActiveModel::new();
        am.id = Set(input.id);
        if input.display_name {
            am.display_name = Set(None);
        }
        if input.org_display_name {
            am.org_display_name = Set(None);
        }
        (input.id, am)
    }

    fn filter_condition(filter: &InfrastructureProviderFilter, backend: DbBackend) -> Condition {
        Predicates::new()
            .one_of(Column::Id, filter.ids.as_deref())
            .one_of(Column::Org, filter.orgs.as_deref())
            .search(backend, &SEARCH_COLUMNS, filter.search.as_deref())
            .build()
    }

    async fn load<C: ConnectionTrait>(
        _conn: &C,
        rows: Vec<infrastructure_provider::Model>,
        _relations: &[Relation],
    ) -> Result<Vec<InfrastructureProviderRecord>, DbErr> {
        Ok(rows
            .into_iter()
            .map(|infrastructure_provider| InfrastructureProviderRecord {
                infrastructure_provider,
            })
            .collect())
    }
}

/// Provider lookups beyond the uniform contract.
#[async_trait]
pub trait ProviderQueries {
    /// The live provider registered for `org`. The oldest wins if there are several.
    ///
    /// # Errors
    /// `DaoError::NotFound` when the org has no live provider.
    async fn get_by_org<C: DbConn>(
        &self,
        conn: &C,
        org: &str,
    ) -> DaoResult<InfrastructureProviderRecord>;
}

#[async_trait]
impl ProviderQueries for InfrastructureProviderDao {
    #[instrument(skip(self, conn), fields(entity = InfrastructureProviderSchema::NAME))]
    async fn get_by_org<C: DbConn>(
        &self,
        conn: &C,
        org: &str,
    ) -> DaoResult<InfrastructureProviderRecord> {
        let row = Self::live()
            .filter(Column::Org.eq(org))
            .order_by_asc(Column::Created)
            .order_by_asc(Column::Id)
            .one(conn)
            .await?
            .ok_or_else(|| DaoError::not_found(InfrastructureProviderSchema::NAME, org))?;
        Ok(InfrastructureProviderRecord {
            infrastructure_provider: row,
        })
    }
}
