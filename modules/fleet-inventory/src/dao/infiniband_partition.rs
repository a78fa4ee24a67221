//! `InfiniBand` partitions owned by a tenant at one site.

use std::str::FromStr;

use async_trait::async_trait;
use fleet_db::filter::{Predicates, load_one_if};
use fleet_db::{DaoError, EntitySchema, SeaDao, SortField, SortTable};
use sea_orm::ActiveValue::Set;
use sea_orm::{ActiveModelBehavior, Condition, ConnectionTrait, DbBackend, DbErr};
use serde::Serialize;
use uuid::Uuid;

use crate::entity::infiniband_partition::{self, Column, InfiniBandPartitionStatus, Relation};
use crate::entity::{Labels, site, tenant};

pub struct InfiniBandPartitionSchema;

pub type InfiniBandPartitionDao = SeaDao<InfiniBandPartitionSchema>;

#[derive(Debug, Clone)]
pub struct InfiniBandPartitionCreateInput {
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
    pub labels: Option<Labels>,
    pub status: InfiniBandPartitionStatus,
    pub is_missing_on_site: bool,
    pub created_by: Uuid,
}

#[derive(Debug, Clone, Default)]
pub struct InfiniBandPartitionUpdateInput {
    pub id: Uuid,
    pub name: Option<String>,
    pub description: Option<String>,
    pub controller_ib_partition_id: Option<Uuid>,
    pub partition_key: Option<String>,
    pub partition_name: Option<String>,
    pub service_level: Option<i32>,
    pub rate_limit: Option<f64>,
    pub mtu: Option<i32>,
    pub enable_sharp: Option<bool>,
    pub labels: Option<Labels>,
    pub status: Option<InfiniBandPartitionStatus>,
    pub is_missing_on_site: Option<bool>,
}

#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Default)]
pub struct InfiniBandPartitionClearInput {
    pub id: Uuid,
    pub description: bool,
    pub controller_ib_partition_id: bool,
    pub partition_key: bool,
    pub partition_name: bool,
    pub service_level: bool,
    pub rate_limit: bool,
    pub mtu: bool,
    pub enable_sharp: bool,
    pub labels: bool,
}

#[derive(Debug, Clone, Default)]
pub struct InfiniBandPartitionFilter {
    pub ids: Option<Vec<Uuid>>,
    pub names: Option<Vec<String>>,
    pub site_ids: Option<Vec<Uuid>>,
    /// Matches the owning tenant's org.
    pub tenant_orgs: Option<Vec<String>>,
    pub tenant_ids: Option<Vec<Uuid>>,
    pub statuses: Option<Vec<InfiniBandPartitionStatus>>,
    pub partition_names: Option<Vec<String>>,
    pub partition_keys: Option<Vec<String>>,
    pub sharp_enabled: Option<bool>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct InfiniBandPartitionRecord {
    #[serde(flatten)]
    pub infiniband_partition: infiniband_partition::Model,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site: Option<site::Model>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant: Option<tenant::Model>,
}

const SEARCH_COLUMNS: [Column; 6] = [
    Column::Name,
    Column::Description,
    Column::PartitionName,
    Column::PartitionKey,
    Column::Status,
    Column::Labels,
];

impl FromStr for Relation {
    type Err = DaoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "site" => Ok(Self::Site),
            "tenant" => Ok(Self::Tenant),
            _ => Err(DaoError::InvalidRelation {
                entity: InfiniBandPartitionSchema::NAME,
                relation: s.to_owned(),
            }),
        }
    }
}

#[async_trait]
impl EntitySchema for InfiniBandPartitionSchema {
    const NAME: &'static str = "InfiniBandPartition";

    type Entity = infiniband_partition::Entity;
    type Model = infiniband_partition::Model;
    type ActiveModel = infiniband_partition::ActiveModel;

    type Id = Uuid;
    type Relation = Relation;
    type Record = InfiniBandPartitionRecord;

    type CreateInput = InfiniBandPartitionCreateInput;
    type UpdateInput = InfiniBandPartitionUpdateInput;
    type ClearInput = InfiniBandPartitionClearInput;
    type Filter = InfiniBandPartitionFilter;

    const SORT: SortTable<Column, Relation> = SortTable::new(
        &[
            SortField::column("name", Column::Name),
            SortField::column("status", Column::Status),
            SortField::column("created", Column::Created),
            SortField::column("updated", Column::Updated),
        ],
        "created",
    );

    fn id_of(model: &infiniband_partition::Model) -> Uuid {
        model.id
    }

    fn create_model(
        input: InfiniBandPartitionCreateInput,
    ) -> (Uuid, infiniband_partition::ActiveModel) {
        let id = Uuid::new_v4();
        let am = infiniband_partition::ActiveModel {
            id: Set(id),
            name: Set(input.name),
            description: Set(input.description),
            org: Set(input.org),
            site_id: Set(input.site_id),
            tenant_id: Set(input.tenant_id),
            controller_ib_partition_id: Set(input.controller_ib_partition_id),
            partition_key: Set(input.partition_key),
            partition_name: Set(input.partition_name),
            service_level: Set(input.service_level),
            rate_limit: Set(input.rate_limit),
            mtu: Set(input.mtu),
            enable_sharp: Set(input.enable_sharp),
            labels: Set(input.labels),
            status: Set(input.status),
            is_missing_on_site: Set(input.is_missing_on_site),
            created_by: Set(input.created_by),
            ..infiniband_partition::ActiveModel::new()
        };
        (id, am)
    }

    fn update_model(
        input: InfiniBandPartitionUpdateInput,
    ) -> (Uuid, infiniband_partition::ActiveModel) {
        let mut am = infiniband_partition::ActiveModel::new();
        am.id = Set(input.id);
        if let Some(v) = input.name {
            am.name = Set(v);
        }
        if let Some(v) = input.description {
            am.description = Set(Some(v));
        }
        if let Some(v) = input.controller_ib_partition_id {
            am.controller_ib_partition_id = Set(Some(v));
        }
        if let Some(v) = input.partition_key {
            am.partition_key = Set(Some(v));
        }
        if let Some(v) = input.partition_name {
            am.partition_name = Set(Some(v));
        }
        if let Some(v) = input.service_level {
            am.service_level = Set(Some(v));
        }
        if let Some(v) = input.rate_limit {
            am.rate_limit = Set(Some(v));
        }
        if let Some(v) = input.mtu {
            am.mtu = Set(Some(v));
        }
        if let Some(v) = input.enable_sharp {
            am.enable_sharp = Set(Some(v));
        }
        if let Some(v) = input.labels {
            am.labels = Set(Some(v));
        }
        if let Some(v) = input.status {
            am.status = Set(v);
        }
        if let Some(v) = input.is_missing_on_site {
            am.is_missing_on_site = Set(v);
        }
        (input.id, am)
    }

    fn clear_model(
        input: InfiniBandPartitionClearInput,
    ) -> (Uuid, infiniband_partition::ActiveModel) {
        let mut am = infiniband_partition::ActiveModel::new();
        am.id = Set(input.id);
        if input.description {
            am.description = Set(None);
        }
        if input.controller_ib_partition_id {
            am.controller_ib_partition_id = Set(None);
        }
        if input.partition_key {
            am.partition_key = Set(None);
        }
        if input.partition_name {
            am.partition_name = Set(None);
        }
        if input.service_level {
            am.service_level = Set(None);
        }
        if input.rate_limit {
            am.rate_limit = Set(None);
        }
        if input.mtu {
            am.mtu = Set(None);
        }
        if input.enable_sharp {
            am.enable_sharp = Set(None);
        }
        if input.labels {
            am.labels = Set(None);
        }
        (input.id, am)
    }

    fn filter_condition(filter: &InfiniBandPartitionFilter, backend: DbBackend) -> Condition {
        Predicates::new()
            .one_of(Column::Id, filter.ids.as_deref())
            .one_of(Column::Name, filter.names.as_deref())
            .one_of(Column::SiteId, filter.site_ids.as_deref())
            .one_of(Column::Org, filter.tenant_orgs.as_deref())
            .one_of(Column::TenantId, filter.tenant_ids.as_deref())
            .one_of(Column::Status, filter.statuses.as_deref())
            .one_of(Column::PartitionName, filter.partition_names.as_deref())
            .one_of(Column::PartitionKey, filter.partition_keys.as_deref())
            .eq(Column::EnableSharp, filter.sharp_enabled.as_ref())
            .search(backend, &SEARCH_COLUMNS, filter.search.as_deref())
            .build()
    }

    async fn load<C: ConnectionTrait>(
        conn: &C,
        rows: Vec<infiniband_partition::Model>,
        relations: &[Relation],
    ) -> Result<Vec<InfiniBandPartitionRecord>, DbErr> {
        let by_site =
            load_one_if(relations.contains(&Relation::Site), &rows, site::Entity, conn).await?;
        let by_tenant = load_one_if(
            relations.contains(&Relation::Tenant),
            &rows,
            tenant::Entity,
            conn,
        )
        .await?;

        Ok(rows
            .into_iter()
            .zip(by_site)
            .zip(by_tenant)
            .map(
                |((infiniband_partition, site), tenant)| InfiniBandPartitionRecord {
                    infiniband_partition,
                    site,
                    tenant,
                },
            )
            .collect())
    }
}
