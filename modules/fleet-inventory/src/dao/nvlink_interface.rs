//! `NVLink` interfaces: one GPU of an instance joined to a logical partition.

use std::str::FromStr;

use async_trait::async_trait;
use fleet_db::filter::{Predicates, load_one_if};
use fleet_db::{DaoError, EntitySchema, SeaDao, SortField, SortTable};
use sea_orm::ActiveValue::Set;
use sea_orm::{ActiveModelBehavior, Condition, ConnectionTrait, DbBackend, DbErr};
use serde::Serialize;
use uuid::Uuid;

use crate::entity::nvlink_interface::{self, Column, NvLinkInterfaceStatus, Relation};
use crate::entity::{instance, site};

pub struct NvLinkInterfaceSchema;

pub type NvLinkInterfaceDao = SeaDao<NvLinkInterfaceSchema>;

#[derive(Debug, Clone)]
pub struct NvLinkInterfaceCreateInput {
    /// Generated when absent.
    pub id: Option<Uuid>,
    pub instance_id: Uuid,
    pub site_id: Uuid,
    pub nvlink_logical_partition_id: Uuid,
    pub nvlink_domain_id: Option<Uuid>,
    pub device: Option<String>,
    pub device_instance: i32,
    pub gpu_guid: Option<String>,
    pub status: NvLinkInterfaceStatus,
    pub created_by: Uuid,
}

#[derive(Debug, Clone, Default)]
pub struct NvLinkInterfaceUpdateInput {
    pub id: Uuid,
    pub instance_id: Option<Uuid>,
    pub site_id: Option<Uuid>,
    pub nvlink_logical_partition_id: Option<Uuid>,
    pub nvlink_domain_id: Option<Uuid>,
    pub device: Option<String>,
    pub device_instance: Option<i32>,
    pub gpu_guid: Option<String>,
    pub status: Option<NvLinkInterfaceStatus>,
}

#[derive(Debug, Clone, Default)]
pub struct NvLinkInterfaceClearInput {
    pub id: Uuid,
    pub nvlink_domain_id: bool,
    pub device: bool,
    pub gpu_guid: bool,
}

#[derive(Debug, Clone, Default)]
pub struct NvLinkInterfaceFilter {
    pub ids: Option<Vec<Uuid>>,
    pub instance_ids: Option<Vec<Uuid>>,
    pub site_ids: Option<Vec<Uuid>>,
    pub nvlink_logical_partition_ids: Option<Vec<Uuid>>,
    pub nvlink_domain_ids: Option<Vec<Uuid>>,
    pub statuses: Option<Vec<NvLinkInterfaceStatus>>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NvLinkInterfaceRecord {
    #[serde(flatten)]
    pub nvlink_interface: nvlink_interface::Model,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site: Option<site::Model>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance: Option<instance::Model>,
}

const SEARCH_COLUMNS: [Column; 3] = [Column::Device, Column::GpuGuid, Column::Status];

impl FromStr for Relation {
    type Err = DaoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "site" => Ok(Self::Site),
            "instance" => Ok(Self::Instance),
            _ => Err(DaoError::InvalidRelation {
                entity: NvLinkInterfaceSchema::NAME,
                relation: s.to_owned(),
            }),
        }
    }
}

#[async_trait]
impl EntitySchema for NvLinkInterfaceSchema {
    const NAME: &'static str = "NVLinkInterface";

    type Entity = nvlink_interface::Entity;
    type Model = nvlink_interface::Model;
    type ActiveModel = nvlink_interface::ActiveModel;

    type Id = Uuid;
    type Relation = Relation;
    type Record = NvLinkInterfaceRecord;

    type CreateInput = NvLinkInterfaceCreateInput;
    type UpdateInput = NvLinkInterfaceUpdateInput;
    type ClearInput = NvLinkInterfaceClearInput;
    type Filter = NvLinkInterfaceFilter;

    const SORT: SortTable<Column, Relation> = SortTable::new(
        &[
            SortField::column("status", Column::Status),
            SortField::column("created", Column::Created),
            SortField::column("updated", Column::Updated),
            SortField::column("device_instance", Column::DeviceInstance),
        ],
        "created",
    );

    fn id_of(model: &nvlink_interface::Model) -> Uuid {
        model.id
    }

    fn create_model(input: NvLinkInterfaceCreateInput) -> (Uuid, nvlink_interface::ActiveModel) {
        let id = input.id.unwrap_or_else(Uuid::new_v4);
        let am = nvlink_interface::ActiveModel {
            id: Set(id),
            instance_id: Set(input.instance_id),
            site_id: Set(input.site_id),
            nvlink_logical_partition_id: Set(input.nvlink_logical_partition_id),
            nvlink_domain_id: Set(input.nvlink_domain_id),
            device: Set(input.device),
            device_instance: Set(input.device_instance),
            gpu_guid: Set(input.gpu_guid),
            status: Set(input.status),
            created_by: Set(input.created_by),
            ..nvlink_interface::ActiveModel::new()
        };
        (id, am)
    }

    fn update_model(input: NvLinkInterfaceUpdateInput) -> (Uuid, nvlink_interface::ActiveModel) {
        let mut am = nvlink_interface::ActiveModel::new();
        am.id = Set(input.id);
        if let Some(v) = input.instance_id {
            am.instance_id = Set(v);
        }
        if let Some(v) = input.site_id {
            am.site_id = Set(v);
        }
        if let Some(v) = input.nvlink_logical_partition_id {
            am.nvlink_logical_partition_id = Set(v);
        }
        if let Some(v) = input.nvlink_domain_id {
            am.nvlink_domain_id = Set(Some(v));
        }
        if let Some(v) = input.device {
            am.device = Set(Some(v));
        }
        if let Some(v) = input.device_instance {
            am.device_instance = Set(v);
        }
        if let Some(v) = input.gpu_guid {
            am.gpu_guid = Set(Some(v));
        }
        if let Some(v) = input.status {
            am.status = Set(v);
        }
        (input.id, am)
    }

    fn clear_model(input: NvLinkInterfaceClearInput) -> (Uuid, nvlink_interface::ActiveModel) {
        let mut am = nvlink_interface::ActiveModel::new();
        am.id = Set(input.id);
        if input.nvlink_domain_id {
            am.nvlink_domain_id = Set(None);
        }
        if input.device {
            am.device = Set(None);
        }
        if input.gpu_guid {
            am.gpu_guid = Set(None);
        }
        (input.id, am)
    }

    fn filter_condition(filter: &NvLinkInterfaceFilter, backend: DbBackend) -> Condition {
        Predicates::new()
            .one_of(Column::Id, filter.ids.as_deref())
            .one_of(Column::InstanceId, filter.instance_ids.as_deref())
            .one_of(Column::SiteId, filter.site_ids.as_deref())
            .one_of(
                Column::NvlinkLogicalPartitionId,
                filter.nvlink_logical_partition_ids.as_deref(),
            )
            .one_of(Column::NvlinkDomainId, filter.nvlink_domain_ids.as_deref())
            .one_of(Column::Status, filter.statuses.as_deref())
            .search(backend, &SEARCH_COLUMNS, filter.search.as_deref())
            .build()
    }

    async fn load<C: ConnectionTrait>(
        conn: &C,
        rows: Vec<nvlink_interface::Model>,
        relations: &[Relation],
    ) -> Result<Vec<NvLinkInterfaceRecord>, DbErr> {
        let by_site =
            load_one_if(relations.contains(&Relation::Site), &rows, site::Entity, conn).await?;
        let by_instance = load_one_if(
            relations.contains(&Relation::Instance),
            &rows,
            instance::Entity,
            conn,
        )
        .await?;

        Ok(rows
            .into_iter()
            .zip(by_site)
            .zip(by_instance)
            .map(|((nvlink_interface, site), instance)| NvLinkInterfaceRecord {
                nvlink_interface,
                site,
                instance,
            })
            .collect())
    }
}
