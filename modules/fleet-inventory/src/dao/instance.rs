//! Instances: tenant workloads, optionally bound to an allocation and a machine.

use std::str::FromStr;

use async_trait::async_trait;
use fleet_db::filter::{Predicates, load_one_if};
use fleet_db::{DaoError, EntitySchema, SeaDao, SortField, SortTable};
use sea_orm::ActiveValue::Set;
use sea_orm::{ActiveModelBehavior, Condition, ConnectionTrait, DbBackend, DbErr};
use serde::Serialize;
use uuid::Uuid;

use super::StatusSchema;
use crate::entity::instance::{self, Column, InstancePowerStatus, InstanceStatus, Relation};
use crate::entity::{Labels, allocation, infrastructure_provider, machine, site, tenant};

pub struct InstanceSchema;

pub type InstanceDao = SeaDao<InstanceSchema>;

#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone)]
pub struct InstanceCreateInput {
    pub name: String,
    pub description: Option<String>,
    pub allocation_id: Option<Uuid>,
    pub tenant_id: Uuid,
    pub infrastructure_provider_id: Uuid,
    pub site_id: Uuid,
    pub machine_id: Option<String>,
    pub controller_instance_id: Option<Uuid>,
    pub hostname: Option<String>,
    pub ipxe_script: Option<String>,
    pub always_boot_with_custom_ipxe: bool,
    pub phone_home_enabled: bool,
    pub user_data: Option<String>,
    pub labels: Option<Labels>,
    pub is_update_pending: bool,
    pub status: InstanceStatus,
    pub power_status: Option<InstancePowerStatus>,
    pub is_missing_on_site: bool,
    pub created_by: Uuid,
}

impl InstanceCreateInput {
    /// A pending instance with no placement and no optional fields.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        tenant_id: Uuid,
        infrastructure_provider_id: Uuid,
        site_id: Uuid,
        created_by: Uuid,
    ) -> Self {
        Self {
            name: name.into(),
            description: None,
            allocation_id: None,
            tenant_id,
            infrastructure_provider_id,
            site_id,
            machine_id: None,
            controller_instance_id: None,
            hostname: None,
            ipxe_script: None,
            always_boot_with_custom_ipxe: false,
            phone_home_enabled: false,
            user_data: None,
            labels: None,
            is_update_pending: false,
            status: InstanceStatus::Pending,
            power_status: None,
            is_missing_on_site: false,
            created_by,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct InstanceUpdateInput {
    pub id: Uuid,
    pub name: Option<String>,
    pub description: Option<String>,
    pub allocation_id: Option<Uuid>,
    pub tenant_id: Option<Uuid>,
    pub infrastructure_provider_id: Option<Uuid>,
    pub site_id: Option<Uuid>,
    pub machine_id: Option<String>,
    pub controller_instance_id: Option<Uuid>,
    pub hostname: Option<String>,
    pub ipxe_script: Option<String>,
    pub always_boot_with_custom_ipxe: Option<bool>,
    pub phone_home_enabled: Option<bool>,
    pub user_data: Option<String>,
    pub labels: Option<Labels>,
    pub is_update_pending: Option<bool>,
    pub status: Option<InstanceStatus>,
    pub power_status: Option<InstancePowerStatus>,
    pub is_missing_on_site: Option<bool>,
}

#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Default)]
pub struct InstanceClearInput {
    pub id: Uuid,
    pub description: bool,
    pub allocation_id: bool,
    pub machine_id: bool,
    pub controller_instance_id: bool,
    pub hostname: bool,
    pub ipxe_script: bool,
    pub user_data: bool,
    pub labels: bool,
    pub power_status: bool,
}

#[derive(Debug, Clone, Default)]
pub struct InstanceFilter {
    pub ids: Option<Vec<Uuid>>,
    pub names: Option<Vec<String>>,
    pub allocation_ids: Option<Vec<Uuid>>,
    pub tenant_ids: Option<Vec<Uuid>>,
    pub infrastructure_provider_ids: Option<Vec<Uuid>>,
    pub site_ids: Option<Vec<Uuid>>,
    pub machine_ids: Option<Vec<String>>,
    pub statuses: Option<Vec<InstanceStatus>>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct InstanceRecord {
    #[serde(flatten)]
    pub instance: instance::Model,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allocation: Option<allocation::Model>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant: Option<tenant::Model>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub infrastructure_provider: Option<infrastructure_provider::Model>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site: Option<site::Model>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub machine: Option<machine::Model>,
}

const SEARCH_COLUMNS: [Column; 5] = [
    Column::Name,
    Column::Description,
    Column::Hostname,
    Column::Status,
    Column::Labels,
];

impl FromStr for Relation {
    type Err = DaoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "allocation" => Ok(Self::Allocation),
            "tenant" => Ok(Self::Tenant),
            "infrastructureprovider" | "infrastructure_provider" => {
                Ok(Self::InfrastructureProvider)
            }
            "site" => Ok(Self::Site),
            "machine" => Ok(Self::Machine),
            _ => Err(DaoError::InvalidRelation {
                entity: InstanceSchema::NAME,
                relation: s.to_owned(),
            }),
        }
    }
}

#[async_trait]
impl EntitySchema for InstanceSchema {
    const NAME: &'static str = "Instance";

    type Entity = instance::Entity;
    type Model = instance::Model;
    type ActiveModel = instance::ActiveModel;

    type Id = Uuid;
    type Relation = Relation;
    type Record = InstanceRecord;

    type CreateInput = InstanceCreateInput;
    type UpdateInput = InstanceUpdateInput;
    type ClearInput = InstanceClearInput;
    type Filter = InstanceFilter;

    const SORT: SortTable<Column, Relation> = SortTable::new(
        &[
            SortField::column("name", Column::Name),
            SortField::column("status", Column::Status),
            SortField::column("created", Column::Created),
            SortField::column("updated", Column::Updated),
            SortField::column("machine_id", Column::MachineId),
            SortField::related(
                "tenant_org_display_name",
                Relation::Tenant,
                "tenant_sort",
                "org_display_name",
            ),
            SortField::related("site_name", Relation::Site, "site_sort", "name"),
        ],
        "created",
    );

    fn id_of(model: &instance::Model) -> Uuid {
        model.id
    }

    fn create_model(input: InstanceCreateInput) -> (Uuid, instance::ActiveModel) {
        let id = Uuid::new_v4();
        let am = instance::ActiveModel {
            id: Set(id),
            name: Set(input.name),
            description: Set(input.description),
            allocation_id: Set(input.allocation_id),
            tenant_id: Set(input.tenant_id),
            infrastructure_provider_id: Set(input.infrastructure_provider_id),
            site_id: Set(input.site_id),
            machine_id: Set(input.machine_id),
            controller_instance_id: Set(input.controller_instance_id),
            hostname: Set(input.hostname),
            ipxe_script: Set(input.ipxe_script),
            always_boot_with_custom_ipxe: Set(input.always_boot_with_custom_ipxe),
            phone_home_enabled: Set(input.phone_home_enabled),
            user_data: Set(input.user_data),
            labels: Set(input.labels),
            is_update_pending: Set(input.is_update_pending),
            status: Set(input.status),
            power_status: Set(input.power_status),
            is_missing_on_site: Set(input.is_missing_on_site),
            created_by: Set(input.created_by),
            ..instance::ActiveModel::new()
        };
        (id, am)
    }

    fn update_model(input: InstanceUpdateInput) -> (Uuid, instance::ActiveModel) {
        let mut am = instance::ActiveModel::new();
        am.id = Set(input.id);
        if let Some(v) = input.name {
            am.name = Set(v);
        }
        if let Some(v) = input.description {
            am.description = Set(Some(v));
        }
        if let Some(v) = input.allocation_id {
            am.allocation_id = Set(Some(v));
        }
        if let Some(v) = input.tenant_id {
            am.tenant_id = Set(v);
        }
        if let Some(v) = input.infrastructure_provider_id {
            am.infrastructure_provider_id = Set(v);
        }
        if let Some(v) = input.site_id {
            am.site_id = Set(v);
        }
        if let Some(v) = input.machine_id {
            am.machine_id = Set(Some(v));
        }
        if let Some(v) = input.controller_instance_id {
            am.controller_instance_id = Set(Some(v));
        }
        if let Some(v) = input.hostname {
            am.hostname = Set(Some(v));
        }
        if let Some(v) = input.ipxe_script {
            am.ipxe_script = Set(Some(v));
        }
        if let Some(v) = input.always_boot_with_custom_ipxe {
            am.always_boot_with_custom_ipxe = Set(v);
        }
        if let Some(v) = input.phone_home_enabled {
            am.phone_home_enabled = Set(v);
        }
        if let Some(v) = input.user_data {
            am.user_data = Set(Some(v));
        }
        if let Some(v) = input.labels {
            am.labels = Set(Some(v));
        }
        if let Some(v) = input.is_update_pending {
            am.is_update_pending = Set(v);
        }
        if let Some(v) = input.status {
            am.status = Set(v);
        }
        if let Some(v) = input.power_status {
            am.power_status = Set(Some(v));
        }
        if let Some(v) = input.is_missing_on_site {
            am.is_missing_on_site = Set(v);
        }
        (input.id, am)
    }

    fn clear_model(input: InstanceClearInput) -> (Uuid, instance::ActiveModel) {
        let mut am = instance::ActiveModel::new();
        am.id = Set(input.id);
        if input.description {
            am.description = Set(None);
        }
        if input.allocation_id {
            am.allocation_id = Set(None);
        }
        if input.machine_id {
            am.machine_id = Set(None);
        }
        if input.controller_instance_id {
            am.controller_instance_id = Set(None);
        }
        if input.hostname {
            am.hostname = Set(None);
        }
        if input.ipxe_script {
            am.ipxe_script = Set(None);
        }
        if input.user_data {
            am.user_data = Set(None);
        }
        if input.labels {
            am.labels = Set(None);
        }
        if input.power_status {
            am.power_status = Set(None);
        }
        (input.id, am)
    }

    fn filter_condition(filter: &InstanceFilter, backend: DbBackend) -> Condition {
        Predicates::new()
            .one_of(Column::Id, filter.ids.as_deref())
            .one_of(Column::Name, filter.names.as_deref())
            .one_of(Column::AllocationId, filter.allocation_ids.as_deref())
            .one_of(Column::TenantId, filter.tenant_ids.as_deref())
            .one_of(
                Column::InfrastructureProviderId,
                filter.infrastructure_provider_ids.as_deref(),
            )
            .one_of(Column::SiteId, filter.site_ids.as_deref())
            .one_of(Column::MachineId, filter.machine_ids.as_deref())
            .one_of(Column::Status, filter.statuses.as_deref())
            .search(backend, &SEARCH_COLUMNS, filter.search.as_deref())
            .build()
    }

    async fn load<C: ConnectionTrait>(
        conn: &C,
        rows: Vec<instance::Model>,
        relations: &[Relation],
    ) -> Result<Vec<InstanceRecord>, DbErr> {
        let by_allocation = load_one_if(
            relations.contains(&Relation::Allocation),
            &rows,
            allocation::Entity,
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
        let by_provider = load_one_if(
            relations.contains(&Relation::InfrastructureProvider),
            &rows,
            infrastructure_provider::Entity,
            conn,
        )
        .await?;
        let by_site =
            load_one_if(relations.contains(&Relation::Site), &rows, site::Entity, conn).await?;
        let by_machine = load_one_if(
            relations.contains(&Relation::Machine),
            &rows,
            machine::Entity,
            conn,
        )
        .await?;

        Ok(rows
            .into_iter()
            .zip(by_allocation)
            .zip(by_tenant)
            .zip(by_provider)
            .zip(by_site)
            .zip(by_machine)
            .map(
                |(((((instance, allocation), tenant), infrastructure_provider), site), machine)| {
                    InstanceRecord {
                        instance,
                        allocation,
                        tenant,
                        infrastructure_provider,
                        site,
                        machine,
                    }
                },
            )
            .collect())
    }
}

impl StatusSchema for InstanceSchema {
    type Status = InstanceStatus;

    const STATUS: Column = Column::Status;
}
