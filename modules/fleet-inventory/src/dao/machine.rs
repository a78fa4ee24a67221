//! Machines: bare-metal hosts reported by a site controller.
//!
//! Unlike the other entities the id is supplied by the caller; it is the
//! controller's own machine identifier.

use std::str::FromStr;

use async_trait::async_trait;
use fleet_db::filter::{Predicates, load_one_if};
use fleet_db::{DaoError, EntitySchema, SeaDao, SortField, SortTable};
use sea_orm::ActiveValue::Set;
use sea_orm::{ActiveModelBehavior, Condition, ConnectionTrait, DbBackend, DbErr};
use serde::Serialize;
use uuid::Uuid;

use super::StatusSchema;
use crate::entity::machine::{self, Column, MachineStatus, Relation};
use crate::entity::{Labels, infrastructure_provider, site};

pub struct MachineSchema;

pub type MachineDao = SeaDao<MachineSchema>;

#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone)]
pub struct MachineCreateInput {
    pub id: String,
    pub infrastructure_provider_id: Uuid,
    pub site_id: Uuid,
    pub controller_machine_id: String,
    pub controller_machine_type: Option<String>,
    pub vendor: Option<String>,
    pub product_name: Option<String>,
    pub serial_number: Option<String>,
    pub hostname: Option<String>,
    pub default_mac_address: Option<String>,
    pub is_in_maintenance: bool,
    pub maintenance_message: Option<String>,
    pub is_network_degraded: bool,
    pub network_health_message: Option<String>,
    pub is_assigned: bool,
    pub is_missing_on_site: bool,
    pub labels: Option<Labels>,
    pub status: MachineStatus,
}

impl MachineCreateInput {
    /// A healthy, unassigned machine with no descriptive fields.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        infrastructure_provider_id: Uuid,
        site_id: Uuid,
        status: MachineStatus,
    ) -> Self {
        let id = id.into();
        Self {
            controller_machine_id: id.clone(),
            id,
            infrastructure_provider_id,
            site_id,
            controller_machine_type: None,
            vendor: None,
            product_name: None,
            serial_number: None,
            hostname: None,
            default_mac_address: None,
            is_in_maintenance: false,
            maintenance_message: None,
            is_network_degraded: false,
            network_health_message: None,
            is_assigned: false,
            is_missing_on_site: false,
            labels: None,
            status,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MachineUpdateInput {
    pub id: String,
    pub infrastructure_provider_id: Option<Uuid>,
    pub site_id: Option<Uuid>,
    pub controller_machine_id: Option<String>,
    pub controller_machine_type: Option<String>,
    pub vendor: Option<String>,
    pub product_name: Option<String>,
    pub serial_number: Option<String>,
    pub hostname: Option<String>,
    pub default_mac_address: Option<String>,
    pub is_in_maintenance: Option<bool>,
    pub maintenance_message: Option<String>,
    pub is_network_degraded: Option<bool>,
    pub network_health_message: Option<String>,
    pub is_assigned: Option<bool>,
    pub is_missing_on_site: Option<bool>,
    pub labels: Option<Labels>,
    pub status: Option<MachineStatus>,
}

#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Default)]
pub struct MachineClearInput {
    pub id: String,
    pub controller_machine_type: bool,
    pub vendor: bool,
    pub product_name: bool,
    pub serial_number: bool,
    pub hostname: bool,
    pub default_mac_address: bool,
    pub maintenance_message: bool,
    pub network_health_message: bool,
    pub labels: bool,
}

#[derive(Debug, Clone, Default)]
pub struct MachineFilter {
    pub infrastructure_provider_ids: Option<Vec<Uuid>>,
    pub site_ids: Option<Vec<Uuid>>,
    pub statuses: Option<Vec<MachineStatus>>,
    pub ids: Option<Vec<String>>,
    pub hostnames: Option<Vec<String>>,
    pub is_assigned: Option<bool>,
    pub is_in_maintenance: Option<bool>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MachineRecord {
    #[serde(flatten)]
    pub machine: machine::Model,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub infrastructure_provider: Option<infrastructure_provider::Model>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site: Option<site::Model>,
}

const SEARCH_COLUMNS: [Column; 7] = [
    Column::Id,
    Column::Hostname,
    Column::Vendor,
    Column::ProductName,
    Column::SerialNumber,
    Column::Status,
    Column::Labels,
];

impl FromStr for Relation {
    type Err = DaoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "infrastructureprovider" | "infrastructure_provider" => {
                Ok(Self::InfrastructureProvider)
            }
            "site" => Ok(Self::Site),
            _ => Err(DaoError::InvalidRelation {
                entity: MachineSchema::NAME,
                relation: s.to_owned(),
            }),
        }
    }
}

#[async_trait]
impl EntitySchema for MachineSchema {
    const NAME: &'static str = "Machine";

    type Entity = machine::Entity;
    type Model = machine::Model;
    type ActiveModel = machine::ActiveModel;

    type Id = String;
    type Relation = Relation;
    type Record = MachineRecord;

    type CreateInput = MachineCreateInput;
    type UpdateInput = MachineUpdateInput;
    type ClearInput = MachineClearInput;
    type Filter = MachineFilter;

    const SORT: SortTable<Column, Relation> = SortTable::new(
        &[
            SortField::column("hostname", Column::Hostname),
            SortField::column("vendor", Column::Vendor),
            SortField::column("product_name", Column::ProductName),
            SortField::column("status", Column::Status),
            SortField::column("created", Column::Created),
            SortField::column("updated", Column::Updated),
            SortField::related("site_name", Relation::Site, "site_sort", "name"),
        ],
        "created",
    );

    fn id_of(model: &machine::Model) -> String {
        model.id.clone()
    }

    fn create_model(input: MachineCreateInput) -> (String, machine::ActiveModel) {
        let am = machine::ActiveModel {
            id: Set(input.id.clone()),
            infrastructure_provider_id: Set(input.infrastructure_provider_id),
            site_id: Set(input.site_id),
            controller_machine_id: Set(input.controller_machine_id),
            controller_machine_type: Set(input.controller_machine_type),
            vendor: Set(input.vendor),
            product_name: Set(input.product_name),
            serial_number: Set(input.serial_number),
            hostname: Set(input.hostname),
            default_mac_address: Set(input.default_mac_address),
            is_in_maintenance: Set(input.is_in_maintenance),
            maintenance_message: Set(input.maintenance_message),
            is_network_degraded: Set(input.is_network_degraded),
            network_health_message: Set(input.network_health_message),
            is_assigned: Set(input.is_assigned),
            is_missing_on_site: Set(input.is_missing_on_site),
            labels: Set(input.labels),
            status: Set(input.status),
            ..machine::ActiveModel::new()
        };
        (input.id, am)
    }

    fn update_model(input: MachineUpdateInput) -> (String, machine::ActiveModel) {
        let mut am = machine::ActiveModel::new();
        am.id = Set(input.id.clone());
        if let Some(v) = input.infrastructure_provider_id {
            am.infrastructure_provider_id = Set(v);
        }
        if let Some(v) = input.site_id {
            am.site_id = Set(v);
        }
        if let Some(v) = input.controller_machine_id {
            am.controller_machine_id = Set(v);
        }
        if let Some(v) = input.controller_machine_type {
            am.controller_machine_type = Set(Some(v));
        }
        if let Some(v) = input.vendor {
            am.vendor = Set(Some(v));
        }
        if let Some(v) = input.product_name {
            am.product_name = Set(Some(v));
        }
        if let Some(v) = input.serial_number {
            am.serial_number = Set(Some(v));
        }
        if let Some(v) = input.hostname {
            am.hostname = Set(Some(v));
        }
        if let Some(v) = input.default_mac_address {
            am.default_mac_address = Set(Some(v));
        }
        if let Some(v) = input.is_in_maintenance {
            am.is_in_maintenance = Set(v);
        }
        if let Some(v) = input.maintenance_message {
            am.maintenance_message = Set(Some(v));
        }
        if let Some(v) = input.is_network_degraded {
            am.is_network_degraded = Set(v);
        }
        if let Some(v) = input.network_health_message {
            am.network_health_message = Set(Some(v));
        }
        if let Some(v) = input.is_assigned {
            am.is_assigned = Set(v);
        }
        if let Some(v) = input.is_missing_on_site {
            am.is_missing_on_site = Set(v);
        }
        if let Some(v) = input.labels {
            am.labels = Set(Some(v));
        }
        if let Some(v) = input.status {
            am.status = Set(v);
        }
        (input.id, am)
    }

    fn clear_model(input: MachineClearInput) -> (String, machine::ActiveModel) {
        let mut am = machine::ActiveModel::new();
        am.id = Set(input.id.clone());
        if input.controller_machine_type {
            am.controller_machine_type = Set(None);
        }
        if input.vendor {
            am.vendor = Set(None);
        }
        if input.product_name {
            am.product_name = Set(None);
        }
        if input.serial_number {
            am.serial_number = Set(None);
        }
        if input.hostname {
            am.hostname = Set(None);
        }
        if input.default_mac_address {
            am.default_mac_address = Set(None);
        }
        if input.maintenance_message {
            am.maintenance_message = Set(None);
        }
        if input.network_health_message {
            am.network_health_message = Set(None);
        }
        if input.labels {
            am.labels = Set(None);
        }
        (input.id, am)
    }

    fn filter_condition(filter: &MachineFilter, backend: DbBackend) -> Condition {
        Predicates::new()
            .one_of(
                Column::InfrastructureProviderId,
                filter.infrastructure_provider_ids.as_deref(),
            )
            .one_of(Column::SiteId, filter.site_ids.as_deref())
            .one_of(Column::Status, filter.statuses.as_deref())
            .one_of(Column::Id, filter.ids.as_deref())
            .one_of(Column::Hostname, filter.hostnames.as_deref())
            .eq(Column::IsAssigned, filter.is_assigned.as_ref())
            .eq(Column::IsInMaintenance, filter.is_in_maintenance.as_ref())
            .search(backend, &SEARCH_COLUMNS, filter.search.as_deref())
            .build()
    }

    async fn load<C: ConnectionTrait>(
        conn: &C,
        rows: Vec<machine::Model>,
        relations: &[Relation],
    ) -> Result<Vec<MachineRecord>, DbErr> {
        let by_provider = load_one_if(
            relations.contains(&Relation::InfrastructureProvider),
            &rows,
            infrastructure_provider::Entity,
            conn,
        )
        .await?;
        let by_site =
            load_one_if(relations.contains(&Relation::Site), &rows, site::Entity, conn).await?;

        Ok(rows
            .into_iter()
            .zip(by_provider)
            .zip(by_site)
            .map(|((machine, infrastructure_provider), site)| MachineRecord {
                machine,
                infrastructure_provider,
                site,
            })
            .collect())
    }
}

impl StatusSchema for MachineSchema {
    type Status = MachineStatus;

    const STATUS: Column = Column::Status;
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn clear_touches_only_flagged_columns() {
        let (id, am) = MachineSchema::clear_model(MachineClearInput {
            id: "m-1".to_owned(),
            vendor: true,
            labels: true,
            ..MachineClearInput::default()
        });
        assert_eq!(id, "m-1");
        assert_eq!(am.vendor, Set(None));
        assert_eq!(am.labels, Set(None));
        assert!(!am.hostname.is_set());
        assert!(!am.status.is_set());
    }

    #[test]
    fn controller_id_defaults_to_machine_id() {
        let input = MachineCreateInput::new("m-7", Uuid::nil(), Uuid::nil(), MachineStatus::Ready);
        assert_eq!(input.controller_machine_id, "m-7");
        assert!(!input.is_assigned);
    }
}
