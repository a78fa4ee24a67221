//! Links between SSH key groups and the instances they grant access to.

use std::str::FromStr;

use async_trait::async_trait;
use fleet_db::filter::{Predicates, load_one_if};
use fleet_db::{DaoError, EntitySchema, SeaDao, SortField, SortTable};
use sea_orm::ActiveValue::Set;
use sea_orm::{ActiveModelBehavior, Condition, ConnectionTrait, DbBackend, DbErr};
use serde::Serialize;
use uuid::Uuid;

use crate::entity::ssh_key_group_instance_association::{self as association, Column, Relation};
use crate::entity::{instance, site, ssh_key_group};

pub struct SshKeyGroupInstanceAssociationSchema;

pub type SshKeyGroupInstanceAssociationDao = SeaDao<SshKeyGroupInstanceAssociationSchema>;

#[derive(Debug, Clone)]
pub struct SshKeyGroupInstanceAssociationCreateInput {
    pub ssh_key_group_id: Uuid,
    pub site_id: Uuid,
    pub instance_id: Uuid,
    pub created_by: Uuid,
}

#[derive(Debug, Clone, Default)]
pub struct SshKeyGroupInstanceAssociationUpdateInput {
    pub id: Uuid,
    pub ssh_key_group_id: Option<Uuid>,
    pub site_id: Option<Uuid>,
    pub instance_id: Option<Uuid>,
}

/// Associations have no optional columns; clearing only reads the row back.
#[derive(Debug, Clone, Default)]
pub struct SshKeyGroupInstanceAssociationClearInput {
    pub id: Uuid,
}

#[derive(Debug, Clone, Default)]
pub struct SshKeyGroupInstanceAssociationFilter {
    pub ids: Option<Vec<Uuid>>,
    pub ssh_key_group_ids: Option<Vec<Uuid>>,
    pub site_ids: Option<Vec<Uuid>>,
    pub instance_ids: Option<Vec<Uuid>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SshKeyGroupInstanceAssociationRecord {
    #[serde(flatten)]
    pub association: association::Model,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssh_key_group: Option<ssh_key_group::Model>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site: Option<site::Model>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance: Option<instance::Model>,
}

impl FromStr for Relation {
    type Err = DaoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sshkeygroup" | "ssh_key_group" => Ok(Self::SshKeyGroup),
            "site" => Ok(Self::Site),
            "instance" => Ok(Self::Instance),
            _ => Err(DaoError::InvalidRelation {
                entity: SshKeyGroupInstanceAssociationSchema::NAME,
                relation: s.to_owned(),
            }),
        }
    }
}

#[async_trait]
impl EntitySchema for SshKeyGroupInstanceAssociationSchema {
    const NAME: &'static str = "SSHKeyGroupInstanceAssociation";

    type Entity = association::Entity;
    type Model = association::Model;
    type ActiveModel = association::ActiveModel;

    type Id = Uuid;
    type Relation = Relation;
    type Record = SshKeyGroupInstanceAssociationRecord;

    type CreateInput = SshKeyGroupInstanceAssociationCreateInput;
    type UpdateInput = SshKeyGroupInstanceAssociationUpdateInput;
    type ClearInput = SshKeyGroupInstanceAssociationClearInput;
    type Filter = SshKeyGroupInstanceAssociationFilter;

    const SORT: SortTable<Column, Relation> = SortTable::new(
        &[
            SortField::column("created", Column::Created),
            SortField::column("updated", Column::Updated),
        ],
        "created",
    );

    fn id_of(model: &association::Model) -> Uuid {
        model.id
    }

    fn create_model(
        input: SshKeyGroupInstanceAssociationCreateInput,
    ) -> (Uuid, association::ActiveModel) {
        let id = Uuid::new_v4();
        let am = association::ActiveModel {
            id: Set(id),
            ssh_key_group_id: Set(input.ssh_key_group_id),
            site_id: Set(input.site_id),
            instance_id: Set(input.instance_id),
            created_by: Set(input.created_by),
            ..association::ActiveModel::new()
        };
        (id, am)
    }

    fn update_model(
        input: SshKeyGroupInstanceAssociationUpdateInput,
    ) -> (Uuid, association::ActiveModel) {
        let mut am = association::ActiveModel::new();
        am.id = Set(input.id);
        if let Some(v) = input.ssh_key_group_id {
            am.ssh_key_group_id = Set(v);
        }
        if let Some(v) = input.site_id {
            am.site_id = Set(v);
        }
        if let Some(v) = input.instance_id {
            am.instance_id = Set(v);
        }
        (input.id, am)
    }

    fn clear_model(
        input: SshKeyGroupInstanceAssociationClearInput,
    ) -> (Uuid, association::ActiveModel) {
        let mut am = association::ActiveModel::new();
        am.id = Set(input.id);
        (input.id, am)
    }

    fn filter_condition(
        filter: &SshKeyGroupInstanceAssociationFilter,
        _backend: DbBackend,
    ) -> Condition {
        Predicates::new()
            .one_of(Column::Id, filter.ids.as_deref())
            .one_of(Column::SshKeyGroupId, filter.ssh_key_group_ids.as_deref())
            .one_of(Column::SiteId, filter.site_ids.as_deref())
            .one_of(Column::InstanceId, filter.instance_ids.as_deref())
            .build()
    }

    async fn load<C: ConnectionTrait>(
        conn: &C,
        rows: Vec<association::Model>,
        relations: &[Relation],
    ) -> Result<Vec<SshKeyGroupInstanceAssociationRecord>, DbErr> {
        let by_group = load_one_if(
            relations.contains(&Relation::SshKeyGroup),
            &rows,
            ssh_key_group::Entity,
            conn,
        )
        .await?;
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
            .zip(by_group)
            .zip(by_site)
            .zip(by_instance)
            .map(
                |(((association, ssh_key_group), site), instance)| {
                    SshKeyGroupInstanceAssociationRecord {
                        association,
                        ssh_key_group,
                        site,
                        instance,
                    }
                },
            )
            .collect())
    }
}
