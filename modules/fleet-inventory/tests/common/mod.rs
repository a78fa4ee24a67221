#![allow(clippy::unwrap_used, clippy::expect_used, dead_code)]

//! Shared fixtures: an in-memory database with the schema applied and a few
//! parent rows to hang entities off.

use fleet_db::{ConnectOpts, DbHandle};
use fleet_inventory::Migrator;
use fleet_inventory::entity::{infrastructure_provider, site, ssh_key_group, tenant};
use sea_orm::ActiveValue::Set;
use sea_orm::{ActiveModelBehavior, ActiveModelTrait, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use uuid::Uuid;

pub async fn setup() -> DbHandle {
    let db = DbHandle::connect("sqlite::memory:", ConnectOpts::default())
        .await
        .expect("open in-memory sqlite");
    Migrator::up(db.conn(), None).await.expect("apply migrations");
    db
}

/// Two providers, two tenants and two sites.
#[derive(Debug, Clone, Copy)]
pub struct Seed {
    pub user: Uuid,
    pub provider: Uuid,
    pub provider_b: Uuid,
    pub tenant: Uuid,
    pub tenant_b: Uuid,
    pub site: Uuid,
    pub site_b: Uuid,
}

pub async fn seed(conn: &DatabaseConnection) -> Seed {
    let user = Uuid::new_v4();
    let provider = insert_provider(conn, "provider-a", "org-a", user).await;
    let provider_b = insert_provider(conn, "provider-b", "org-b", user).await;
    let tenant = insert_tenant(conn, "tenant-a", "tenant-org-a", Some("Zenith"), user).await;
    let tenant_b = insert_tenant(conn, "tenant-b", "tenant-org-b", Some("Acme"), user).await;
    let site = insert_site(conn, "site-alpha", provider, user).await;
    let site_b = insert_site(conn, "site-beta", provider_b, user).await;
    Seed {
        user,
        provider,
        provider_b,
        tenant,
        tenant_b,
        site,
        site_b,
    }
}

pub async fn insert_provider(conn: &DatabaseConnection, name: &str, org: &str, user: Uuid) -> Uuid {
    let id = Uuid::new_v4();
    infrastructure_provider::ActiveModel {
        id: Set(id),
        name: Set(name.to_owned()),
        display_name: Set(None),
        org: Set(org.to_owned()),
        org_display_name: Set(None),
        created_by: Set(user),
        ..infrastructure_provider::ActiveModel::new()
    }
    .insert(conn)
    .await
    .expect("insert provider");
    id
}

pub async fn insert_tenant(
    conn: &DatabaseConnection,
    name: &str,
    org: &str,
    org_display_name: Option<&str>,
    user: Uuid,
) -> Uuid {
    let id = Uuid::new_v4();
    tenant::ActiveModel {
        id: Set(id),
        name: Set(name.to_owned()),
        display_name: Set(None),
        org: Set(org.to_owned()),
        org_display_name: Set(org_display_name.map(str::to_owned)),
        created_by: Set(user),
        ..tenant::ActiveModel::new()
    }
    .insert(conn)
    .await
    .expect("insert tenant");
    id
}

pub async fn insert_site(conn: &DatabaseConnection, name: &str, provider: Uuid, user: Uuid) -> Uuid {
    let id = Uuid::new_v4();
    site::ActiveModel {
        id: Set(id),
        name: Set(name.to_owned()),
        description: Set(None),
        org: Set("org-a".to_owned()),
        infrastructure_provider_id: Set(provider),
        status: Set("Registered".to_owned()),
        created_by: Set(user),
        ..site::ActiveModel::new()
    }
    .insert(conn)
    .await
    .expect("insert site");
    id
}

pub async fn insert_ssh_key_group(
    conn: &DatabaseConnection,
    name: &str,
    tenant: Uuid,
    user: Uuid,
) -> Uuid {
    let id = Uuid::new_v4();
    ssh_key_group::ActiveModel {
        id: Set(id),
        name: Set(name.to_owned()),
        description: Set(None),
        org: Set("tenant-org-a".to_owned()),
        tenant_id: Set(tenant),
        status: Set("Synced".to_owned()),
        created_by: Set(user),
        ..ssh_key_group::ActiveModel::new()
    }
    .insert(conn)
    .await
    .expect("insert ssh key group");
    id
}

/// Long enough for two `Utc::now()` readings to differ on every platform.
pub async fn tick() {
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
}
