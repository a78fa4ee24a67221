#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use fleet_db::{Dao, OrderKey, PageRequest};
use fleet_inventory::CountByStatus;
use fleet_inventory::dao::{
    AllocationCreateInput, AllocationDao, InstanceClearInput, InstanceCreateInput, InstanceDao,
    InstanceFilter, InstanceUpdateInput, MachineCreateInput, MachineDao,
};
use fleet_inventory::entity::allocation::AllocationStatus;
use fleet_inventory::entity::instance::{InstancePowerStatus, InstanceStatus, Relation};
use fleet_inventory::entity::machine::MachineStatus;
use uuid::Uuid;

use common::{Seed, seed, setup, tick};

fn instance(s: &Seed, name: &str) -> InstanceCreateInput {
    InstanceCreateInput::new(name, s.tenant, s.provider, s.site, s.user)
}

#[tokio::test]
async fn placement_relations_load_on_request() {
    let db = setup().await;
    let conn = db.conn();
    let s = seed(conn).await;

    let allocation = AllocationDao::default()
        .create(
            conn,
            AllocationCreateInput {
                name: "alloc".to_owned(),
                description: None,
                infrastructure_provider_id: s.provider,
                tenant_id: s.tenant,
                site_id: s.site,
                status: AllocationStatus::Registered,
                created_by: s.user,
            },
            &[],
        )
        .await
        .unwrap()
        .allocation;
    MachineDao::default()
        .create(
            conn,
            MachineCreateInput::new("gpu-01", s.provider, s.site, MachineStatus::InUse),
            &[],
        )
        .await
        .unwrap();

    let mut input = instance(&s, "vm-1");
    input.allocation_id = Some(allocation.id);
    input.machine_id = Some("gpu-01".to_owned());
    input.power_status = Some(InstancePowerStatus::BootCompleted);
    input.phone_home_enabled = true;

    let dao = InstanceDao::default();
    let created = dao.create(conn, input, &[]).await.unwrap();
    assert!(created.machine.is_none());
    assert!(created.allocation.is_none());

    let rels: Vec<Relation> = ["machine", "Allocation", "tenant"]
        .iter()
        .map(|name| name.parse().unwrap())
        .collect();
    let got = dao
        .get_by_id(conn, &created.instance.id, &rels)
        .await
        .unwrap();
    assert_eq!(got.machine.as_ref().map(|m| m.id.as_str()), Some("gpu-01"));
    assert_eq!(got.allocation.map(|a| a.id), Some(allocation.id));
    assert_eq!(got.tenant.map(|t| t.id), Some(s.tenant));
    assert!(got.site.is_none());
    assert!(got.infrastructure_provider.is_none());
    assert!(got.instance.phone_home_enabled);
    assert_eq!(got.instance.status, InstanceStatus::Pending);

    assert!("nvlink".parse::<Relation>().is_err());
}

#[tokio::test]
async fn clear_detaches_the_machine() {
    let db = setup().await;
    let conn = db.conn();
    let s = seed(conn).await;
    MachineDao::default()
        .create(
            conn,
            MachineCreateInput::new("gpu-02", s.provider, s.site, MachineStatus::InUse),
            &[],
        )
        .await
        .unwrap();

    let dao = InstanceDao::default();
    let mut input = instance(&s, "vm-2");
    input.machine_id = Some("gpu-02".to_owned());
    input.power_status = Some(InstancePowerStatus::Rebooting);
    input.hostname = Some("vm-2.local".to_owned());
    let created = dao.create(conn, input, &[]).await.unwrap().instance;

    tick().await;
    let cleared = dao
        .clear(
            conn,
            InstanceClearInput {
                id: created.id,
                machine_id: true,
                power_status: true,
                ..InstanceClearInput::default()
            },
            &[Relation::Machine],
        )
        .await
        .unwrap();
    assert_eq!(cleared.instance.machine_id, None);
    assert_eq!(cleared.instance.power_status, None);
    assert!(cleared.machine.is_none());
    assert_eq!(cleared.instance.hostname.as_deref(), Some("vm-2.local"));
    assert!(cleared.instance.updated > created.updated);

    let by_machine = InstanceFilter {
        machine_ids: Some(vec!["gpu-02".to_owned()]),
        ..InstanceFilter::default()
    };
    assert_eq!(dao.get_count(conn, &by_machine).await.unwrap(), 0);
}

#[tokio::test]
async fn status_counts_follow_filters() {
    let db = setup().await;
    let conn = db.conn();
    let s = seed(conn).await;
    let dao = InstanceDao::default();

    let mut inputs = Vec::new();
    for (i, status) in [
        InstanceStatus::Ready,
        InstanceStatus::Ready,
        InstanceStatus::Error,
        InstanceStatus::Terminating,
    ]
    .into_iter()
    .enumerate()
    {
        let mut input = instance(&s, &format!("vm-{i}"));
        input.status = status;
        if i == 3 {
            input.site_id = s.site_b;
        }
        inputs.push(input);
    }
    dao.create_multiple(conn, inputs, &[]).await.unwrap();

    let all = dao
        .get_count_by_status(conn, &InstanceFilter::default())
        .await
        .unwrap();
    assert_eq!(all.total, 4);
    assert_eq!(all.get(InstanceStatus::Ready), 2);
    assert_eq!(all.get(InstanceStatus::Terminating), 1);
    assert_eq!(all.get(InstanceStatus::Pending), 0);

    let first_site = dao
        .get_count_by_status(
            conn,
            &InstanceFilter {
                site_ids: Some(vec![s.site]),
                ..InstanceFilter::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(first_site.total, 3);
    assert_eq!(first_site.get(InstanceStatus::Terminating), 0);
}

#[tokio::test]
async fn bulk_update_and_tenant_sort() {
    let db = setup().await;
    let conn = db.conn();
    let s = seed(conn).await;
    let dao = InstanceDao::default();

    let mut acme = instance(&s, "acme-vm");
    acme.tenant_id = s.tenant_b;
    let created = dao
        .create_multiple(conn, vec![instance(&s, "zenith-vm"), acme], &[])
        .await
        .unwrap();

    let page = dao
        .get_all(
            conn,
            &InstanceFilter::default(),
            &PageRequest::default().order(OrderKey::desc("tenant_org_display_name")),
            &[],
        )
        .await
        .unwrap();
    let names: Vec<_> = page.items.iter().map(|r| r.instance.name.as_str()).collect();
    assert_eq!(names, ["zenith-vm", "acme-vm"]);
    assert!(page.items.iter().all(|r| r.tenant.is_some()));

    tick().await;
    let ids: Vec<Uuid> = created.iter().rev().map(|r| r.instance.id).collect();
    let updated = dao
        .update_multiple(
            conn,
            vec![
                InstanceUpdateInput {
                    id: ids[0],
                    is_update_pending: Some(true),
                    ..InstanceUpdateInput::default()
                },
                InstanceUpdateInput {
                    id: ids[1],
                    status: Some(InstanceStatus::Ready),
                    ..InstanceUpdateInput::default()
                },
            ],
            &[],
        )
        .await
        .unwrap();
    assert_eq!(updated[0].instance.id, ids[0]);
    assert!(updated[0].instance.is_update_pending);
    assert_eq!(updated[0].instance.status, InstanceStatus::Pending);
    assert_eq!(updated[1].instance.status, InstanceStatus::Ready);
    assert!(!updated[1].instance.is_update_pending);
}
