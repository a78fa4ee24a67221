#![allow(clippy::unwrap_used, clippy::expect_used)]

//! `InfiniBand` partitions, `NVLink` interfaces and SSH key group associations.

mod common;

use fleet_db::{Dao, DaoError, OrderKey, PageRequest};
use fleet_inventory::dao::{
    InfiniBandPartitionClearInput, InfiniBandPartitionCreateInput, InfiniBandPartitionDao,
    InfiniBandPartitionFilter, InstanceCreateInput, InstanceDao, NvLinkInterfaceClearInput,
    NvLinkInterfaceCreateInput, NvLinkInterfaceDao, NvLinkInterfaceFilter,
    SshKeyGroupInstanceAssociationClearInput, SshKeyGroupInstanceAssociationCreateInput,
    SshKeyGroupInstanceAssociationDao, SshKeyGroupInstanceAssociationFilter,
    SshKeyGroupInstanceAssociationUpdateInput,
};
use fleet_inventory::entity::infiniband_partition::InfiniBandPartitionStatus;
use fleet_inventory::entity::nvlink_interface::{self, NvLinkInterfaceStatus};
use fleet_inventory::entity::ssh_key_group_instance_association;
use sea_orm::DatabaseConnection;
use uuid::Uuid;

use common::{Seed, insert_ssh_key_group, seed, setup, tick};

fn partition(s: &Seed, name: &str, org: &str) -> InfiniBandPartitionCreateInput {
    InfiniBandPartitionCreateInput {
        name: name.to_owned(),
        description: None,
        org: org.to_owned(),
        site_id: s.site,
        tenant_id: s.tenant,
        controller_ib_partition_id: None,
        partition_key: None,
        partition_name: None,
        service_level: None,
        rate_limit: None,
        mtu: None,
        enable_sharp: None,
        labels: None,
        status: InfiniBandPartitionStatus::Pending,
        is_missing_on_site: false,
        created_by: s.user,
    }
}

fn interface(s: &Seed, instance_id: Uuid, device_instance: i32) -> NvLinkInterfaceCreateInput {
    NvLinkInterfaceCreateInput {
        id: None,
        instance_id,
        site_id: s.site,
        nvlink_logical_partition_id: Uuid::new_v4(),
        nvlink_domain_id: None,
        device: None,
        device_instance,
        gpu_guid: None,
        status: NvLinkInterfaceStatus::Pending,
        created_by: s.user,
    }
}

async fn create_instance(conn: &DatabaseConnection, s: &Seed, name: &str) -> Uuid {
    InstanceDao::default()
        .create(
            conn,
            InstanceCreateInput::new(name, s.tenant, s.provider, s.site, s.user),
            &[],
        )
        .await
        .unwrap()
        .instance
        .id
}

#[tokio::test]
async fn partitions_filter_by_org_and_sharp() {
    let db = setup().await;
    let conn = db.conn();
    let s = seed(conn).await;
    let dao = InfiniBandPartitionDao::default();

    let mut sharp = partition(&s, "ib-sharp", "tenant-org-a");
    sharp.enable_sharp = Some(true);
    sharp.partition_key = Some("0x7fff".to_owned());
    sharp.rate_limit = Some(200.0);
    sharp.mtu = Some(4096);
    let created = dao
        .create_multiple(
            conn,
            vec![sharp, partition(&s, "ib-plain", "tenant-org-b")],
            &[],
        )
        .await
        .unwrap();

    let by_org = InfiniBandPartitionFilter {
        tenant_orgs: Some(vec!["tenant-org-b".to_owned()]),
        ..InfiniBandPartitionFilter::default()
    };
    let page = dao
        .get_all(conn, &by_org, &PageRequest::default(), &[])
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].infiniband_partition.name, "ib-plain");

    let sharp_only = InfiniBandPartitionFilter {
        sharp_enabled: Some(true),
        partition_keys: Some(vec!["0x7fff".to_owned()]),
        ..InfiniBandPartitionFilter::default()
    };
    assert_eq!(dao.get_count(conn, &sharp_only).await.unwrap(), 1);

    tick().await;
    let cleared = dao
        .clear(
            conn,
            InfiniBandPartitionClearInput {
                id: created[0].infiniband_partition.id,
                rate_limit: true,
                mtu: true,
                ..InfiniBandPartitionClearInput::default()
            },
            &[],
        )
        .await
        .unwrap()
        .infiniband_partition;
    assert_eq!(cleared.rate_limit, None);
    assert_eq!(cleared.mtu, None);
    assert_eq!(cleared.enable_sharp, Some(true));

    let sorted = dao
        .get_all(
            conn,
            &InfiniBandPartitionFilter::default(),
            &PageRequest::default().order(OrderKey::asc("name")),
            &["site".parse().unwrap()],
        )
        .await
        .unwrap();
    let names: Vec<_> = sorted
        .items
        .iter()
        .map(|r| r.infiniband_partition.name.as_str())
        .collect();
    assert_eq!(names, ["ib-plain", "ib-sharp"]);
    assert!(sorted.items.iter().all(|r| r.site.is_some() && r.tenant.is_none()));
}

#[tokio::test]
async fn nvlink_interfaces_accept_caller_ids() {
    let db = setup().await;
    let conn = db.conn();
    let s = seed(conn).await;
    let vm = create_instance(conn, &s, "vm").await;
    let dao = NvLinkInterfaceDao::default();

    let fixed = Uuid::new_v4();
    let mut first = interface(&s, vm, 0);
    first.id = Some(fixed);
    first.device = Some("GB200".to_owned());
    first.gpu_guid = Some("gpu-guid-0".to_owned());
    let created = dao
        .create_multiple(conn, vec![first, interface(&s, vm, 1)], &[nvlink_interface::Relation::Instance])
        .await
        .unwrap();
    assert_eq!(created[0].nvlink_interface.id, fixed);
    assert_ne!(created[1].nvlink_interface.id, fixed);
    assert_eq!(created[1].nvlink_interface.device_instance, 1);
    assert!(created.iter().all(|r| r.instance.as_ref().map(|i| i.id) == Some(vm)));

    let search = NvLinkInterfaceFilter {
        search: Some("gb200".to_owned()),
        ..NvLinkInterfaceFilter::default()
    };
    assert_eq!(dao.get_count(conn, &search).await.unwrap(), 1);

    let page = dao
        .get_all(
            conn,
            &NvLinkInterfaceFilter {
                instance_ids: Some(vec![vm]),
                ..NvLinkInterfaceFilter::default()
            },
            &PageRequest::default().order(OrderKey::desc("device_instance")),
            &[],
        )
        .await
        .unwrap();
    let order: Vec<_> = page
        .items
        .iter()
        .map(|r| r.nvlink_interface.device_instance)
        .collect();
    assert_eq!(order, [1, 0]);

    let cleared = dao
        .clear(
            conn,
            NvLinkInterfaceClearInput {
                id: fixed,
                device: true,
                gpu_guid: true,
                ..NvLinkInterfaceClearInput::default()
            },
            &[],
        )
        .await
        .unwrap()
        .nvlink_interface;
    assert_eq!(cleared.device, None);
    assert_eq!(cleared.gpu_guid, None);
    assert_eq!(dao.get_count(conn, &search).await.unwrap(), 0);
}

#[tokio::test]
async fn associations_move_between_instances() {
    let db = setup().await;
    let conn = db.conn();
    let s = seed(conn).await;
    let group = insert_ssh_key_group(conn, "admins", s.tenant, s.user).await;
    let vm_a = create_instance(conn, &s, "vm-a").await;
    let vm_b = create_instance(conn, &s, "vm-b").await;
    let dao = SshKeyGroupInstanceAssociationDao::default();

    let created = dao
        .create(
            conn,
            SshKeyGroupInstanceAssociationCreateInput {
                ssh_key_group_id: group,
                site_id: s.site,
                instance_id: vm_a,
                created_by: s.user,
            },
            &[ssh_key_group_instance_association::Relation::SshKeyGroup],
        )
        .await
        .unwrap();
    assert_eq!(
        created.ssh_key_group.as_ref().map(|g| g.name.as_str()),
        Some("admins")
    );

    let noop = dao
        .clear(
            conn,
            SshKeyGroupInstanceAssociationClearInput {
                id: created.association.id,
            },
            &[],
        )
        .await
        .unwrap();
    assert_eq!(noop.association, created.association);

    tick().await;
    let moved = dao
        .update(
            conn,
            SshKeyGroupInstanceAssociationUpdateInput {
                id: created.association.id,
                instance_id: Some(vm_b),
                ..SshKeyGroupInstanceAssociationUpdateInput::default()
            },
            &["instance".parse().unwrap()],
        )
        .await
        .unwrap();
    assert_eq!(moved.instance.map(|i| i.id), Some(vm_b));
    assert!(moved.association.updated > created.association.updated);

    let on_a = SshKeyGroupInstanceAssociationFilter {
        instance_ids: Some(vec![vm_a]),
        ..SshKeyGroupInstanceAssociationFilter::default()
    };
    assert_eq!(dao.get_count(conn, &on_a).await.unwrap(), 0);

    let err = dao
        .get_all(
            conn,
            &SshKeyGroupInstanceAssociationFilter::default(),
            &PageRequest::default().order(OrderKey::asc("name")),
            &[],
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DaoError::InvalidOrderBy { .. }));
    assert!(matches!(
        "tenant".parse::<ssh_key_group_instance_association::Relation>(),
        Err(DaoError::InvalidRelation { .. })
    ));
}
