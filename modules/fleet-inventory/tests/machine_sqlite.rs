#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use fleet_db::{Dao, DaoError, OrderKey, PageRequest};
use fleet_inventory::dao::{
    MachineClearInput, MachineCreateInput, MachineDao, MachineFilter, MachineUpdateInput,
};
use fleet_inventory::entity::Labels;
use fleet_inventory::entity::machine::{MachineStatus, Relation};
use fleet_inventory::CountByStatus;

use common::{Seed, seed, setup, tick};

fn machine(seed: &Seed, id: &str, status: MachineStatus) -> MachineCreateInput {
    MachineCreateInput::new(id, seed.provider, seed.site, status)
}

#[tokio::test]
async fn thirty_machines_across_two_providers() {
    let db = setup().await;
    let conn = db.conn();
    let s = seed(conn).await;
    let dao = MachineDao::default();

    let inputs: Vec<MachineCreateInput> = (0..30)
        .map(|i| {
            let (provider, site) = if i % 2 == 0 {
                (s.provider, s.site)
            } else {
                (s.provider_b, s.site_b)
            };
            MachineCreateInput::new(format!("m-{i:02}"), provider, site, MachineStatus::Ready)
        })
        .collect();
    let created = dao.create_multiple(conn, inputs, &[]).await.unwrap();
    assert_eq!(created.len(), 30);

    let page = dao
        .get_all(conn, &MachineFilter::default(), &PageRequest::default(), &[])
        .await
        .unwrap();
    assert_eq!(page.items.len(), 20);
    assert_eq!(page.total, 30);
    assert!(page.has_more());

    assert_eq!(dao.get_count(conn, &MachineFilter::default()).await.unwrap(), 30);

    let by_provider = MachineFilter {
        infrastructure_provider_ids: Some(vec![s.provider]),
        ..MachineFilter::default()
    };
    let page = dao
        .get_all(conn, &by_provider, &PageRequest::default(), &[])
        .await
        .unwrap();
    assert_eq!(page.items.len(), 15);
    assert_eq!(page.total, 15);
    assert!(page
        .items
        .iter()
        .all(|r| r.machine.infrastructure_provider_id == s.provider));
}

#[tokio::test]
async fn caller_supplied_id_round_trips() {
    let db = setup().await;
    let conn = db.conn();
    let s = seed(conn).await;
    let dao = MachineDao::default();

    let mut input = machine(&s, "fm100-xyz", MachineStatus::Initializing);
    input.hostname = Some("node-07".to_owned());
    input.labels = Some([("rack", "r7"), ("row", "b")].into_iter().collect::<Labels>());
    let created = dao.create(conn, input, &[Relation::Site]).await.unwrap();
    assert_eq!(created.machine.id, "fm100-xyz");
    assert_eq!(created.machine.created, created.machine.updated);
    assert_eq!(created.site.as_ref().map(|site| site.id), Some(s.site));
    assert!(created.infrastructure_provider.is_none());

    let got = dao
        .get_by_id(conn, &"fm100-xyz".to_owned(), &[])
        .await
        .unwrap();
    assert_eq!(got.machine, created.machine);

    let dup = dao
        .create(conn, machine(&s, "fm100-xyz", MachineStatus::Ready), &[])
        .await
        .unwrap_err();
    assert!(dup.is_constraint_violation());
}

#[tokio::test]
async fn count_by_status_lists_every_status() {
    let db = setup().await;
    let conn = db.conn();
    let s = seed(conn).await;
    let dao = MachineDao::default();

    let inputs = vec![
        machine(&s, "a", MachineStatus::Ready),
        machine(&s, "b", MachineStatus::Ready),
        machine(&s, "c", MachineStatus::InUse),
        machine(&s, "d", MachineStatus::Error),
    ];
    dao.create_multiple(conn, inputs, &[]).await.unwrap();
    dao.delete(conn, &"d".to_owned()).await.unwrap();

    let counts = dao
        .get_count_by_status(conn, &MachineFilter::default())
        .await
        .unwrap();
    assert_eq!(counts.total, 3);
    assert_eq!(counts.get(MachineStatus::Ready), 2);
    assert_eq!(counts.get(MachineStatus::InUse), 1);
    assert_eq!(counts.get(MachineStatus::Error), 0);
    assert_eq!(counts.by_status.len(), 8);
    assert_eq!(counts.by_status.get(&MachineStatus::Decommissioned), Some(&0));
}

#[tokio::test]
async fn sorting_by_site_name_loads_the_site() {
    let db = setup().await;
    let conn = db.conn();
    let s = seed(conn).await;
    let dao = MachineDao::default();

    dao.create(conn, machine(&s, "on-alpha", MachineStatus::Ready), &[])
        .await
        .unwrap();
    dao.create(
        conn,
        MachineCreateInput::new("on-beta", s.provider_b, s.site_b, MachineStatus::Ready),
        &[],
    )
    .await
    .unwrap();

    let page = dao
        .get_all(
            conn,
            &MachineFilter::default(),
            &PageRequest::default().order(OrderKey::desc("site_name")),
            &[],
        )
        .await
        .unwrap();
    let names: Vec<_> = page
        .items
        .iter()
        .map(|r| r.site.as_ref().map(|site| site.name.clone()))
        .collect();
    assert_eq!(
        names,
        vec![Some("site-beta".to_owned()), Some("site-alpha".to_owned())]
    );
    assert!(page.items.iter().all(|r| r.infrastructure_provider.is_none()));
}

#[tokio::test]
async fn unknown_sort_field_is_rejected() {
    let db = setup().await;
    let conn = db.conn();
    let dao = MachineDao::default();

    let err = dao
        .get_all(
            conn,
            &MachineFilter::default(),
            &PageRequest::default().order(OrderKey::asc("serial")),
            &[],
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DaoError::InvalidOrderBy { entity: "Machine", ref field } if field == "serial"));
}

#[tokio::test]
async fn boolean_and_list_filters() {
    let db = setup().await;
    let conn = db.conn();
    let s = seed(conn).await;
    let dao = MachineDao::default();

    let mut assigned = machine(&s, "busy", MachineStatus::InUse);
    assigned.is_assigned = true;
    assigned.hostname = Some("busy-host".to_owned());
    dao.create_multiple(
        conn,
        vec![assigned, machine(&s, "idle", MachineStatus::Ready)],
        &[],
    )
    .await
    .unwrap();

    let only_assigned = MachineFilter {
        is_assigned: Some(true),
        ..MachineFilter::default()
    };
    let page = dao
        .get_all(conn, &only_assigned, &PageRequest::default(), &[])
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].machine.id, "busy");

    let by_host = MachineFilter {
        hostnames: Some(vec!["busy-host".to_owned(), "nope".to_owned()]),
        ..MachineFilter::default()
    };
    assert_eq!(dao.get_count(conn, &by_host).await.unwrap(), 1);

    let nothing = MachineFilter {
        hostnames: Some(Vec::new()),
        ..MachineFilter::default()
    };
    assert_eq!(dao.get_count(conn, &nothing).await.unwrap(), 0);
    let page = dao
        .get_all(conn, &nothing, &PageRequest::default(), &[])
        .await
        .unwrap();
    assert!(page.items.is_empty());
    assert_eq!(page.total, 0);
}

#[tokio::test]
async fn search_falls_back_to_substring_match() {
    let db = setup().await;
    let conn = db.conn();
    let s = seed(conn).await;
    let dao = MachineDao::default();

    let mut tagged = machine(&s, "tagged", MachineStatus::Ready);
    tagged.hostname = Some("node-07".to_owned());
    tagged.labels = Some([("rack", "R42")].into_iter().collect::<Labels>());
    dao.create_multiple(conn, vec![tagged, machine(&s, "plain", MachineStatus::Ready)], &[])
        .await
        .unwrap();

    let search = |q: &str| MachineFilter {
        search: Some(q.to_owned()),
        ..MachineFilter::default()
    };
    // Punctuation only survives in the substring branch.
    assert_eq!(dao.get_count(conn, &search("de-0")).await.unwrap(), 1);
    // Labels are searched too, case-insensitively.
    assert_eq!(dao.get_count(conn, &search("r42")).await.unwrap(), 1);
    assert_eq!(dao.get_count(conn, &search("   ")).await.unwrap(), 2);
    assert_eq!(dao.get_count(conn, &search("100%")).await.unwrap(), 0);
}

#[tokio::test]
async fn clear_and_partial_update() {
    let db = setup().await;
    let conn = db.conn();
    let s = seed(conn).await;
    let dao = MachineDao::default();

    let mut input = machine(&s, "m-1", MachineStatus::Ready);
    input.vendor = Some("Contoso".to_owned());
    input.hostname = Some("host-1".to_owned());
    input.labels = Some([("k", "v")].into_iter().collect::<Labels>());
    let created = dao.create(conn, input, &[]).await.unwrap().machine;

    tick().await;
    let unchanged = dao
        .clear(
            conn,
            MachineClearInput {
                id: "m-1".to_owned(),
                ..MachineClearInput::default()
            },
            &[],
        )
        .await
        .unwrap()
        .machine;
    assert_eq!(unchanged, created);

    tick().await;
    let cleared = dao
        .clear(
            conn,
            MachineClearInput {
                id: "m-1".to_owned(),
                vendor: true,
                labels: true,
                ..MachineClearInput::default()
            },
            &[],
        )
        .await
        .unwrap()
        .machine;
    assert_eq!(cleared.vendor, None);
    assert_eq!(cleared.labels, None);
    assert_eq!(cleared.hostname.as_deref(), Some("host-1"));
    assert!(cleared.updated > created.updated);

    tick().await;
    let updated = dao
        .update(
            conn,
            MachineUpdateInput {
                id: "m-1".to_owned(),
                is_in_maintenance: Some(true),
                maintenance_message: Some("firmware".to_owned()),
                ..MachineUpdateInput::default()
            },
            &[],
        )
        .await
        .unwrap()
        .machine;
    assert!(updated.is_in_maintenance);
    assert_eq!(updated.maintenance_message.as_deref(), Some("firmware"));
    assert_eq!(updated.hostname, cleared.hostname);
    assert_eq!(updated.status, MachineStatus::Ready);
    assert_eq!(updated.created, created.created);
    assert!(updated.updated > cleared.updated);
}

#[test]
fn relation_names_parse() {
    assert_eq!("site".parse::<Relation>().unwrap(), Relation::Site);
    assert_eq!(
        "InfrastructureProvider".parse::<Relation>().unwrap(),
        Relation::InfrastructureProvider
    );
    assert!(matches!(
        "tenant".parse::<Relation>(),
        Err(DaoError::InvalidRelation { entity: "Machine", .. })
    ));
}
