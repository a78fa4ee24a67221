#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use fleet_db::{Dao, DaoError, PageRequest};
use fleet_inventory::ProviderQueries;
use fleet_inventory::dao::{
    InfrastructureProviderClearInput, InfrastructureProviderCreateInput,
    InfrastructureProviderDao, InfrastructureProviderFilter,
};
use fleet_inventory::entity::infrastructure_provider::Relation;
use uuid::Uuid;

use common::{setup, tick};

fn provider(name: &str, org: &str) -> InfrastructureProviderCreateInput {
    InfrastructureProviderCreateInput {
        name: name.to_owned(),
        display_name: Some(format!("{name} Inc.")),
        org: org.to_owned(),
        org_display_name: Some(org.to_uppercase()),
        created_by: Uuid::new_v4(),
    }
}

#[tokio::test]
async fn lookup_by_org_skips_deleted_providers() {
    let db = setup().await;
    let conn = db.conn();
    let dao = InfrastructureProviderDao::default();

    let old = dao.create(conn, provider("old", "acme"), &[]).await.unwrap();
    tick().await;
    let new = dao.create(conn, provider("new", "acme"), &[]).await.unwrap();
    dao.create(conn, provider("other", "globex"), &[]).await.unwrap();

    let found = dao.get_by_org(conn, "acme").await.unwrap();
    assert_eq!(found.infrastructure_provider.id, old.infrastructure_provider.id);

    dao.delete(conn, &old.infrastructure_provider.id).await.unwrap();
    let found = dao.get_by_org(conn, "acme").await.unwrap();
    assert_eq!(found.infrastructure_provider.id, new.infrastructure_provider.id);

    let err = dao.get_by_org(conn, "initech").await.unwrap_err();
    assert!(matches!(err, DaoError::NotFound { entity: "InfrastructureProvider", .. }));
}

#[tokio::test]
async fn display_names_clear_and_search() {
    let db = setup().await;
    let conn = db.conn();
    let dao = InfrastructureProviderDao::default();

    let created = dao
        .create(conn, provider("hyperscale", "acme"), &[])
        .await
        .unwrap()
        .infrastructure_provider;

    let search = InfrastructureProviderFilter {
        search: Some("SCALE inc".to_owned()),
        ..InfrastructureProviderFilter::default()
    };
    assert_eq!(dao.get_count(conn, &search).await.unwrap(), 1);

    let cleared = dao
        .clear(
            conn,
            InfrastructureProviderClearInput {
                id: created.id,
                display_name: true,
                org_display_name: false,
            },
            &[],
        )
        .await
        .unwrap()
        .infrastructure_provider;
    assert_eq!(cleared.display_name, None);
    assert_eq!(cleared.org_display_name.as_deref(), Some("ACME"));
    assert_eq!(dao.get_count(conn, &search).await.unwrap(), 0);

    let page = dao
        .get_all(
            conn,
            &InfrastructureProviderFilter {
                orgs: Some(vec!["acme".to_owned()]),
                ..InfrastructureProviderFilter::default()
            },
            &PageRequest::default().limit(5000),
            &[],
        )
        .await
        .unwrap();
    assert_eq!(page.limit, 1000);
    assert_eq!(page.total, 1);

    let zero = dao
        .get_all(
            conn,
            &InfrastructureProviderFilter::default(),
            &PageRequest::default().limit(0),
            &[],
        )
        .await
        .unwrap_err();
    assert!(matches!(zero, DaoError::InvalidLimit));

    assert!("site".parse::<Relation>().is_err());
}
