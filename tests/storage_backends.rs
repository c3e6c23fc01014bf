//! Round trips through the real backends. Skipped unless `TEST_MONGODB_URL` or
//! `TEST_DATABASE_URL` point at a disposable server.

use std::time::Duration;

use product_catalog_api::{
    db::{create_orm_conn, connect_mongo},
    models::{NewProduct, ProductChanges},
    storage::{MongoProductStore, PgProductStore, ProductStore},
};

fn widget() -> NewProduct {
    NewProduct {
        name: "Widget".into(),
        quantity: 2,
        price: 5.0,
        img: None,
    }
}

async fn exercise(store: &dyn ProductStore) {
    store.ping().await.expect("ping");

    let created = store.insert(widget()).await.expect("insert");
    assert!(!created.id.is_empty());
    assert_eq!(created.created_at, created.updated_at);

    let fetched = store.find_by_id(&created.id).await.expect("find");
    assert_eq!(fetched.as_ref().map(|p| &p.name), Some(&created.name));

    tokio::time::sleep(Duration::from_millis(10)).await;
    let updated = store
        .update_by_id(
            &created.id,
            ProductChanges {
                price: Some(9.99),
                ..Default::default()
            },
        )
        .await
        .expect("update")
        .expect("record exists");
    assert_eq!(updated.price, 9.99);
    assert_eq!(updated.quantity, 2);
    assert!(updated.updated_at > created.updated_at);

    let listed = store.find_all().await.expect("list");
    assert!(listed.iter().any(|p| p.id == created.id));

    let deleted = store
        .delete_by_id(&created.id)
        .await
        .expect("delete")
        .expect("record exists");
    assert_eq!(deleted.id, created.id);
    assert!(store.find_by_id(&created.id).await.expect("find").is_none());
    assert!(store.delete_by_id(&created.id).await.expect("delete").is_none());
}

#[tokio::test]
async fn mongodb_round_trip() {
    let Ok(url) = std::env::var("TEST_MONGODB_URL") else {
        eprintln!("skipping: TEST_MONGODB_URL not set");
        return;
    };

    let db = connect_mongo(&url, None).await.expect("client");
    let collection = format!("products_test_{}", uuid::Uuid::new_v4().simple());
    let store = MongoProductStore::with_collection(&db, &collection);

    exercise(&store).await;

    let malformed = store.find_by_id("not-an-object-id").await;
    assert!(malformed.is_err());

    db.collection::<mongodb::bson::Document>(&collection)
        .drop()
        .await
        .expect("drop test collection");
}

#[tokio::test]
async fn postgres_round_trip() {
    let Ok(url) = std::env::var("TEST_DATABASE_URL") else {
        eprintln!("skipping: TEST_DATABASE_URL not set");
        return;
    };

    let conn = create_orm_conn(&url).await.expect("connection");
    let store = PgProductStore::new(conn);

    exercise(&store).await;
}
