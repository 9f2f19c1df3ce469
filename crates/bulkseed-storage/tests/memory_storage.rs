mod common;

use bulkseed_core::{EntityKind, Error};
use bulkseed_storage::{MemoryStorage, Storage};

#[tokio::test]
async fn assigns_sequential_ids_per_kind() {
    let storage = MemoryStorage::new();
    let mut users = vec![common::user(1, "t"), common::user(2, "t")];
    let mut products = vec![common::product(1, "t")];

    storage.create_users(&mut users).await.expect("insert users");
    storage.create_products(&mut products).await.expect("insert products");

    assert_eq!(users.iter().map(|u| u.id).collect::<Vec<_>>(), vec![1, 2]);
    assert_eq!(products[0].id, 1);
    assert_eq!(storage.users().len(), 2);
}

#[tokio::test]
async fn injected_failure_rejects_whole_batch() {
    let storage = MemoryStorage::new().fail_call(EntityKind::User, 2);
    let mut first = vec![common::user(1, "t")];
    let mut second = vec![common::user(2, "t"), common::user(3, "t")];
    let mut third = vec![common::user(4, "t")];

    storage.create_users(&mut first).await.expect("first insert");
    let err = storage.create_users(&mut second).await;
    storage.create_users(&mut third).await.expect("third insert");

    assert!(matches!(err, Err(Error::Db(_))));
    assert!(second.iter().all(|u| u.id == 0), "failed batch keeps zero ids");
    assert_eq!(storage.users().len(), 2);
    assert_eq!(storage.create_calls(EntityKind::User), 3);
}

#[tokio::test]
async fn joined_query_requires_both_parents() {
    let storage = MemoryStorage::new();
    let mut users = vec![common::user(1, "t")];
    let mut products = vec![common::product(1, "t")];
    storage.create_users(&mut users).await.expect("insert user");
    storage.create_products(&mut products).await.expect("insert product");

    let mut orders = vec![
        common::order(1, "t", users[0].id, products[0].id),
        common::orphan_order(2, "t"),
    ];
    storage.create_orders(&mut orders).await.expect("insert orders");

    let joined = storage
        .query_joined(orders[0].id)
        .await
        .expect("query")
        .expect("joined row");
    assert_eq!(joined.username, "user1");
    assert_eq!(joined.product_name, "Lamp 1");
    assert_eq!(joined.order_number, orders[0].order_number);

    assert!(storage.query_joined(orders[1].id).await.expect("query").is_none());
    assert!(storage.query_joined(999).await.expect("query").is_none());
    assert_eq!(storage.joined_queries(), vec![orders[0].id, orders[1].id, 999]);
}

#[tokio::test]
async fn migrate_marks_schema_ready() {
    let storage = MemoryStorage::new();
    assert!(!storage.is_migrated());
    storage.migrate().await.expect("migrate");
    assert!(storage.is_migrated());
    assert_eq!(storage.engine(), "memory");
}
