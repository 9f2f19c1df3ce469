mod common;

use std::env;

use anyhow::{Context, Result, anyhow};
use bulkseed_storage::{PostgresStorage, Storage, StorageOptions};

/// Returns `None` when no database is configured, so the suite can run offline.
fn database_url() -> Option<String> {
    env::var("TEST_DATABASE_URL").ok()
}

fn run_tag() -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos())
        .unwrap_or_default();
    format!("it{nanos}")
}

#[tokio::test]
async fn bulk_inserts_and_joins_against_postgres() -> Result<()> {
    let Some(db_url) = database_url() else {
        eprintln!("TEST_DATABASE_URL not set; skipping postgres integration test");
        return Ok(());
    };

    let storage = PostgresStorage::connect(&db_url, &StorageOptions::default())
        .await
        .context("connecting to Postgres")?;
    storage.migrate().await.context("applying migrations")?;
    storage.migrate().await.context("migrations are idempotent")?;

    let tag = run_tag();
    let mut users: Vec<_> = (1..=3).map(|i| common::user(i, &tag)).collect();
    let mut products: Vec<_> = (1..=2).map(|i| common::product(i, &tag)).collect();
    storage.create_users(&mut users).await?;
    storage.create_products(&mut products).await?;

    assert!(users.iter().all(|user| user.id > 0), "ids assigned to users");
    assert!(products.iter().all(|product| product.id > 0), "ids assigned to products");

    let mut orders = vec![
        common::order(1, &tag, users[2].id, products[1].id),
        common::orphan_order(2, &tag),
    ];
    storage.create_orders(&mut orders).await?;

    let joined = storage
        .query_joined(orders[0].id)
        .await?
        .ok_or_else(|| anyhow!("expected joined row for order {}", orders[0].id))?;
    assert_eq!(joined.username, users[2].username);
    assert_eq!(joined.product_name, products[1].product_name);
    assert_eq!(joined.order_number, orders[0].order_number);

    assert!(
        storage.query_joined(orders[1].id).await?.is_none(),
        "orders without parents do not join"
    );

    Ok(())
}

#[tokio::test]
async fn duplicate_batch_fails_as_a_whole() -> Result<()> {
    let Some(db_url) = database_url() else {
        return Ok(());
    };

    let storage = PostgresStorage::connect(&db_url, &StorageOptions::default()).await?;
    storage.migrate().await?;

    let tag = run_tag();
    let mut first = vec![common::user(1, &tag)];
    storage.create_users(&mut first).await?;

    let mut batch = vec![common::user(2, &tag), common::user(1, &tag)];
    let result = storage.create_users(&mut batch).await;
    assert!(result.is_err(), "unique email violation rejects the batch");

    let count: i64 = sqlx::query_scalar("select count(*) from users where email like $1")
        .bind(format!("%.{tag}@example.com"))
        .fetch_one(storage.pool())
        .await?;
    assert_eq!(count, 1, "no row of the failed batch was committed");

    Ok(())
}
