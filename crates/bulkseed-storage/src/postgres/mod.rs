use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

use bulkseed_core::{JoinedOrder, OrderRecord, ProductRecord, Result, UserRecord};

use crate::options::StorageOptions;
use crate::store::Storage;

mod queries;

pub use queries::MIGRATIONS;

use queries::db_error;

/// Storage backed by a PostgreSQL connection pool.
#[derive(Debug, Clone)]
pub struct PostgresStorage {
    pool: PgPool,
}

impl PostgresStorage {
    /// Create storage using a pre-configured pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a pool sized for the bulk writers.
    pub async fn connect(conn: &str, options: &StorageOptions) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(options.max_connections.max(1))
            .acquire_timeout(options.acquire_timeout)
            .connect(conn)
            .await
            .map_err(db_error)?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Storage for PostgresStorage {
    fn engine(&self) -> &'static str {
        "postgres"
    }

    async fn migrate(&self) -> Result<()> {
        queries::apply_migrations(&self.pool).await?;
        info!(event = "schema_migrated", engine = "postgres", statements = MIGRATIONS.len());
        Ok(())
    }

    async fn create_users(&self, users: &mut [UserRecord]) -> Result<()> {
        if users.is_empty() {
            return Ok(());
        }
        let mut tx = self.pool.begin().await.map_err(db_error)?;
        queries::insert_users(&mut *tx, users).await?;
        tx.commit().await.map_err(db_error)
    }

    async fn create_products(&self, products: &mut [ProductRecord]) -> Result<()> {
        if products.is_empty() {
            return Ok(());
        }
        let mut tx = self.pool.begin().await.map_err(db_error)?;
        queries::insert_products(&mut *tx, products).await?;
        tx.commit().await.map_err(db_error)
    }

    async fn create_orders(&self, orders: &mut [OrderRecord]) -> Result<()> {
        if orders.is_empty() {
            return Ok(());
        }
        let mut tx = self.pool.begin().await.map_err(db_error)?;
        queries::insert_orders(&mut *tx, orders).await?;
        tx.commit().await.map_err(db_error)
    }

    async fn query_joined(&self, order_id: i64) -> Result<Option<JoinedOrder>> {
        queries::fetch_joined_order(&self.pool, order_id).await
    }
}
