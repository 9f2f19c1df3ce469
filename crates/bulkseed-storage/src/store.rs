use async_trait::async_trait;

use bulkseed_core::{JoinedOrder, OrderRecord, ProductRecord, Result, UserRecord};

/// Bulk sink for generated records.
///
/// Each `create_*` call is all-or-nothing for the slice it receives and, on
/// success, writes the storage-assigned identifiers back into the records.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Returns the engine identifier (e.g. `postgres`).
    fn engine(&self) -> &'static str;

    /// Create the tables and indexes if they do not exist yet.
    async fn migrate(&self) -> Result<()>;

    async fn create_users(&self, users: &mut [UserRecord]) -> Result<()>;

    async fn create_products(&self, products: &mut [ProductRecord]) -> Result<()>;

    async fn create_orders(&self, orders: &mut [OrderRecord]) -> Result<()>;

    /// Join an order with its user and product. `None` when any side is missing.
    async fn query_joined(&self, order_id: i64) -> Result<Option<JoinedOrder>>;
}
