//! Storage backends for generated records.

pub mod memory;
pub mod options;
pub mod postgres;
pub mod store;

use std::sync::Arc;

pub use memory::MemoryStorage;
pub use options::{StorageEngine, StorageOptions};
pub use postgres::PostgresStorage;
pub use store::Storage;

use bulkseed_core::{Error, Result};

/// Open the backend selected by the connection string scheme.
pub async fn connect(conn: &str, options: &StorageOptions) -> Result<Arc<dyn Storage>> {
    let engine = StorageEngine::detect(conn)
        .ok_or_else(|| Error::InvalidConfig("unsupported connection scheme".to_string()))?;

    let storage: Arc<dyn Storage> = match engine {
        StorageEngine::Postgres => Arc::new(PostgresStorage::connect(conn, options).await?),
        StorageEngine::Memory => Arc::new(MemoryStorage::new()),
    };
    Ok(storage)
}
