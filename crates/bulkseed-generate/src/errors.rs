use thiserror::Error;

use bulkseed_core::EntityKind;

/// Errors emitted by the generation engine.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("record count plan is empty; nothing to generate")]
    DegeneratePlan,
    #[error("storage error: {0}")]
    Storage(#[from] bulkseed_core::Error),
    #[error("batch task failed: {0}")]
    Join(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failure of a single live-feed firing.
#[derive(Debug, Error)]
pub enum LiveFeedError {
    #[error("inserting {kind} failed: {source}")]
    Insert {
        kind: EntityKind,
        #[source]
        source: bulkseed_core::Error,
    },
    #[error("join read-back failed: {0}")]
    Query(#[source] bulkseed_core::Error),
    #[error("order {0} has no joined row")]
    NotFound(i64),
}

impl LiveFeedError {
    /// Step of the firing that failed, for logs.
    pub fn step(&self) -> &'static str {
        match self {
            LiveFeedError::Insert { kind, .. } => match kind {
                EntityKind::User => "insert_user",
                EntityKind::Product => "insert_product",
                EntityKind::Order => "insert_order",
            },
            LiveFeedError::Query(_) | LiveFeedError::NotFound(_) => "query_joined",
        }
    }
}
