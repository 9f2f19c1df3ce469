use thiserror::Error;

/// Core error type shared across bulkseed crates.
#[derive(Debug, Error)]
pub enum Error {
    /// Database error or storage failure.
    #[error("database error: {0}")]
    Db(String),
    /// Configuration could not be used as given.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// A row that was expected to exist is missing.
    #[error("not found: {0}")]
    NotFound(String),
    /// Catch-all error for unexpected failures.
    #[error("other error: {0}")]
    Other(String),
}

/// Convenience alias for results returned by bulkseed crates.
pub type Result<T> = std::result::Result<T, Error>;
