use std::time::Duration;

/// Options that control how storage connections are opened.
#[derive(Debug, Clone)]
pub struct StorageOptions {
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

impl Default for StorageOptions {
    fn default() -> Self {
        Self {
            max_connections: 16,
            acquire_timeout: Duration::from_secs(60),
        }
    }
}

/// Backends selectable through the connection string scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageEngine {
    Postgres,
    Memory,
}

impl StorageEngine {
    pub fn detect(conn: &str) -> Option<Self> {
        if conn.starts_with("postgres://") || conn.starts_with("postgresql://") {
            Some(Self::Postgres)
        } else if conn.starts_with("memory://") {
            Some(Self::Memory)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Postgres => "postgres",
            Self::Memory => "memory",
        }
    }
}
