//! Core contracts shared by the bulkseed crates.
//!
//! Defines the generated record types, the record-count plan derived from a
//! storage budget, the shared error type, and connection-string redaction.

pub mod error;
pub mod plan;
pub mod records;
pub mod redaction;

pub use error::{Error, Result};
pub use plan::{PopulationRatio, RecordCountPlan, RowSizes, gib_to_bytes};
pub use records::{EntityKind, JoinedOrder, NO_PARENT, OrderRecord, ProductRecord, UserRecord};
pub use redaction::{RedactedConnection, redact_connection_string};
