//! Concurrent bulk generation for bulkseed.
//!
//! The engine fills storage with users, products and orders in bounded
//! concurrent batches, wiring inserted parents into the orders phase through a
//! shared pool. The live feed then keeps inserting linked records on a fixed
//! interval until cancelled.

pub mod batch;
pub mod engine;
pub mod errors;
pub mod fields;
pub mod live;
pub mod model;
pub mod pool;

pub use batch::{BatchRange, BatchWorkerPool, split_batches};
pub use engine::GenerationEngine;
pub use errors::{GenerationError, LiveFeedError};
pub use fields::FieldGenerator;
pub use live::{DEFAULT_INTERVAL, FiringReport, LiveFeedScheduler, LiveFeedSummary};
pub use model::{
    BatchFailure, BatchSummary, GenerateOptions, GenerationReport, PhaseReport,
    default_concurrency,
};
pub use pool::{EntityPool, SharedEntityPool};
