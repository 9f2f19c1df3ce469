use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use bulkseed_core::{EntityKind, RecordCountPlan};

use crate::errors::GenerationError;

/// Options for the generation engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateOptions {
    /// Records per bulk insert.
    pub batch_size: u64,
    /// Maximum batches in flight.
    pub concurrency: usize,
    /// Run seed; a random one is drawn when absent.
    pub seed: Option<u64>,
    /// Completed batches between progress log lines.
    pub progress_every: u64,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            batch_size: 1_000,
            concurrency: default_concurrency(),
            seed: None,
            progress_every: 10,
        }
    }
}

/// Twice the available hardware parallelism.
pub fn default_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(|cores| cores.get() * 2)
        .unwrap_or(2)
}

/// A batch that did not make it into storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchFailure {
    pub index: u64,
    pub start: u64,
    pub len: u64,
    pub error: String,
}

/// Outcome of one entity kind's batches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSummary {
    pub kind: EntityKind,
    pub batches: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub records: u64,
    pub failures: Vec<BatchFailure>,
    #[serde(with = "duration_ms")]
    pub elapsed: Duration,
}

impl BatchSummary {
    pub fn is_complete(&self) -> bool {
        self.failed == 0
    }
}

/// Summary of a generated entity kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseReport {
    pub kind: EntityKind,
    pub requested: u64,
    pub inserted: u64,
    pub batches: u64,
    pub failed_batches: u64,
    pub duration_ms: u64,
    pub failures: Vec<BatchFailure>,
}

impl PhaseReport {
    pub fn from_summary(requested: u64, summary: BatchSummary) -> Self {
        Self {
            kind: summary.kind,
            requested,
            inserted: summary.records,
            batches: summary.batches,
            failed_batches: summary.failed,
            duration_ms: summary.elapsed.as_millis() as u64,
            failures: summary.failures,
        }
    }
}

/// Report for a generation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationReport {
    pub run_id: String,
    pub seed: u64,
    pub plan: RecordCountPlan,
    pub phases: Vec<PhaseReport>,
    pub duration_ms: u64,
    pub orphan_orders: u64,
}

impl GenerationReport {
    pub fn phase(&self, kind: EntityKind) -> Option<&PhaseReport> {
        self.phases.iter().find(|phase| phase.kind == kind)
    }

    pub fn inserted(&self, kind: EntityKind) -> u64 {
        self.phase(kind).map(|phase| phase.inserted).unwrap_or(0)
    }

    pub fn failed_batches(&self) -> u64 {
        self.phases.iter().map(|phase| phase.failed_batches).sum()
    }

    /// Write the report as pretty JSON.
    pub fn write_json(&self, path: &Path) -> Result<(), GenerationError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
