use std::any::Any;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use tokio::time::Instant;
use tracing::{info, warn};

use bulkseed_core::EntityKind;

use crate::errors::GenerationError;
use crate::model::{BatchFailure, BatchSummary};

/// Contiguous slice `[start, start + len)` of a phase's records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchRange {
    pub index: u64,
    pub start: u64,
    pub len: u64,
}

impl BatchRange {
    /// 1-based record indices covered by the batch.
    pub fn record_indices(&self) -> std::ops::RangeInclusive<u64> {
        (self.start + 1)..=(self.start + self.len)
    }
}

/// Split `total` records into batches of `batch_size` (the last one shorter).
pub fn split_batches(total: u64, batch_size: u64) -> impl Iterator<Item = BatchRange> {
    let batch_size = batch_size.max(1);
    (0..total.div_ceil(batch_size)).map(move |index| {
        let start = index * batch_size;
        BatchRange {
            index,
            start,
            len: batch_size.min(total - start),
        }
    })
}

/// Runs batches as tokio tasks under a fixed concurrency ceiling.
#[derive(Debug, Clone)]
pub struct BatchWorkerPool {
    concurrency: usize,
    progress_every: u64,
}

impl BatchWorkerPool {
    pub fn new(concurrency: usize) -> Self {
        Self {
            concurrency: concurrency.max(1),
            progress_every: 10,
        }
    }

    /// Emit a progress line every `every` completed batches.
    pub fn with_progress_every(mut self, every: u64) -> Self {
        self.progress_every = every.max(1);
        self
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Run `task` for every batch of `total` records and wait for all of them.
    ///
    /// A permit is acquired before each spawn, so at most `concurrency`
    /// batches are in flight. Failed or panicking batches are recorded in the
    /// summary and never stop their siblings.
    pub async fn run_batches<F, Fut>(
        &self,
        kind: EntityKind,
        total: u64,
        batch_size: u64,
        task: F,
    ) -> BatchSummary
    where
        F: Fn(BatchRange) -> Fut,
        Fut: Future<Output = Result<u64, GenerationError>> + Send + 'static,
    {
        let started = Instant::now();
        let gate = Arc::new(Semaphore::new(self.concurrency));
        let batches = total.div_ceil(batch_size.max(1));
        let progress = Arc::new(Mutex::new(BatchProgress::new(
            kind,
            batches,
            self.progress_every,
        )));
        let mut summary = BatchSummary {
            kind,
            batches,
            succeeded: 0,
            failed: 0,
            records: 0,
            failures: Vec::new(),
            elapsed: Default::default(),
        };
        let mut in_flight = JoinSet::new();

        for range in split_batches(total, batch_size) {
            let permit = match Arc::clone(&gate).acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => break,
            };
            let work = task(range);
            let progress = Arc::clone(&progress);
            in_flight.spawn(async move {
                let outcome = match tokio::spawn(work).await {
                    Ok(Ok(records)) => Ok(records),
                    Ok(Err(err)) => Err(err.to_string()),
                    Err(err) => Err(GenerationError::Join(join_failure(err)).to_string()),
                };
                drop(permit);
                progress
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .record(range, &outcome);
                (range, outcome)
            });
            while let Some(joined) = in_flight.try_join_next() {
                absorb(&mut summary, joined);
            }
        }

        while let Some(joined) = in_flight.join_next().await {
            absorb(&mut summary, joined);
        }
        summary.failures.sort_by_key(|failure| failure.index);
        summary.elapsed = started.elapsed();

        info!(
            event = "batches_completed",
            kind = %kind,
            batches = summary.batches,
            succeeded = summary.succeeded,
            failed = summary.failed,
            records = summary.records,
            duration_ms = summary.elapsed.as_millis() as u64,
            "batches completed"
        );
        summary
    }
}

#[derive(Debug)]
struct BatchProgress {
    kind: EntityKind,
    total: u64,
    every: u64,
    completed: u64,
    failed: u64,
    records: u64,
}

impl BatchProgress {
    fn new(kind: EntityKind, total: u64, every: u64) -> Self {
        Self {
            kind,
            total,
            every,
            completed: 0,
            failed: 0,
            records: 0,
        }
    }

    fn record(&mut self, range: BatchRange, outcome: &Result<u64, String>) {
        self.completed += 1;
        match outcome {
            Ok(records) => self.records += records,
            Err(error) => {
                self.failed += 1;
                warn!(
                    event = "batch_failed",
                    kind = %self.kind,
                    batch = range.index,
                    start = range.start,
                    len = range.len,
                    error = %error,
                    "batch failed"
                );
            }
        }
        if self.completed % self.every == 0 || self.completed == self.total {
            info!(
                event = "batch_progress",
                kind = %self.kind,
                completed = self.completed,
                total = self.total,
                failed = self.failed,
                records = self.records,
                "batch progress"
            );
        }
    }
}

type BatchOutcome = (BatchRange, Result<u64, String>);

fn absorb(summary: &mut BatchSummary, joined: Result<BatchOutcome, JoinError>) {
    match joined {
        Ok((_, Ok(records))) => {
            summary.succeeded += 1;
            summary.records += records;
        }
        Ok((range, Err(error))) => {
            summary.failed += 1;
            summary.failures.push(BatchFailure {
                index: range.index,
                start: range.start,
                len: range.len,
                error,
            });
        }
        Err(err) => {
            summary.failed += 1;
            warn!(
                event = "batch_failed",
                kind = %summary.kind,
                error = %err,
                "batch bookkeeping failed"
            );
        }
    }
}

fn join_failure(err: JoinError) -> String {
    if err.is_panic() {
        format!("panicked: {}", panic_message(err.into_panic()))
    } else {
        err.to_string()
    }
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "panic during generation".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(index: u64, start: u64, len: u64) -> BatchRange {
        BatchRange { index, start, len }
    }

    #[test]
    fn splits_with_truncated_tail() {
        let ranges: Vec<_> = split_batches(2_500, 1_000).collect();
        assert_eq!(
            ranges,
            vec![
                range(0, 0, 1_000),
                range(1, 1_000, 1_000),
                range(2, 2_000, 500),
            ]
        );
        assert_eq!(ranges[2].record_indices(), 2_001..=2_500);
    }

    #[test]
    fn zero_batch_size_is_treated_as_one() {
        assert_eq!(split_batches(3, 0).count(), 3);
        assert_eq!(split_batches(0, 100).count(), 0);
    }

    #[test]
    fn zero_concurrency_is_clamped() {
        assert_eq!(BatchWorkerPool::new(0).concurrency(), 1);
    }

    #[test]
    fn panic_payloads_become_messages() {
        assert_eq!(panic_message(Box::new("boom")), "boom");
        assert_eq!(panic_message(Box::new(String::from("bang"))), "bang");
        assert_eq!(panic_message(Box::new(7_u8)), "panic during generation");
    }
}
