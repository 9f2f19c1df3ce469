use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bulkseed_core::EntityKind;
use bulkseed_generate::{BatchWorkerPool, GenerationError};

#[tokio::test]
async fn dispatches_three_batches_for_any_concurrency() {
    for concurrency in [1, 2, 3, 8] {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let pool = BatchWorkerPool::new(concurrency);

        let summary = pool
            .run_batches(EntityKind::User, 2_500, 1_000, {
                let seen = Arc::clone(&seen);
                move |range| {
                    let seen = Arc::clone(&seen);
                    async move {
                        seen.lock().expect("seen lock").push((range.start, range.len));
                        Ok::<_, GenerationError>(range.len)
                    }
                }
            })
            .await;

        let mut seen = seen.lock().expect("seen lock").clone();
        seen.sort();
        assert_eq!(seen, vec![(0, 1_000), (1_000, 1_000), (2_000, 500)]);
        assert_eq!(summary.batches, 3);
        assert_eq!(summary.succeeded, 3);
        assert_eq!(summary.records, 2_500);
        assert!(summary.is_complete());
    }
}

#[tokio::test(start_paused = true)]
async fn in_flight_batches_never_exceed_limit() {
    let in_flight = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));
    let pool = BatchWorkerPool::new(3);

    let summary = pool
        .run_batches(EntityKind::Order, 20, 1, {
            let in_flight = Arc::clone(&in_flight);
            let peak = Arc::clone(&peak);
            move |range| {
                let in_flight = Arc::clone(&in_flight);
                let peak = Arc::clone(&peak);
                async move {
                    let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                    Ok::<_, GenerationError>(range.len)
                }
            }
        })
        .await;

    assert_eq!(summary.succeeded, 20);
    assert_eq!(peak.load(Ordering::SeqCst), 3);
    assert_eq!(in_flight.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn failed_batch_does_not_stop_siblings() {
    let pool = BatchWorkerPool::new(4);

    let summary = pool
        .run_batches(EntityKind::Product, 50, 10, |range| async move {
            if range.index == 1 {
                return Err(GenerationError::Storage(bulkseed_core::Error::Db(
                    "duplicate key".to_string(),
                )));
            }
            Ok(range.len)
        })
        .await;

    assert_eq!(summary.batches, 5);
    assert_eq!(summary.succeeded, 4);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.records, 40);
    assert_eq!(summary.failures.len(), 1);
    let failure = &summary.failures[0];
    assert_eq!((failure.index, failure.start, failure.len), (1, 10, 10));
    assert!(failure.error.contains("duplicate key"));
}

#[tokio::test]
async fn panicking_batch_is_recorded_as_failure() {
    let pool = BatchWorkerPool::new(2);

    let summary = pool
        .run_batches(EntityKind::User, 3, 1, |range| async move {
            if range.index == 2 {
                panic!("generator exploded");
            }
            Ok::<_, GenerationError>(range.len)
        })
        .await;

    assert_eq!(summary.succeeded, 2);
    assert_eq!(summary.failed, 1);
    assert!(summary.failures[0].error.contains("generator exploded"));
}

#[tokio::test]
async fn empty_total_runs_nothing() {
    let pool = BatchWorkerPool::new(2);
    let summary = pool
        .run_batches(EntityKind::User, 0, 1_000, |range| async move {
            Ok::<_, GenerationError>(range.len)
        })
        .await;
    assert_eq!(summary.batches, 0);
    assert_eq!(summary.records, 0);
}
