//! Low-frequency live feed that runs after the bulk phase.
//!
//! Every firing inserts one user, one product and one order linking them, then
//! reads the order back through the join so the references are verified
//! end to end. Firings run on their own tasks and may overlap.

use std::slice;
use std::sync::Arc;
use std::time::Duration;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use tokio::task::JoinSet;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use bulkseed_core::{EntityKind, JoinedOrder};
use bulkseed_storage::Storage;

use crate::errors::LiveFeedError;
use crate::fields::FieldGenerator;

pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(30);

const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Result of a successful firing.
#[derive(Debug, Clone, Serialize)]
pub struct FiringReport {
    pub firing: u64,
    pub order_id: i64,
    pub joined: JoinedOrder,
    /// Time since the run started.
    pub elapsed: Duration,
}

/// Counts of a scheduler run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LiveFeedSummary {
    pub fired: u64,
    pub succeeded: u64,
    pub failed: u64,
}

#[derive(Clone)]
pub struct LiveFeedScheduler {
    inner: Arc<FeedInner>,
}

struct FeedInner {
    storage: Arc<dyn Storage>,
    fields: FieldGenerator,
    interval: Duration,
    started_at: Instant,
}

impl LiveFeedScheduler {
    pub fn new(
        storage: Arc<dyn Storage>,
        fields: FieldGenerator,
        interval: Duration,
        started_at: Instant,
    ) -> Self {
        Self {
            inner: Arc::new(FeedInner {
                storage,
                fields,
                interval,
                started_at,
            }),
        }
    }

    pub fn interval(&self) -> Duration {
        self.inner.interval
    }

    /// Fire every interval until `cancel` is triggered, then wait for
    /// in-flight firings. The first firing happens one interval after start.
    pub async fn run(&self, cancel: CancellationToken) -> LiveFeedSummary {
        let period = self.inner.interval.max(MIN_INTERVAL);
        let mut ticker = time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            event = "live_feed_started",
            interval_ms = period.as_millis() as u64,
            "live feed started"
        );

        let mut summary = LiveFeedSummary::default();
        let mut firings = JoinSet::new();
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    summary.fired += 1;
                    let firing = summary.fired;
                    let inner = Arc::clone(&self.inner);
                    firings.spawn(async move { inner.fire_logged(firing).await });
                }
            }
            while let Some(done) = firings.try_join_next() {
                tally(&mut summary, done);
            }
        }

        while let Some(done) = firings.join_next().await {
            tally(&mut summary, done);
        }
        info!(
            event = "live_feed_stopped",
            fired = summary.fired,
            succeeded = summary.succeeded,
            failed = summary.failed,
            "live feed stopped"
        );
        summary
    }

    /// Run a single firing.
    pub async fn fire(&self, firing: u64) -> Result<FiringReport, LiveFeedError> {
        self.inner.fire(firing).await
    }
}

impl FeedInner {
    async fn fire(&self, firing: u64) -> Result<FiringReport, LiveFeedError> {
        let mut rng = ChaCha8Rng::seed_from_u64(rand::random());

        let mut user = self.fields.user(firing, &mut rng);
        self.storage
            .create_users(slice::from_mut(&mut user))
            .await
            .map_err(|source| LiveFeedError::Insert {
                kind: EntityKind::User,
                source,
            })?;

        let mut product = self.fields.product(firing, &mut rng);
        self.storage
            .create_products(slice::from_mut(&mut product))
            .await
            .map_err(|source| LiveFeedError::Insert {
                kind: EntityKind::Product,
                source,
            })?;

        let mut order = self
            .fields
            .order(firing, Some(&user), Some(&product), &mut rng);
        self.storage
            .create_orders(slice::from_mut(&mut order))
            .await
            .map_err(|source| LiveFeedError::Insert {
                kind: EntityKind::Order,
                source,
            })?;

        let joined = self
            .storage
            .query_joined(order.id)
            .await
            .map_err(LiveFeedError::Query)?
            .ok_or(LiveFeedError::NotFound(order.id))?;

        Ok(FiringReport {
            firing,
            order_id: order.id,
            joined,
            elapsed: self.started_at.elapsed(),
        })
    }

    async fn fire_logged(&self, firing: u64) -> bool {
        match self.fire(firing).await {
            Ok(report) => {
                info!(
                    event = "firing_succeeded",
                    firing,
                    order_id = report.order_id,
                    order_number = %report.joined.order_number,
                    username = %report.joined.username,
                    product_name = %report.joined.product_name,
                    total_amount = report.joined.total_amount,
                    elapsed_ms = report.elapsed.as_millis() as u64,
                    "live record joined"
                );
                true
            }
            Err(err) => {
                warn!(
                    event = "firing_failed",
                    firing,
                    step = err.step(),
                    error = %err,
                    "live firing failed"
                );
                false
            }
        }
    }
}

fn tally(summary: &mut LiveFeedSummary, done: Result<bool, tokio::task::JoinError>) {
    match done {
        Ok(true) => summary.succeeded += 1,
        Ok(false) => summary.failed += 1,
        Err(err) => {
            summary.failed += 1;
            warn!(event = "firing_failed", step = "task", error = %err, "live firing task aborted");
        }
    }
}
