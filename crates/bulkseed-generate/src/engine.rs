use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tokio::time::Instant;
use tracing::{info, warn};
use uuid::Uuid;

use bulkseed_core::{EntityKind, OrderRecord, ProductRecord, RecordCountPlan, UserRecord};
use bulkseed_storage::Storage;

use crate::batch::{BatchRange, BatchWorkerPool};
use crate::errors::GenerationError;
use crate::fields::FieldGenerator;
use crate::model::{GenerateOptions, GenerationReport, PhaseReport};
use crate::pool::SharedEntityPool;

/// Bulk generation engine: users, then products, then orders.
pub struct GenerationEngine {
    storage: Arc<dyn Storage>,
    options: GenerateOptions,
    run_id: String,
    seed: u64,
    fields: Arc<FieldGenerator>,
    pool: Arc<SharedEntityPool>,
}

impl GenerationEngine {
    pub fn new(storage: Arc<dyn Storage>, options: GenerateOptions) -> Self {
        Self::with_run_id(storage, options, Uuid::new_v4().to_string())
    }

    /// Engine bound to an externally allocated run id.
    pub fn with_run_id(
        storage: Arc<dyn Storage>,
        options: GenerateOptions,
        run_id: impl Into<String>,
    ) -> Self {
        let run_id = run_id.into();
        let seed = options.seed.unwrap_or_else(rand::random);
        let fields = FieldGenerator::new(run_tag(&run_id));
        Self {
            storage,
            options,
            run_id,
            seed,
            fields: Arc::new(fields),
            pool: Arc::new(SharedEntityPool::new()),
        }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn fields(&self) -> &FieldGenerator {
        &self.fields
    }

    pub fn pool(&self) -> &SharedEntityPool {
        &self.pool
    }

    /// Generate and insert every record of `plan`.
    ///
    /// Batch failures end up in the report; only an empty plan is an error.
    pub async fn run(&self, plan: &RecordCountPlan) -> Result<GenerationReport, GenerationError> {
        if plan.is_empty() {
            warn!(event = "generation_skipped", run_id = %self.run_id, "record count plan is empty");
            return Err(GenerationError::DegeneratePlan);
        }

        let started = Instant::now();
        info!(
            event = "generation_started",
            run_id = %self.run_id,
            users = plan.users,
            products = plan.products,
            orders = plan.orders,
            batch_size = self.options.batch_size,
            concurrency = self.options.concurrency,
            seed = self.seed,
            "generation started"
        );

        let workers = BatchWorkerPool::new(self.options.concurrency)
            .with_progress_every(self.options.progress_every);
        let orphans = Arc::new(AtomicU64::new(0));

        let mut phases = Vec::with_capacity(EntityKind::ALL.len());
        for kind in EntityKind::ALL {
            let requested = match kind {
                EntityKind::User => plan.users,
                EntityKind::Product => plan.products,
                EntityKind::Order => plan.orders,
            };
            phases.push(self.run_phase(&workers, kind, requested, &orphans).await);
        }

        let report = GenerationReport {
            run_id: self.run_id.clone(),
            seed: self.seed,
            plan: *plan,
            phases,
            duration_ms: started.elapsed().as_millis() as u64,
            orphan_orders: orphans.load(Ordering::Relaxed),
        };
        info!(
            event = "generation_finished",
            run_id = %self.run_id,
            users = report.inserted(EntityKind::User),
            products = report.inserted(EntityKind::Product),
            orders = report.inserted(EntityKind::Order),
            failed_batches = report.failed_batches(),
            orphan_orders = report.orphan_orders,
            duration_ms = report.duration_ms,
            "generation finished"
        );
        Ok(report)
    }

    async fn run_phase(
        &self,
        workers: &BatchWorkerPool,
        kind: EntityKind,
        requested: u64,
        orphans: &Arc<AtomicU64>,
    ) -> PhaseReport {
        info!(
            event = "phase_started",
            run_id = %self.run_id,
            kind = %kind,
            requested,
            "phase started"
        );

        let batch_size = self.options.batch_size;
        let seed = self.seed;
        let storage = Arc::clone(&self.storage);
        let pool = Arc::clone(&self.pool);
        let fields = Arc::clone(&self.fields);

        let summary = match kind {
            EntityKind::User => {
                workers
                    .run_batches(kind, requested, batch_size, move |range| {
                        let storage = Arc::clone(&storage);
                        let pool = Arc::clone(&pool);
                        let fields = Arc::clone(&fields);
                        async move {
                            let mut users: Vec<UserRecord> = {
                                let mut rng = batch_rng(seed, kind, range);
                                range
                                    .record_indices()
                                    .map(|index| fields.user(index, &mut rng))
                                    .collect()
                            };
                            storage.create_users(&mut users).await?;
                            let inserted = users.len() as u64;
                            pool.users.append(users);
                            Ok(inserted)
                        }
                    })
                    .await
            }
            EntityKind::Product => {
                workers
                    .run_batches(kind, requested, batch_size, move |range| {
                        let storage = Arc::clone(&storage);
                        let pool = Arc::clone(&pool);
                        let fields = Arc::clone(&fields);
                        async move {
                            let mut products: Vec<ProductRecord> = {
                                let mut rng = batch_rng(seed, kind, range);
                                range
                                    .record_indices()
                                    .map(|index| fields.product(index, &mut rng))
                                    .collect()
                            };
                            storage.create_products(&mut products).await?;
                            let inserted = products.len() as u64;
                            pool.products.append(products);
                            Ok(inserted)
                        }
                    })
                    .await
            }
            EntityKind::Order => {
                let orphans = Arc::clone(orphans);
                workers
                    .run_batches(kind, requested, batch_size, move |range| {
                        let storage = Arc::clone(&storage);
                        let pool = Arc::clone(&pool);
                        let fields = Arc::clone(&fields);
                        let orphans = Arc::clone(&orphans);
                        async move {
                            let mut orders: Vec<OrderRecord> = {
                                let mut rng = batch_rng(seed, kind, range);
                                range
                                    .record_indices()
                                    .map(|index| {
                                        let user = pool.users.sample(&mut rng);
                                        let product = pool.products.sample(&mut rng);
                                        fields.order(
                                            index,
                                            user.as_deref(),
                                            product.as_deref(),
                                            &mut rng,
                                        )
                                    })
                                    .collect()
                            };
                            let orphaned =
                                orders.iter().filter(|order| order.is_orphan()).count() as u64;
                            storage.create_orders(&mut orders).await?;
                            orphans.fetch_add(orphaned, Ordering::Relaxed);
                            Ok(orders.len() as u64)
                        }
                    })
                    .await
            }
        };

        let report = PhaseReport::from_summary(requested, summary);
        info!(
            event = "phase_finished",
            run_id = %self.run_id,
            kind = %kind,
            requested = report.requested,
            inserted = report.inserted,
            batches = report.batches,
            failed_batches = report.failed_batches,
            duration_ms = report.duration_ms,
            "phase finished"
        );
        report
    }
}

/// Short tag derived from the run id, embedded in unique columns.
fn run_tag(run_id: &str) -> String {
    let tag: String = run_id
        .chars()
        .filter(|ch| ch.is_ascii_alphanumeric())
        .take(8)
        .collect();
    if tag.is_empty() { "run".to_string() } else { tag }
}

fn batch_rng(seed: u64, kind: EntityKind, range: BatchRange) -> ChaCha8Rng {
    let key = format!("{}:{}", kind.as_str(), range.start);
    ChaCha8Rng::seed_from_u64(hash_seed(seed, &key))
}

fn hash_seed(seed: u64, key: &str) -> u64 {
    let mut hash = seed ^ 0xcbf29ce484222325;
    for byte in key.as_bytes() {
        hash ^= *byte as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}
