use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use bulkseed_core::{
    EntityKind, Error, JoinedOrder, OrderRecord, ProductRecord, Result, UserRecord,
};

use crate::store::Storage;

/// In-process storage with sequential identifiers.
///
/// Backs `memory://` runs and the test suites. Bulk inserts can be made to
/// fail on demand and to take a fixed amount of (tokio) time.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    state: Mutex<MemoryState>,
    failures: Vec<InjectedFailure>,
    latency: Option<Duration>,
    join_fault: Option<JoinFault>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

#[derive(Debug, Default)]
struct MemoryState {
    migrated: bool,
    users: BTreeMap<i64, UserRecord>,
    products: BTreeMap<i64, ProductRecord>,
    orders: BTreeMap<i64, OrderRecord>,
    next_ids: HashMap<EntityKind, i64>,
    create_calls: HashMap<EntityKind, u64>,
    joined_queries: Vec<i64>,
}

#[derive(Debug, Clone, Copy)]
struct InjectedFailure {
    kind: EntityKind,
    /// 1-based call number to fail; `None` fails every call.
    call: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum JoinFault {
    Error,
    Missing,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the `call`-th (1-based) bulk insert of `kind`.
    pub fn fail_call(mut self, kind: EntityKind, call: u64) -> Self {
        self.failures.push(InjectedFailure {
            kind,
            call: Some(call),
        });
        self
    }

    /// Fail every bulk insert of `kind`.
    pub fn fail_always(mut self, kind: EntityKind) -> Self {
        self.failures.push(InjectedFailure { kind, call: None });
        self
    }

    /// Sleep for `latency` inside every bulk insert.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Make every `query_joined` call return an error.
    pub fn fail_joins(mut self) -> Self {
        self.join_fault = Some(JoinFault::Error);
        self
    }

    /// Make every `query_joined` call find no row.
    pub fn miss_joins(mut self) -> Self {
        self.join_fault = Some(JoinFault::Missing);
        self
    }

    pub fn is_migrated(&self) -> bool {
        self.lock().migrated
    }

    pub fn users(&self) -> Vec<UserRecord> {
        self.lock().users.values().cloned().collect()
    }

    pub fn products(&self) -> Vec<ProductRecord> {
        self.lock().products.values().cloned().collect()
    }

    pub fn orders(&self) -> Vec<OrderRecord> {
        self.lock().orders.values().cloned().collect()
    }

    /// Number of bulk insert calls received for `kind`, failed ones included.
    pub fn create_calls(&self, kind: EntityKind) -> u64 {
        self.lock().create_calls.get(&kind).copied().unwrap_or(0)
    }

    /// Order ids passed to `query_joined`, in call order.
    pub fn joined_queries(&self) -> Vec<i64> {
        self.lock().joined_queries.clone()
    }

    /// Highest number of bulk inserts observed running at the same time.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Count the call and decide whether it should fail.
    fn admit(&self, kind: EntityKind, rows: usize) -> Result<()> {
        let call = {
            let mut state = self.lock();
            let calls = state.create_calls.entry(kind).or_insert(0);
            *calls += 1;
            *calls
        };
        let injected = self
            .failures
            .iter()
            .any(|failure| failure.kind == kind && failure.call.is_none_or(|n| n == call));
        if injected {
            return Err(Error::Db(format!(
                "injected failure on {kind} insert #{call} ({rows} rows)"
            )));
        }
        Ok(())
    }

    async fn simulate_latency(&self) {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(current, Ordering::SeqCst);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }

    fn insert_all<T: Clone>(
        &self,
        kind: EntityKind,
        rows: &mut [T],
        set_id: impl Fn(&mut T, i64),
        table: impl Fn(&mut MemoryState) -> &mut BTreeMap<i64, T>,
    ) {
        let mut state = self.lock();
        let mut next = state.next_ids.get(&kind).copied().unwrap_or(0);
        let mut inserted = Vec::with_capacity(rows.len());
        for row in rows.iter_mut() {
            next += 1;
            set_id(row, next);
            inserted.push((next, row.clone()));
        }
        state.next_ids.insert(kind, next);
        table(&mut *state).extend(inserted);
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    fn engine(&self) -> &'static str {
        "memory"
    }

    async fn migrate(&self) -> Result<()> {
        self.lock().migrated = true;
        Ok(())
    }

    async fn create_users(&self, users: &mut [UserRecord]) -> Result<()> {
        self.admit(EntityKind::User, users.len())?;
        self.simulate_latency().await;
        self.insert_all(EntityKind::User, users, |user, id| user.id = id, |state| {
            &mut state.users
        });
        Ok(())
    }

    async fn create_products(&self, products: &mut [ProductRecord]) -> Result<()> {
        self.admit(EntityKind::Product, products.len())?;
        self.simulate_latency().await;
        self.insert_all(
            EntityKind::Product,
            products,
            |product, id| product.id = id,
            |state| &mut state.products,
        );
        Ok(())
    }

    async fn create_orders(&self, orders: &mut [OrderRecord]) -> Result<()> {
        self.admit(EntityKind::Order, orders.len())?;
        self.simulate_latency().await;
        self.insert_all(EntityKind::Order, orders, |order, id| order.id = id, |state| {
            &mut state.orders
        });
        Ok(())
    }

    async fn query_joined(&self, order_id: i64) -> Result<Option<JoinedOrder>> {
        let mut state = self.lock();
        state.joined_queries.push(order_id);
        match self.join_fault {
            Some(JoinFault::Error) => {
                return Err(Error::Db(format!(
                    "injected failure on joined query for order {order_id}"
                )));
            }
            Some(JoinFault::Missing) => return Ok(None),
            None => {}
        }

        let Some(order) = state.orders.get(&order_id) else {
            return Ok(None);
        };
        let user = state.users.get(&order.user_id);
        let product = state.products.get(&order.product_id);

        Ok(match (user, product) {
            (Some(user), Some(product)) => Some(JoinedOrder {
                order_number: order.order_number.clone(),
                username: user.username.clone(),
                product_name: product.product_name.clone(),
                total_amount: order.total_amount,
            }),
            _ => None,
        })
    }
}
