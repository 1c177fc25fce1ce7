//! # Pickup Point Testing
//!
//! Test doubles for the pickup-point engine: an in-memory repository, a
//! controllable clock, a recording metrics port and a capturing event sink.
//! The engine behavior suite under `tests/` runs entirely on these doubles;
//! the Postgres repository has its own container-backed tests.

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Duration, Utc};
use pickup_point_core::environment::Clock;
use pickup_point_core::error::StoreError;
use pickup_point_core::event::{CommandEvent, EventSink};
use pickup_point_core::metrics::LifecycleMetrics;
use pickup_point_core::order::{Order, OrderId, UserId};
use pickup_point_core::packaging::Packaging;
use pickup_point_core::repository::OrderRepository;

/// A clock whose time only moves when the test says so.
#[derive(Debug, Clone)]
pub struct TestClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl TestClock {
    /// Create a clock frozen at the given instant.
    #[must_use]
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(now)),
        }
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        let mut now = lock(&self.now);
        *now += by;
    }

    /// Jump the clock to an absolute instant.
    pub fn set(&self, to: DateTime<Utc>) {
        *lock(&self.now) = to;
    }
}

impl Clock for TestClock {
    fn now(&self) -> DateTime<Utc> {
        *lock(&self.now)
    }
}

/// In-memory [`OrderRepository`] mirroring the Postgres implementation's
/// observable behavior: updates and deletes of absent rows succeed
/// silently, duplicate inserts fail with a rolled-back store error, and
/// `mark_issued` stamps `issued_at` from the repository's own clock.
#[derive(Clone)]
pub struct InMemoryOrderRepository {
    clock: TestClock,
    orders: Arc<Mutex<HashMap<OrderId, Order>>>,
    packaging: Arc<Mutex<HashMap<OrderId, Packaging>>>,
    failures: Arc<Mutex<VecDeque<StoreError>>>,
}

impl InMemoryOrderRepository {
    /// Create an empty repository stamping writes from `clock`.
    #[must_use]
    pub fn new(clock: TestClock) -> Self {
        Self {
            clock,
            orders: Arc::new(Mutex::new(HashMap::new())),
            packaging: Arc::new(Mutex::new(HashMap::new())),
            failures: Arc::new(Mutex::new(VecDeque::new())),
        }
    }

    /// Queue an error; each repository call consumes one queued error
    /// before touching its data.
    pub fn fail_next_with(&self, error: StoreError) {
        lock(&self.failures).push_back(error);
    }

    /// Whether a record exists for `order_id`.
    #[must_use]
    pub fn contains(&self, order_id: OrderId) -> bool {
        lock(&self.orders).contains_key(&order_id)
    }

    /// Snapshot of the stored record for `order_id`.
    #[must_use]
    pub fn stored(&self, order_id: OrderId) -> Option<Order> {
        lock(&self.orders).get(&order_id).cloned()
    }

    /// The packaging recorded at acceptance for `order_id`.
    #[must_use]
    pub fn stored_packaging(&self, order_id: OrderId) -> Option<Packaging> {
        lock(&self.packaging).get(&order_id).copied()
    }

    /// Number of stored orders.
    #[must_use]
    pub fn len(&self) -> usize {
        lock(&self.orders).len()
    }

    /// Whether the repository holds no orders.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        lock(&self.orders).is_empty()
    }

    fn take_failure(&self) -> Option<StoreError> {
        lock(&self.failures).pop_front()
    }
}

impl OrderRepository for InMemoryOrderRepository {
    async fn create_order(&self, order: &Order, packaging: Packaging) -> Result<(), StoreError> {
        if let Some(error) = self.take_failure() {
            return Err(error);
        }
        let mut orders = lock(&self.orders);
        if orders.contains_key(&order.order_id) {
            return Err(StoreError::RolledBack {
                source: Box::new(StoreError::Database(format!(
                    "duplicate order id {}",
                    order.order_id
                ))),
            });
        }
        orders.insert(order.order_id, order.clone());
        lock(&self.packaging).insert(order.order_id, packaging);
        Ok(())
    }

    async fn delete_order(&self, order_id: OrderId) -> Result<(), StoreError> {
        if let Some(error) = self.take_failure() {
            return Err(error);
        }
        lock(&self.orders).remove(&order_id);
        lock(&self.packaging).remove(&order_id);
        Ok(())
    }

    async fn mark_issued(&self, order_id: OrderId, content_hash: &str) -> Result<(), StoreError> {
        if let Some(error) = self.take_failure() {
            return Err(error);
        }
        if let Some(order) = lock(&self.orders).get_mut(&order_id) {
            order.issued_to_user = true;
            order.issued_at = Some(self.clock.now());
            order.content_hash = content_hash.to_string();
        }
        Ok(())
    }

    async fn mark_returned(&self, order: &Order) -> Result<(), StoreError> {
        if let Some(error) = self.take_failure() {
            return Err(error);
        }
        if let Some(stored) = lock(&self.orders).get_mut(&order.order_id) {
            stored.is_returned = true;
            stored.content_hash = order.content_hash.clone();
        }
        Ok(())
    }

    async fn list_orders(&self, user_id: UserId, last_n: i64) -> Result<Vec<Order>, StoreError> {
        if let Some(error) = self.take_failure() {
            return Err(error);
        }
        let mut orders: Vec<Order> = lock(&self.orders)
            .values()
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.order_id.cmp(&a.order_id));
        orders.truncate(usize::try_from(last_n).unwrap_or(0));
        Ok(orders)
    }

    async fn list_returns(&self, page: i64, page_size: i64) -> Result<Vec<Order>, StoreError> {
        if let Some(error) = self.take_failure() {
            return Err(error);
        }
        let mut returned: Vec<Order> = lock(&self.orders)
            .values()
            .filter(|o| o.is_returned)
            .cloned()
            .collect();
        returned.sort_by(|a, b| b.order_id.cmp(&a.order_id));
        let size = usize::try_from(page_size).unwrap_or(0);
        let offset = usize::try_from(page - 1).unwrap_or(0).saturating_mul(size);
        Ok(returned.into_iter().skip(offset).take(size).collect())
    }

    async fn get_order_by_id(&self, order_id: OrderId) -> Result<Order, StoreError> {
        if let Some(error) = self.take_failure() {
            return Err(error);
        }
        lock(&self.orders)
            .get(&order_id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }
}

/// Metrics port that counts what the engine reports.
#[derive(Debug, Clone, Default)]
pub struct RecordingMetrics {
    issued: Arc<AtomicUsize>,
}

impl RecordingMetrics {
    /// Create a fresh recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of issued-order reports.
    #[must_use]
    pub fn issued_count(&self) -> usize {
        self.issued.load(Ordering::SeqCst)
    }
}

impl LifecycleMetrics for RecordingMetrics {
    fn order_issued(&self) {
        self.issued.fetch_add(1, Ordering::SeqCst);
    }
}

/// Event sink that retains every published event.
#[derive(Debug, Clone, Default)]
pub struct CapturingSink {
    events: Arc<Mutex<Vec<CommandEvent>>>,
}

impl CapturingSink {
    /// Create an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the published events, in order.
    #[must_use]
    pub fn events(&self) -> Vec<CommandEvent> {
        lock(&self.events).clone()
    }
}

impl EventSink for CapturingSink {
    fn publish(&self, event: &CommandEvent) {
        lock(&self.events).push(event.clone());
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
