//! The order lifecycle engine.
//!
//! Validates and executes order transitions, consulting the cache before
//! the store and writing through the store and then the cache on every
//! mutation. The cache only ever reflects the most recently committed
//! store write: nothing is cached before the corresponding write succeeds.
//!
//! # Concurrency
//!
//! Operations on different order ids run fully concurrently. For the same
//! id there is no lock spanning "read, decide, write": two concurrent
//! operations can both observe an eligible state before either persists.
//! This check-then-act window is inherited from the system's design and
//! deliberately left open here; see DESIGN.md.

use crate::cache::TtlCache;
use crate::environment::{Clock, SystemClock};
use crate::error::{OrderError, Result, StoreError};
use crate::metrics::{LifecycleMetrics, NoopMetrics};
use crate::order::{generate_content_hash, Order, OrderDraft, OrderId, UserId};
use crate::packaging::Packaging;
use crate::repository::OrderRepository;
use chrono::Duration;

/// Window after issuance within which a user may return a parcel.
#[must_use]
pub fn return_window() -> Duration {
    Duration::hours(48)
}

/// The lifecycle engine over a repository, a write-through cache and an
/// injected clock.
pub struct OrderService<R, M = NoopMetrics, C = SystemClock> {
    repo: R,
    metrics: M,
    clock: C,
    cache: TtlCache<OrderId, Order, C>,
}

impl<R: OrderRepository> OrderService<R> {
    /// Create an engine with the system clock and no metrics sink.
    #[must_use]
    pub fn new(repo: R, cache_ttl: Duration) -> Self {
        Self::with_parts(repo, cache_ttl, NoopMetrics, SystemClock)
    }
}

impl<R, M, C> OrderService<R, M, C>
where
    R: OrderRepository,
    M: LifecycleMetrics,
    C: Clock + Clone,
{
    /// Create an engine with explicit collaborators.
    #[must_use]
    pub fn with_parts(repo: R, cache_ttl: Duration, metrics: M, clock: C) -> Self {
        let cache = TtlCache::with_clock(cache_ttl, clock.clone());
        Self {
            repo,
            metrics,
            clock,
            cache,
        }
    }

    /// Accept a parcel from a courier.
    ///
    /// The packaging surcharge is added to the supplied cost, the order is
    /// persisted in the just-accepted state and the enriched record is then
    /// cached.
    ///
    /// # Errors
    ///
    /// - [`OrderError::AlreadyExists`] if the id is known to the cache or
    ///   the store
    /// - [`OrderError::Validation`] if the deadline is not in the future or
    ///   the weight exceeds the packaging limit
    /// - any [`StoreError`] from persistence, verbatim (nothing is cached
    ///   in that case)
    pub async fn accept_order(&self, draft: OrderDraft, packaging: Packaging) -> Result<()> {
        let id = draft.order_id;
        if self.cache.get(&id).is_some() {
            return Err(OrderError::AlreadyExists(id));
        }
        match self.repo.get_order_by_id(id).await {
            Ok(_) => return Err(OrderError::AlreadyExists(id)),
            Err(StoreError::NotFound) => {}
            Err(e) => return Err(e.into()),
        }

        let now = self.clock.now();
        if draft.deadline <= now {
            return Err(OrderError::Validation(
                "storage deadline must be in the future".to_string(),
            ));
        }
        let surcharge = packaging.admit(draft.weight)?;

        let order = Order::accepted(draft, draft.cost + surcharge);
        self.repo.create_order(&order, packaging).await?;
        self.cache.set(id, order, self.clock.now());
        Ok(())
    }

    /// Issue an order to its user.
    ///
    /// On success the committed record is re-read, the cache refreshed with
    /// it and the issued-orders counter incremented.
    ///
    /// # Errors
    ///
    /// - [`OrderError::NotFound`] if the id is absent from cache and store
    /// - [`OrderError::AlreadyIssued`] regardless of the deadline
    /// - [`OrderError::NotReceived`] if the parcel never arrived from a
    ///   courier
    /// - [`OrderError::DeadlineExpired`] if the storage deadline passed
    /// - any [`StoreError`] from persistence or the re-read
    pub async fn issue_order(&self, order_id: OrderId) -> Result<()> {
        let order = self.resolve_order(order_id).await?;

        if order.issued_to_user {
            return Err(OrderError::AlreadyIssued(order_id));
        }
        if !order.received_from_courier {
            return Err(OrderError::NotReceived(order_id));
        }
        if order.deadline < self.clock.now() {
            return Err(OrderError::DeadlineExpired(order_id));
        }

        self.repo
            .mark_issued(order_id, &generate_content_hash())
            .await?;
        let issued = self.reread_committed(order_id).await?;
        self.cache.set(order_id, issued, self.clock.now());
        self.metrics.order_issued();
        Ok(())
    }

    /// Return an expired, unissued order to the courier.
    ///
    /// On success the record is deleted from the store and the cache entry
    /// invalidated.
    ///
    /// # Errors
    ///
    /// - [`OrderError::NotFound`] if the id is absent from cache and store
    /// - [`OrderError::AlreadyIssued`] if the parcel left with the user
    /// - [`OrderError::DeadlineNotReached`] while the storage deadline is
    ///   still in the future
    /// - any [`StoreError`] from the delete
    pub async fn return_order(&self, order_id: OrderId) -> Result<()> {
        let order = self.resolve_order(order_id).await?;

        if order.issued_to_user {
            return Err(OrderError::AlreadyIssued(order_id));
        }
        if order.deadline > self.clock.now() {
            return Err(OrderError::DeadlineNotReached(order_id));
        }

        self.repo.delete_order(order_id).await?;
        self.cache.delete(&order_id);
        Ok(())
    }

    /// Accept a parcel back from its user.
    ///
    /// Ownership is verified first: a missing order or a user mismatch both
    /// read as not-found, so callers cannot probe foreign orders.
    ///
    /// # Errors
    ///
    /// - [`OrderError::NotFound`] on absence or ownership mismatch
    /// - [`OrderError::AlreadyReturned`] for a second return
    /// - [`OrderError::NotIssued`] if the parcel never left the pickup
    ///   point
    /// - [`OrderError::ReturnWindowExpired`] past 48 hours from issuance
    /// - any [`StoreError`] from persistence or the re-read
    pub async fn accept_return(&self, order_id: OrderId, user_id: UserId) -> Result<()> {
        let mut order = self.resolve_order(order_id).await?;
        if order.user_id != user_id {
            return Err(OrderError::NotFound(order_id));
        }

        if order.is_returned {
            return Err(OrderError::AlreadyReturned(order_id));
        }
        if !order.issued_to_user {
            return Err(OrderError::NotIssued(order_id));
        }
        let Some(issued_at) = order.issued_at else {
            return Err(OrderError::NotIssued(order_id));
        };
        if self.clock.now() - issued_at > return_window() {
            return Err(OrderError::ReturnWindowExpired(order_id, user_id));
        }

        order.content_hash = generate_content_hash();
        self.repo.mark_returned(&order).await?;
        let returned = self.reread_committed(order_id).await?;
        self.cache.set(order_id, returned, self.clock.now());
        Ok(())
    }

    /// The user's most recent orders, at most `last_n`, id descending.
    ///
    /// A pure read-through: the cache is not consulted and not updated.
    ///
    /// # Errors
    ///
    /// - [`OrderError::Validation`] for a non-positive bound
    /// - any [`StoreError`] from the read
    pub async fn list_orders(&self, user_id: UserId, last_n: i64) -> Result<Vec<Order>> {
        if last_n < 1 {
            return Err(OrderError::Validation(
                "order count bound must be positive".to_string(),
            ));
        }
        Ok(self.repo.list_orders(user_id, last_n).await?)
    }

    /// Returned orders, id descending, 1-based pagination.
    ///
    /// A pure read-through: the cache is not consulted and not updated.
    ///
    /// # Errors
    ///
    /// - [`OrderError::Validation`] for a non-positive page or page size
    /// - any [`StoreError`] from the read
    pub async fn list_returns(&self, page: i64, page_size: i64) -> Result<Vec<Order>> {
        if page < 1 || page_size < 1 {
            return Err(OrderError::Validation(
                "page and page size must be positive".to_string(),
            ));
        }
        Ok(self.repo.list_returns(page, page_size).await?)
    }

    /// The write-through cache, exposed for the periodic sweep and for
    /// collaborators that inspect it.
    pub const fn cache(&self) -> &TtlCache<OrderId, Order, C> {
        &self.cache
    }

    /// Resolve an order: a live cache entry is authoritative and the store
    /// is not consulted; on a miss the store is read, with its not-found
    /// mapped to the domain error and everything else propagated unchanged.
    async fn resolve_order(&self, order_id: OrderId) -> Result<Order> {
        if let Some(order) = self.cache.get(&order_id) {
            return Ok(order);
        }
        match self.repo.get_order_by_id(order_id).await {
            Ok(order) => Ok(order),
            Err(StoreError::NotFound) => Err(OrderError::NotFound(order_id)),
            Err(e) => Err(e.into()),
        }
    }

    /// Re-read a row that was committed a moment ago. Its absence means
    /// something else deleted it in between, which the engine cannot
    /// recover from within this operation.
    async fn reread_committed(&self, order_id: OrderId) -> Result<Order> {
        match self.repo.get_order_by_id(order_id).await {
            Ok(order) => Ok(order),
            Err(StoreError::NotFound) => Err(OrderError::Internal(format!(
                "order {order_id} vanished after a committed write"
            ))),
            Err(e) => Err(e.into()),
        }
    }
}
