//! Storage port consumed by the lifecycle engine.

use crate::error::StoreError;
use crate::order::{Order, OrderId, UserId};
use crate::packaging::Packaging;

/// Durable storage for orders.
///
/// This trait abstracts over the transactional store. Mutating operations
/// run as one unit of work each; reads are single statements against a
/// pooled connection. Implementations must be `Send + Sync`.
pub trait OrderRepository: Send + Sync {
    /// Persist a newly accepted order together with its packaging record.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] when the unit of work fails; the error is
    /// handed to the caller verbatim.
    fn create_order(
        &self,
        order: &Order,
        packaging: Packaging,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Delete an order record (return to courier).
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] when the unit of work fails.
    fn delete_order(&self, order_id: OrderId) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Mark an order issued: set the issued flag, stamp `issued_at` and
    /// store the regenerated content hash.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] when the unit of work fails.
    fn mark_issued(
        &self,
        order_id: OrderId,
        content_hash: &str,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Mark an order returned by the user, storing its regenerated content
    /// hash.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] when the unit of work fails.
    fn mark_returned(&self, order: &Order) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// The user's most recent orders, id descending, at most `last_n`.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] when the read fails.
    fn list_orders(
        &self,
        user_id: UserId,
        last_n: i64,
    ) -> impl Future<Output = Result<Vec<Order>, StoreError>> + Send;

    /// Returned orders, id descending, 1-based page of `page_size` rows.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] when the read fails.
    fn list_returns(
        &self,
        page: i64,
        page_size: i64,
    ) -> impl Future<Output = Result<Vec<Order>, StoreError>> + Send;

    /// Fetch one order by id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when no such row exists, any other
    /// [`StoreError`] when the read fails.
    fn get_order_by_id(
        &self,
        order_id: OrderId,
    ) -> impl Future<Output = Result<Order, StoreError>> + Send;
}
