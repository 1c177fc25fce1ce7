//! `PostgreSQL`-backed order repository.

use chrono::{DateTime, Utc};
use futures::FutureExt;
use pickup_point_core::error::StoreError;
use pickup_point_core::order::{Order, OrderId, UserId};
use pickup_point_core::packaging::Packaging;
use pickup_point_core::repository::OrderRepository;

use crate::database::{Database, map_sqlx_error};

/// Row shape of the `orders` table.
#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i64,
    user_id: i64,
    deadline: DateTime<Utc>,
    issued_at: Option<DateTime<Utc>>,
    content_hash: String,
    cost: f64,
    weight: f64,
    received_from_courier: bool,
    issued_to_user: bool,
    is_returned: bool,
    is_at_pickup_point: bool,
}

impl From<OrderRow> for Order {
    fn from(row: OrderRow) -> Self {
        Self {
            order_id: OrderId(row.id),
            user_id: UserId(row.user_id),
            deadline: row.deadline,
            issued_at: row.issued_at,
            content_hash: row.content_hash,
            cost: row.cost,
            weight: row.weight,
            received_from_courier: row.received_from_courier,
            issued_to_user: row.issued_to_user,
            is_returned: row.is_returned,
            is_at_pickup_point: row.is_at_pickup_point,
        }
    }
}

const SELECT_ORDER: &str = "SELECT id, user_id, deadline, issued_at, content_hash, cost, weight, \
     received_from_courier, issued_to_user, is_returned, is_at_pickup_point \
     FROM orders";

/// Order storage backed by [`Database`].
///
/// Mutations each run as one repeatable-read unit of work; reads go straight
/// to the pool.
#[derive(Clone)]
pub struct PostgresOrderRepository {
    db: Database,
}

impl PostgresOrderRepository {
    /// Create a repository over the given database handle.
    #[must_use]
    pub const fn new(db: Database) -> Self {
        Self { db }
    }
}

impl OrderRepository for PostgresOrderRepository {
    async fn create_order(&self, order: &Order, packaging: Packaging) -> Result<(), StoreError> {
        let order = order.clone();
        self.db
            .run_in_transaction(move |uow| {
                async move {
                    let packaging_id: i64 = sqlx::query_scalar(
                        "INSERT INTO packaging_types (kind) VALUES ($1) RETURNING id",
                    )
                    .bind(packaging.as_str())
                    .fetch_one(uow.executor())
                    .await
                    .map_err(map_sqlx_error)?;

                    sqlx::query(
                        "INSERT INTO orders \
                         (id, user_id, deadline, issued_at, content_hash, packaging_type_id, \
                          cost, weight, received_from_courier, issued_to_user, is_returned, \
                          is_at_pickup_point) \
                         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
                    )
                    .bind(order.order_id.0)
                    .bind(order.user_id.0)
                    .bind(order.deadline)
                    .bind(order.issued_at)
                    .bind(&order.content_hash)
                    .bind(packaging_id)
                    .bind(order.cost)
                    .bind(order.weight)
                    .bind(order.received_from_courier)
                    .bind(order.issued_to_user)
                    .bind(order.is_returned)
                    .bind(order.is_at_pickup_point)
                    .execute(uow.executor())
                    .await
                    .map_err(map_sqlx_error)?;

                    Ok(())
                }
                .boxed()
            })
            .await
    }

    async fn delete_order(&self, order_id: OrderId) -> Result<(), StoreError> {
        self.db
            .run_in_transaction(move |uow| {
                async move {
                    sqlx::query("DELETE FROM orders WHERE id = $1")
                        .bind(order_id.0)
                        .execute(uow.executor())
                        .await
                        .map_err(map_sqlx_error)?;
                    Ok(())
                }
                .boxed()
            })
            .await
    }

    async fn mark_issued(&self, order_id: OrderId, content_hash: &str) -> Result<(), StoreError> {
        let content_hash = content_hash.to_owned();
        self.db
            .run_in_transaction(move |uow| {
                async move {
                    sqlx::query(
                        "UPDATE orders \
                         SET issued_to_user = TRUE, issued_at = NOW(), content_hash = $2 \
                         WHERE id = $1",
                    )
                    .bind(order_id.0)
                    .bind(&content_hash)
                    .execute(uow.executor())
                    .await
                    .map_err(map_sqlx_error)?;
                    Ok(())
                }
                .boxed()
            })
            .await
    }

    async fn mark_returned(&self, order: &Order) -> Result<(), StoreError> {
        let order_id = order.order_id;
        let content_hash = order.content_hash.clone();
        self.db
            .run_in_transaction(move |uow| {
                async move {
                    sqlx::query(
                        "UPDATE orders SET is_returned = TRUE, content_hash = $2 WHERE id = $1",
                    )
                    .bind(order_id.0)
                    .bind(&content_hash)
                    .execute(uow.executor())
                    .await
                    .map_err(map_sqlx_error)?;
                    Ok(())
                }
                .boxed()
            })
            .await
    }

    async fn list_orders(&self, user_id: UserId, last_n: i64) -> Result<Vec<Order>, StoreError> {
        let rows: Vec<OrderRow> = sqlx::query_as(&format!(
            "{SELECT_ORDER} WHERE user_id = $1 ORDER BY id DESC LIMIT $2"
        ))
        .bind(user_id.0)
        .bind(last_n)
        .fetch_all(self.db.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(Order::from).collect())
    }

    async fn list_returns(&self, page: i64, page_size: i64) -> Result<Vec<Order>, StoreError> {
        let rows: Vec<OrderRow> = sqlx::query_as(&format!(
            "{SELECT_ORDER} WHERE is_returned ORDER BY id DESC LIMIT $1 OFFSET $2"
        ))
        .bind(page_size)
        .bind((page - 1).saturating_mul(page_size))
        .fetch_all(self.db.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(Order::from).collect())
    }

    async fn get_order_by_id(&self, order_id: OrderId) -> Result<Order, StoreError> {
        let row: Option<OrderRow> = sqlx::query_as(&format!("{SELECT_ORDER} WHERE id = $1"))
            .bind(order_id.0)
            .fetch_optional(self.db.pool())
            .await
            .map_err(map_sqlx_error)?;

        row.map(Order::from).ok_or(StoreError::NotFound)
    }
}
