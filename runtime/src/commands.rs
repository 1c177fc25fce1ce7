//! Binding from dispatched command names to engine operations.
//!
//! The dispatcher hands over a command name and a raw argument list; this
//! layer parses the arguments and calls the matching [`OrderService`]
//! operation. Parse failures are validation errors and never reach the
//! engine.

use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::FutureExt;
use futures::future::BoxFuture;
use pickup_point_core::environment::Clock;
use pickup_point_core::error::OrderError;
use pickup_point_core::metrics::LifecycleMetrics;
use pickup_point_core::order::{Order, OrderDraft, OrderId, UserId};
use pickup_point_core::packaging::Packaging;
use pickup_point_core::repository::OrderRepository;
use pickup_point_core::service::OrderService;

use crate::dispatcher::CommandHandler;

/// Command name for accepting an order from a courier.
pub const ACCEPT_ORDER: &str = "accept-order";
/// Command name for issuing an order to its user.
pub const ISSUE_ORDER: &str = "issue-order";
/// Command name for returning an expired order to the courier.
pub const RETURN_ORDER: &str = "return-order";
/// Command name for taking an order back from its user.
pub const ACCEPT_RETURN: &str = "accept-return";
/// Command name for listing a user's recent orders.
pub const LIST_ORDERS: &str = "list-orders";
/// Command name for paging through returned orders.
pub const LIST_RETURNS: &str = "list-returns";

/// Routes dispatched commands to an [`OrderService`].
pub struct OrderCommands<R, M, C> {
    engine: Arc<OrderService<R, M, C>>,
}

impl<R, M, C> OrderCommands<R, M, C> {
    /// Wrap an engine for command dispatch.
    #[must_use]
    pub const fn new(engine: Arc<OrderService<R, M, C>>) -> Self {
        Self { engine }
    }
}

impl<R, M, C> Clone for OrderCommands<R, M, C> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
        }
    }
}

impl<R, M, C> OrderCommands<R, M, C>
where
    R: OrderRepository + 'static,
    M: LifecycleMetrics + 'static,
    C: Clock + Clone + 'static,
{
    async fn run(self, command: String, args: Vec<String>) -> Result<String, OrderError> {
        match command.as_str() {
            ACCEPT_ORDER => {
                let [order_id, user_id, deadline, cost, weight, packaging] =
                    fixed_args(&command, &args)?;
                let draft = OrderDraft {
                    order_id: OrderId(parse_arg(order_id, "order id")?),
                    user_id: UserId(parse_arg(user_id, "user id")?),
                    deadline: parse_deadline(deadline)?,
                    cost: parse_arg(cost, "cost")?,
                    weight: parse_arg(weight, "weight")?,
                };
                let packaging = Packaging::from_str(packaging)?;
                self.engine.accept_order(draft, packaging).await?;
                Ok(format!("Order {} accepted", draft.order_id))
            }
            ISSUE_ORDER => {
                let [order_id] = fixed_args(&command, &args)?;
                let order_id = OrderId(parse_arg(order_id, "order id")?);
                self.engine.issue_order(order_id).await?;
                Ok(format!("Order {order_id} issued"))
            }
            RETURN_ORDER => {
                let [order_id] = fixed_args(&command, &args)?;
                let order_id = OrderId(parse_arg(order_id, "order id")?);
                self.engine.return_order(order_id).await?;
                Ok(format!("Order {order_id} returned to courier"))
            }
            ACCEPT_RETURN => {
                let [order_id, user_id] = fixed_args(&command, &args)?;
                let order_id = OrderId(parse_arg(order_id, "order id")?);
                let user_id = UserId(parse_arg(user_id, "user id")?);
                self.engine.accept_return(order_id, user_id).await?;
                Ok(format!("Order {order_id} returned by user {user_id}"))
            }
            LIST_ORDERS => {
                let [user_id, last_n] = fixed_args(&command, &args)?;
                let user_id = UserId(parse_arg(user_id, "user id")?);
                let last_n = parse_arg(last_n, "count")?;
                let orders = self.engine.list_orders(user_id, last_n).await?;
                Ok(render_orders(&orders))
            }
            LIST_RETURNS => {
                let [page, page_size] = fixed_args(&command, &args)?;
                let page = parse_arg(page, "page")?;
                let page_size = parse_arg(page_size, "page size")?;
                let orders = self.engine.list_returns(page, page_size).await?;
                Ok(render_orders(&orders))
            }
            other => Err(OrderError::Validation(format!("unknown command: {other}"))),
        }
    }
}

impl<R, M, C> CommandHandler for OrderCommands<R, M, C>
where
    R: OrderRepository + 'static,
    M: LifecycleMetrics + 'static,
    C: Clock + Clone + 'static,
{
    fn handle(
        &self,
        command: String,
        args: Vec<String>,
    ) -> BoxFuture<'static, Result<String, OrderError>> {
        self.clone().run(command, args).boxed()
    }
}

fn fixed_args<'a, const N: usize>(
    command: &str,
    args: &'a [String],
) -> Result<[&'a str; N], OrderError> {
    if args.len() == N {
        let mut out = [""; N];
        for (slot, arg) in out.iter_mut().zip(args) {
            *slot = arg.as_str();
        }
        Ok(out)
    } else {
        Err(OrderError::Validation(format!(
            "{command} takes {N} argument(s), got {}",
            args.len()
        )))
    }
}

fn parse_arg<T: FromStr>(raw: &str, what: &str) -> Result<T, OrderError> {
    raw.parse()
        .map_err(|_| OrderError::Validation(format!("invalid {what}: {raw}")))
}

fn parse_deadline(raw: &str) -> Result<DateTime<Utc>, OrderError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|_| OrderError::Validation(format!("invalid deadline: {raw}")))
}

fn render_orders(orders: &[Order]) -> String {
    if orders.is_empty() {
        return "no orders".to_string();
    }
    orders
        .iter()
        .map(|o| {
            format!(
                "order {} user {} cost {} weight {} deadline {}",
                o.order_id,
                o.user_id,
                o.cost,
                o.weight,
                o.deadline.to_rfc3339()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use pickup_point_core::environment::SystemClock;
    use pickup_point_core::error::StoreError;
    use pickup_point_core::metrics::NoopMetrics;

    /// A repository that rejects every call; commands whose arguments fail
    /// to parse must never reach it.
    struct UnreachableRepository;

    impl OrderRepository for UnreachableRepository {
        async fn create_order(&self, _: &Order, _: Packaging) -> Result<(), StoreError> {
            Err(StoreError::Database("unexpected engine call".to_string()))
        }
        async fn delete_order(&self, _: OrderId) -> Result<(), StoreError> {
            Err(StoreError::Database("unexpected engine call".to_string()))
        }
        async fn mark_issued(&self, _: OrderId, _: &str) -> Result<(), StoreError> {
            Err(StoreError::Database("unexpected engine call".to_string()))
        }
        async fn mark_returned(&self, _: &Order) -> Result<(), StoreError> {
            Err(StoreError::Database("unexpected engine call".to_string()))
        }
        async fn list_orders(&self, _: UserId, _: i64) -> Result<Vec<Order>, StoreError> {
            Err(StoreError::Database("unexpected engine call".to_string()))
        }
        async fn list_returns(&self, _: i64, _: i64) -> Result<Vec<Order>, StoreError> {
            Err(StoreError::Database("unexpected engine call".to_string()))
        }
        async fn get_order_by_id(&self, _: OrderId) -> Result<Order, StoreError> {
            Err(StoreError::Database("unexpected engine call".to_string()))
        }
    }

    fn commands() -> OrderCommands<UnreachableRepository, NoopMetrics, SystemClock> {
        let engine = OrderService::with_parts(
            UnreachableRepository,
            Duration::minutes(5),
            NoopMetrics,
            SystemClock,
        );
        OrderCommands::new(Arc::new(engine))
    }

    fn strings(args: &[&str]) -> Vec<String> {
        args.iter().map(|a| (*a).to_string()).collect()
    }

    #[tokio::test]
    async fn test_unknown_command_is_validation() {
        let err = commands()
            .handle("teleport-order".to_string(), vec![])
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::Validation(_)));
    }

    #[tokio::test]
    async fn test_wrong_arity_is_validation() {
        let err = commands()
            .handle(ISSUE_ORDER.to_string(), strings(&["1", "2"]))
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::Validation(_)));
    }

    #[tokio::test]
    async fn test_non_numeric_id_is_validation() {
        let err = commands()
            .handle(ISSUE_ORDER.to_string(), strings(&["first"]))
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::Validation(_)));
    }

    #[tokio::test]
    async fn test_bad_deadline_is_validation() {
        let err = commands()
            .handle(
                ACCEPT_ORDER.to_string(),
                strings(&["1", "2", "tomorrow", "10", "5", "box"]),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::Validation(_)));
    }

    #[tokio::test]
    async fn test_bad_packaging_is_validation() {
        let err = commands()
            .handle(
                ACCEPT_ORDER.to_string(),
                strings(&["1", "2", "2099-01-01T00:00:00Z", "10", "5", "crate"]),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::Validation(_)));
    }
}
