//! # Pickup Point Runtime
//!
//! Runtime plumbing for the pickup-point service: the bounded-concurrency
//! command dispatcher, the command-name → engine binding layer, environment
//! configuration and the Prometheus metrics exporter.
//!
//! ## Core Components
//!
//! - **`CommandDispatcher`**: admits commands under a limit, runs each as a
//!   detached unit, drains cooperatively on shutdown
//! - **`OrderCommands`**: parses dispatched arguments into engine calls
//! - **`ServiceConfig`**: environment-derived configuration
//! - **`MetricsServer`**: Prometheus exporter plus the engine's metrics port
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use pickup_point_core::OrderService;
//! use pickup_point_postgres::{Database, PostgresOrderRepository};
//! use pickup_point_runtime::{
//!     CommandDispatcher, OrderCommands, ServiceConfig, sink_for,
//! };
//!
//! let config = ServiceConfig::from_env()?;
//! let db = Database::connect(&config.database_url).await?;
//! let engine = Arc::new(OrderService::new(
//!     PostgresOrderRepository::new(db),
//!     config.cache_ttl,
//! ));
//! let dispatcher = CommandDispatcher::new(
//!     OrderCommands::new(engine),
//!     sink_for(&config)?,
//!     config.worker_limit,
//! );
//!
//! dispatcher.dispatch("issue-order", vec!["1".into()]).await?;
//! dispatcher.shutdown().await;
//! ```

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]

pub mod commands;
pub mod config;
pub mod dispatcher;
pub mod metrics;
pub mod sink;

pub use commands::OrderCommands;
pub use config::{ConfigError, ServiceConfig};
pub use dispatcher::{CommandDispatcher, CommandHandler, DispatchError};
pub use metrics::{MetricsServer, PrometheusLifecycleMetrics};
pub use sink::{ConsoleSink, FileSink, TracingSink, sink_for};
