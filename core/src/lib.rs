//! # Pickup Point Core
//!
//! Domain model and lifecycle engine for a parcel pickup point: acceptance
//! from a courier, issuance to a user, return to the courier and return
//! from the user.
//!
//! ## Architecture
//!
//! ```text
//! Dispatcher → OrderService → { TtlCache, OrderRepository }
//! ```
//!
//! The engine owns the transition rules and the write-through caching
//! policy. Storage, time and observability are ports
//! ([`repository::OrderRepository`], [`environment::Clock`],
//! [`metrics::LifecycleMetrics`]) so the same engine runs against Postgres
//! in production and in-memory collaborators in tests.
//!
//! ## Example
//!
//! ```rust,ignore
//! use pickup_point_core::{OrderService, OrderDraft, OrderId, Packaging, UserId};
//!
//! let engine = OrderService::new(repo, chrono::Duration::minutes(10));
//! engine.accept_order(draft, Packaging::Box).await?;
//! engine.issue_order(OrderId(1)).await?;
//! ```

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]

// Public modules
pub mod cache;
pub mod environment;
pub mod error;
pub mod event;
pub mod metrics;
pub mod order;
pub mod packaging;
pub mod repository;
pub mod service;

// Re-export main types for convenience
pub use cache::{CacheEntry, TtlCache};
pub use environment::{Clock, SystemClock};
pub use error::{OrderError, Result, StoreError};
pub use event::{CommandEvent, EventSink, NullSink};
pub use metrics::{LifecycleMetrics, NoopMetrics};
pub use order::{Order, OrderDraft, OrderId, UserId};
pub use packaging::Packaging;
pub use repository::OrderRepository;
pub use service::OrderService;
