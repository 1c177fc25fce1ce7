//! # Pickup Point Postgres
//!
//! `PostgreSQL` storage for the pickup-point service: a pooled
//! [`Database`] handle whose writes run as explicit repeatable-read units
//! of work, and the [`PostgresOrderRepository`] implementation of the
//! core storage port.
//!
//! ## Example
//!
//! ```rust,ignore
//! use pickup_point_postgres::{Database, PostgresOrderRepository};
//!
//! let db = Database::connect(&config.database_url).await?;
//! db.migrate().await?;
//! let repo = PostgresOrderRepository::new(db);
//! ```

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]

pub mod database;
pub mod order;

pub use database::{Database, UnitOfWork, map_sqlx_error};
pub use order::PostgresOrderRepository;
