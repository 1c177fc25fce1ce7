//! Error taxonomy for the order lifecycle engine and its storage port.
//!
//! Two layers are distinguished:
//!
//! - [`StoreError`] is produced by the transactional store port. It carries
//!   the transaction outcome (rolled back cleanly vs. rollback also failed)
//!   and the retryable serialization-conflict case.
//! - [`OrderError`] is the engine-facing taxonomy. Store errors are wrapped
//!   unchanged; domain rule violations get their own variants so that the
//!   human-readable message survives every boundary up to the transport.

use crate::order::{OrderId, UserId};
use thiserror::Error;

/// Result type alias for lifecycle operations.
pub type Result<T> = std::result::Result<T, OrderError>;

/// Errors produced by the transactional store port.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The requested order does not exist.
    #[error("order not found")]
    NotFound,

    /// The transaction hit a serialization conflict and may be retried by
    /// the caller. The engine never retries on its own.
    #[error("serialization conflict, transaction may be retried: {0}")]
    SerializationConflict(String),

    /// The unit of work failed and the transaction was rolled back cleanly.
    #[error("transaction failed and was rolled back: {source}")]
    RolledBack {
        /// The error raised by the unit of work.
        source: Box<StoreError>,
    },

    /// The unit of work failed and the rollback failed too. This is the
    /// most severe storage outcome; it must never be retried.
    #[error("transaction failed: {source}; rollback also failed: {rollback}")]
    RollbackFailed {
        /// The error raised by the unit of work.
        source: Box<StoreError>,
        /// The error raised while rolling back.
        rollback: String,
    },

    /// Any other database failure (connection, constraint, statement).
    #[error("database error: {0}")]
    Database(String),
}

impl StoreError {
    /// Returns `true` if retrying the whole operation could succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::SerializationConflict(_) => true,
            Self::RolledBack { source } => source.is_retryable(),
            _ => false,
        }
    }
}

/// Errors returned by the lifecycle engine.
///
/// The variants group into the categories consumed by transport
/// collaborators: validation, conflict, not-found, temporal, store and
/// internal. Transports may map categories to status codes but must keep
/// the message text intact.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum OrderError {
    /// Malformed or out-of-range input. Non-retryable, user-facing.
    #[error("validation failed: {0}")]
    Validation(String),

    /// An order with this id already exists at the pickup point.
    #[error("order {0} already exists")]
    AlreadyExists(OrderId),

    /// The order was already issued to the user.
    #[error("order {0} was already issued to the user")]
    AlreadyIssued(OrderId),

    /// The order was already returned by the user.
    #[error("order {0} was already returned")]
    AlreadyReturned(OrderId),

    /// No such order, or the order does not belong to the caller.
    #[error("order {0} not found")]
    NotFound(OrderId),

    /// The order was never received from a courier.
    #[error("order {0} was not received from a courier")]
    NotReceived(OrderId),

    /// The order was never issued to the user.
    #[error("order {0} was not issued to the user")]
    NotIssued(OrderId),

    /// The storage deadline has passed, the order can no longer be issued.
    #[error("storage deadline for order {0} has passed")]
    DeadlineExpired(OrderId),

    /// The storage deadline has not passed yet, the order cannot be
    /// returned to the courier.
    #[error("storage deadline for order {0} has not passed yet")]
    DeadlineNotReached(OrderId),

    /// More than two days have elapsed since issuance.
    #[error("more than two days have passed since order {0} was issued to user {1}")]
    ReturnWindowExpired(OrderId, UserId),

    /// A storage failure, propagated unchanged from the store port.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// An unexpected fault, e.g. a committed row that vanished on re-read.
    #[error("internal error: {0}")]
    Internal(String),
}

impl OrderError {
    /// Returns `true` for conflicts with existing lifecycle state.
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::AlreadyExists(_) | Self::AlreadyIssued(_) | Self::AlreadyReturned(_)
        )
    }

    /// Returns `true` for deadline and return-window violations.
    #[must_use]
    pub const fn is_temporal(&self) -> bool {
        matches!(
            self,
            Self::DeadlineExpired(_)
                | Self::DeadlineNotReached(_)
                | Self::ReturnWindowExpired(_, _)
        )
    }

    /// Returns `true` if the caller may retry the whole operation.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Store(e) => e.is_retryable(),
            _ => false,
        }
    }
}
