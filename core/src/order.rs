//! The order aggregate and its identifiers.
//!
//! An order is in exactly one of four logical states:
//!
//! - **at pickup point**: `received_from_courier` and nothing else
//! - **issued to user**: `issued_to_user` with `issued_at` set
//! - **returned by user**: `is_returned` (terminal, record retained)
//! - **returned to courier**: the record is deleted (terminal)
//!
//! There is no transition out of a terminal state.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Unique order identifier, assigned by the courier side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OrderId(pub i64);

impl std::fmt::Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of the user the parcel is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub i64);

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A parcel tracked by the pickup point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Unique order id.
    pub order_id: OrderId,
    /// Owner of the parcel.
    pub user_id: UserId,
    /// Storage expiry instant. Issuing is rejected past this deadline;
    /// returning to the courier is rejected before it.
    pub deadline: DateTime<Utc>,
    /// Set only when the order is issued to the user.
    pub issued_at: Option<DateTime<Utc>>,
    /// Opaque tamper/version token, regenerated on every state-changing
    /// write.
    pub content_hash: String,
    /// Cost including the packaging surcharge.
    pub cost: f64,
    /// Parcel weight, used to validate the packaging choice.
    pub weight: f64,
    /// The parcel was handed over by a courier.
    pub received_from_courier: bool,
    /// The parcel was handed out to the user.
    pub issued_to_user: bool,
    /// The user brought the parcel back (terminal).
    pub is_returned: bool,
    /// Physical presence flag mirrored into storage.
    pub is_at_pickup_point: bool,
}

/// Caller-supplied fields for accepting a new order from a courier.
///
/// The engine enriches a draft with the packaging surcharge and the
/// acceptance flags before persisting it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrderDraft {
    /// Unique order id.
    pub order_id: OrderId,
    /// Owner of the parcel.
    pub user_id: UserId,
    /// Storage expiry instant; must lie in the future at acceptance time.
    pub deadline: DateTime<Utc>,
    /// Base cost, before the packaging surcharge.
    pub cost: f64,
    /// Parcel weight.
    pub weight: f64,
}

impl Order {
    /// Build the just-accepted representation of a draft: received from the
    /// courier, not issued, not returned, fresh content hash.
    #[must_use]
    pub fn accepted(draft: OrderDraft, total_cost: f64) -> Self {
        Self {
            order_id: draft.order_id,
            user_id: draft.user_id,
            deadline: draft.deadline,
            issued_at: None,
            content_hash: generate_content_hash(),
            cost: total_cost,
            weight: draft.weight,
            received_from_courier: true,
            issued_to_user: false,
            is_returned: false,
            is_at_pickup_point: false,
        }
    }
}

/// Length of the opaque content token.
const CONTENT_HASH_LEN: usize = 32;

/// Generate a fresh opaque content token.
///
/// The token has no structure; equality with the previously stored value is
/// the only thing ever checked, so a random alphanumeric string suffices.
#[must_use]
pub fn generate_content_hash() -> String {
    let mut rng = rand::thread_rng();
    (0..CONTENT_HASH_LEN)
        .map(|_| char::from(rng.sample(rand::distributions::Alphanumeric)))
        .collect()
}
