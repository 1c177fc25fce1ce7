//! Command events mirrored to an external sink.
//!
//! Every dispatched command produces exactly one event, regardless of the
//! command's outcome. The sink is an external collaborator (console, a
//! message bus); only its interface lives here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A record of one dispatched command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandEvent {
    /// Issuance timestamp, RFC 3339.
    pub time: String,
    /// Command name as dispatched.
    pub command: String,
    /// Space-joined argument list.
    pub args: String,
}

impl CommandEvent {
    /// Build the event for a dispatched command.
    #[must_use]
    pub fn new(command: &str, args: &[String], now: DateTime<Utc>) -> Self {
        Self {
            time: now.to_rfc3339(),
            command: command.to_string(),
            args: args.join(" "),
        }
    }
}

/// Destination for command events.
///
/// Publishing is fire-and-forget: a sink failure must not affect the
/// dispatched command, so the method cannot fail from the caller's point of
/// view. Implementations log their own delivery problems.
pub trait EventSink: Send + Sync {
    /// Deliver one event.
    fn publish(&self, event: &CommandEvent);
}

impl<S: EventSink + ?Sized> EventSink for Box<S> {
    fn publish(&self, event: &CommandEvent) {
        (**self).publish(event);
    }
}

/// A sink that drops every event, for collaborators that opt out.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn publish(&self, _event: &CommandEvent) {}
}
