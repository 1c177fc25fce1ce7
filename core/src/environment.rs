//! Injected environment dependencies.
//!
//! Every time-dependent rule in the engine (deadlines, the 48-hour return
//! window, cache expiry) reads the current instant through [`Clock`], so
//! tests can substitute a deterministic source.

use chrono::{DateTime, Utc};

/// A source of the current wall-clock time.
///
/// Expiry is time-source-relative, not monotonic: adjusting the system
/// clock can make cache entries and deadlines expire early or late. This is
/// a documented limitation, not corrected here.
pub trait Clock: Send + Sync {
    /// Get the current time.
    fn now(&self) -> DateTime<Utc>;
}

/// The production clock, backed by the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

impl<C: Clock + ?Sized> Clock for std::sync::Arc<C> {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}
