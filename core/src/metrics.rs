//! Observability hooks injected into the engine.

/// Counters the engine reports into.
///
/// Modeled as an injected collaborator rather than engine-owned global
/// state, so the engine stays testable and the export technology stays a
/// runtime concern.
pub trait LifecycleMetrics: Send + Sync {
    /// An order was successfully issued to a user.
    fn order_issued(&self);
}

/// Metrics sink that records nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMetrics;

impl LifecycleMetrics for NoopMetrics {
    fn order_issued(&self) {}
}
