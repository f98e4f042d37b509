use std::sync::Arc;

use crate::StopReason;

/// Backend metrics collection interface.
///
/// Implementations are injected via [`crate::GeneratorContext`] and called from the producer task.
pub trait MetricsBackend: Send + Sync + 'static {
    /// Record a value accepted by the prefetch queue.
    ///
    /// Called once per value, right after it was enqueued.
    fn record_value_produced(&self, generator: &str);
    /// Record a reset applied by the producer.
    fn record_reset(&self, generator: &str);
    /// Record the end of production.
    ///
    /// Called exactly once per generator, when the producer task exits.
    ///
    /// # Arguments
    /// - `generator`: Generator name
    /// - `reason`: Why production ended
    fn record_generator_stopped(&self, generator: &str, reason: StopReason);
}

/// Shared handle to metrics backend.
///
/// Stored in [`crate::GeneratorContext`] and cloned into each producer task.
pub type MetricsHandle = Arc<dyn MetricsBackend>;
