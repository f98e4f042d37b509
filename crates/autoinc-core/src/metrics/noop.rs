use crate::StopReason;
use crate::metrics::backend::MetricsBackend;

/// No-op metrics backend that compiles to nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpMetrics;

impl MetricsBackend for NoOpMetrics {
    #[inline(always)]
    fn record_value_produced(&self, _: &str) {}

    #[inline(always)]
    fn record_reset(&self, _: &str) {}

    #[inline(always)]
    fn record_generator_stopped(&self, _: &str, _: StopReason) {}
}
