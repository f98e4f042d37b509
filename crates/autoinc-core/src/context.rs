use std::fmt;

use tokio_util::sync::CancellationToken;

use crate::metrics::MetricsHandle;

/// Shared dependencies handed to every generator spawned from it.
///
/// Carries the metrics backend and the caller's cancellation token. Each
/// generator listens on a child of that token, so cancelling it stops every
/// generator built from this context while stopping one generator leaves the
/// others running.
#[derive(Clone)]
pub struct GeneratorContext {
    metrics: MetricsHandle,
    cancel: CancellationToken,
}

impl GeneratorContext {
    /// Create a new context with the given params.
    pub fn new(metrics: MetricsHandle, cancel: CancellationToken) -> Self {
        Self { metrics, cancel }
    }

    /// Get a clonable handle to the metrics backend.
    pub fn metrics(&self) -> &MetricsHandle {
        &self.metrics
    }

    /// Get the parent cancellation token.
    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Replace the metrics backend and return updated context.
    pub fn with_metrics(mut self, metrics: MetricsHandle) -> Self {
        self.metrics = metrics;
        self
    }

    /// Replace the parent cancellation token and return updated context.
    pub fn with_cancel_token(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }
}

impl Default for GeneratorContext {
    fn default() -> Self {
        Self {
            metrics: crate::metrics::noop_metrics(),
            cancel: CancellationToken::new(),
        }
    }
}

impl fmt::Debug for GeneratorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneratorContext")
            .field("metrics", &"<handle>")
            .field("cancelled", &self.cancel.is_cancelled())
            .finish()
    }
}
