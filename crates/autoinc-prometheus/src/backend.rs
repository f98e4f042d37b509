use std::sync::Arc;

use prometheus::{CounterVec, Opts, Registry, proto::MetricFamily};

use autoinc_core::{MetricsBackend, StopReason};

/// Prometheus metrics backend for sequence generators.
///
/// ## Label cardinality
/// - `generator`: one value per generator name, chosen by the caller
/// - `reason`: "cancelled", "overflow", "closed"
#[derive(Clone)]
pub struct PrometheusMetrics {
    values_produced: CounterVec,
    resets: CounterVec,
    generators_stopped: CounterVec,
    registry: Arc<Registry>,
}

impl PrometheusMetrics {
    /// Create a backend registering its collectors into `registry`.
    pub fn new_with_registry(registry: Arc<Registry>) -> Result<Self, prometheus::Error> {
        let values_produced = CounterVec::new(
            Opts::new("values_produced_total", "Values enqueued by producers").namespace("autoinc"),
            &["generator"],
        )?;
        registry.register(Box::new(values_produced.clone()))?;

        let resets = CounterVec::new(
            Opts::new("resets_total", "Counter resets applied by producers").namespace("autoinc"),
            &["generator"],
        )?;
        registry.register(Box::new(resets.clone()))?;

        let generators_stopped = CounterVec::new(
            Opts::new("generators_stopped_total", "Producers that stopped, by reason")
                .namespace("autoinc"),
            &["generator", "reason"],
        )?;
        registry.register(Box::new(generators_stopped.clone()))?;

        Ok(Self {
            values_produced,
            resets,
            generators_stopped,
            registry,
        })
    }

    /// Create a backend with its own registry.
    pub fn new() -> Result<Self, prometheus::Error> {
        Self::new_with_registry(Arc::new(Registry::new()))
    }

    /// Gather all metrics for exposition.
    pub fn gather(&self) -> Vec<MetricFamily> {
        self.registry.gather()
    }

    /// Underlying registry, for registering custom metrics alongside.
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }
}

impl MetricsBackend for PrometheusMetrics {
    fn record_value_produced(&self, generator: &str) {
        self.values_produced.with_label_values(&[generator]).inc();
    }

    fn record_reset(&self, generator: &str) {
        self.resets.with_label_values(&[generator]).inc();
    }

    fn record_generator_stopped(&self, generator: &str, reason: StopReason) {
        self.generators_stopped
            .with_label_values(&[generator, reason.as_label()])
            .inc();
    }
}
