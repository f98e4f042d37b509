//! Prometheus metrics backend for autoinc sequence generators.
//!
//! Provides [`PrometheusMetrics`], an implementation of [`autoinc_core::MetricsBackend`].
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use autoinc_core::GeneratorContext;
//! use autoinc_prometheus::PrometheusMetrics;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let metrics = PrometheusMetrics::new()?;
//! let ctx = GeneratorContext::default().with_metrics(Arc::new(metrics.clone()));
//!
//! // later: render `metrics.gather()` with `prometheus::TextEncoder`
//! # Ok(())
//! # }
//! ```
//!
//! ## Metrics
//! - `autoinc_values_produced_total{generator}` - Counter
//! - `autoinc_resets_total{generator}` - Counter
//! - `autoinc_generators_stopped_total{generator, reason}` - Counter
//!
//! No HTTP endpoint is provided; serve [`PrometheusMetrics::gather`] from your own server.

mod backend;
pub use backend::PrometheusMetrics;

pub use prometheus::{Registry, TextEncoder};
