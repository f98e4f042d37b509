//! Concurrent, cancellable generator of arithmetic `i64` sequences.
//!
//! A [`SequenceGenerator`] runs one background producer that keeps a bounded
//! queue topped up with the next values; any number of consumers drain it.
//!
//! ```rust
//! use autoinc_core::SequenceGenerator;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let ids = SequenceGenerator::new(0, 2, 2);
//! assert_eq!(ids.next().await, Some(0));
//! assert_eq!(ids.must_next().await, 2);
//!
//! ids.stop();
//! # }
//! ```
mod context;
pub use context::GeneratorContext;

mod error;
pub use error::{CoreError, CoreResult};

mod generator;
pub use generator::{SequenceGenerator, StopReason};

mod metrics;
pub use metrics::{MetricsBackend, MetricsHandle, NoOpMetrics, noop_metrics};

pub mod prelude {
    pub use crate::context::GeneratorContext;
    pub use crate::error::CoreError;
    pub use crate::generator::{SequenceGenerator, StopReason};
    pub use autoinc_model::{GeneratorSpec, Step};
}
