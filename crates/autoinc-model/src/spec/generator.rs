use serde::{Deserialize, Serialize};

use crate::{DEFAULT_BUFFER_SIZE, DEFAULT_GENERATOR_NAME, ModelError, Step};

/// Declarative description of a sequence generator.
///
/// `GeneratorSpec` describes *which* sequence is produced and *how far ahead*
/// the producer may run:
/// - `start`, `step` define the arithmetic sequence `start, start+step, ...`;
/// - `buffer_size` bounds the number of values precomputed ahead of consumption
///   (`0` means values are handed over only when a consumer is waiting).
///
/// Every field has a default, so partial JSON documents are accepted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GeneratorSpec {
    /// Label used in logs and metrics.
    pub name: String,
    /// First value emitted.
    pub start: i64,
    /// Increment between two values; never zero.
    pub step: Step,
    /// Capacity of the prefetch queue.
    pub buffer_size: usize,
}

impl GeneratorSpec {
    /// Create a spec with the default name.
    pub fn new(start: i64, step: Step, buffer_size: usize) -> Self {
        Self {
            name: DEFAULT_GENERATOR_NAME.to_string(),
            start,
            step,
            buffer_size,
        }
    }

    /// Replace the name and return the updated spec.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Validate fields that the type system does not already guarantee.
    ///
    /// Rules:
    /// - `name` is not empty or whitespace-only.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.name.trim().is_empty() {
            return Err(ModelError::Invalid("generator name is empty".into()));
        }
        Ok(())
    }
}

impl Default for GeneratorSpec {
    fn default() -> Self {
        Self::new(0, Step::ONE, DEFAULT_BUFFER_SIZE)
    }
}
