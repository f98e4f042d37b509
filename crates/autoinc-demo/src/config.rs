use std::{fs, path::Path};

use anyhow::{Context, ensure};
use serde::{Deserialize, Serialize};

use autoinc_model::GeneratorSpec;
use autoinc_observe::LoggerConfig;

/// Demo run configuration, read from an optional JSON file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DemoConfig {
    pub logger: LoggerConfig,
    pub generator: GeneratorSpec,
    /// Number of concurrent consumer tasks.
    pub consumers: usize,
    /// Values each consumer takes before finishing.
    pub per_consumer: usize,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            logger: LoggerConfig::default(),
            generator: GeneratorSpec::default().with_name("demo"),
            consumers: 4,
            per_consumer: 100,
        }
    }
}

impl DemoConfig {
    /// Read and validate a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let cfg: Self = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse config {}", path.display()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(self.consumers > 0, "at least one consumer is required");
        self.generator.validate()?;
        Ok(())
    }
}
