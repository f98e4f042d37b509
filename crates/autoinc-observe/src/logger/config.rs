use std::io::IsTerminal;

use serde::{Deserialize, Serialize};

use crate::logger::object::{LoggerFormat, LoggerLevel};

/// Logger configuration.
///
/// Every field is optional in serialized form; missing ones take the defaults below.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LoggerConfig {
    /// Output format.
    pub format: LoggerFormat,
    /// Filter expression (e.g. `"info"`, `"autoinc_core=trace,info"`).
    pub level: LoggerLevel,
    /// Include module/target names.
    pub with_targets: bool,
    /// Include the id of the thread that emitted the event.
    ///
    /// Useful when several consumer threads drain the same generator.
    pub with_thread_ids: bool,
    /// Colored output for the text format.
    pub use_color: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            format: LoggerFormat::default(),
            level: LoggerLevel::default(),
            with_targets: true,
            with_thread_ids: false,
            use_color: true,
        }
    }
}

impl LoggerConfig {
    /// Whether ANSI colors should actually be emitted.
    ///
    /// `true` only when `use_color` is set AND stdout is a terminal; evaluated
    /// at install time rather than at parse time.
    pub fn should_use_color(&self) -> bool {
        self.use_color && std::io::stdout().is_terminal()
    }
}
