//! Logging configuration

use crate::utils::logging::LogLevel;
use serde::{Deserialize, Serialize};

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct LoggingConfig {
    /// Minimum level when `RUST_LOG` is unset
    #[serde(default)]
    pub level: LogLevel,
    /// Emit JSON lines instead of the human format
    #[serde(default)]
    pub json: bool,
}

impl LoggingConfig {
    /// Merge logging configurations, with other taking precedence
    pub fn merge(mut self, other: Self) -> Self {
        if other.level != LogLevel::default() {
            self.level = other.level;
        }
        if other.json {
            self.json = true;
        }
        self
    }
}
