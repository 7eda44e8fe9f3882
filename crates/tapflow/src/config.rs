//! Run configuration.
//!
//! ```yaml
//! default_timeout_ms: 3000
//! log_steps: true
//! logging:
//!   level: tapflow=debug
//!   json: false
//! ```

use crate::logging::LoggingConfig;
use crate::result::FlowResult;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Settings shared by every pipeline built from one configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowConfig {
    /// Timeout used by waits that do not name one, in milliseconds
    pub default_timeout_ms: u64,
    /// Emit a debug event for every executed step
    pub log_steps: bool,
    /// Log output settings
    pub logging: LoggingConfig,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            default_timeout_ms: 5000,
            log_steps: true,
            logging: LoggingConfig::default(),
        }
    }
}

impl FlowConfig {
    /// Create default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the default wait timeout
    #[must_use]
    pub const fn with_default_timeout_ms(mut self, ms: u64) -> Self {
        self.default_timeout_ms = ms;
        self
    }

    /// Toggle per-step debug events
    #[must_use]
    pub const fn with_log_steps(mut self, enabled: bool) -> Self {
        self.log_steps = enabled;
        self
    }

    /// Replace the logging settings
    #[must_use]
    pub fn with_logging(mut self, logging: LoggingConfig) -> Self {
        self.logging = logging;
        self
    }

    /// Default wait timeout as a duration
    #[must_use]
    pub const fn default_timeout(&self) -> Duration {
        Duration::from_millis(self.default_timeout_ms)
    }

    /// Parse from a YAML document
    pub fn from_yaml_str(yaml: &str) -> FlowResult<Self> {
        Ok(serde_yaml_ng::from_str(yaml)?)
    }

    /// Load from a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> FlowResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }
}
