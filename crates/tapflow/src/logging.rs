//! Tracing subscriber setup.
//!
//! Library code only emits `tracing` events. Binaries and test harnesses
//! that want to see them call [`init_logging`] once at startup.

use serde::{Deserialize, Serialize};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Log output settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Fallback filter directive when `RUST_LOG` is unset
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl LoggingConfig {
    /// Create default logging settings
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the fallback filter directive
    #[must_use]
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    /// Toggle JSON output
    #[must_use]
    pub const fn with_json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }

    /// Filter to install: `RUST_LOG` if set, else the configured level
    #[must_use]
    pub fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.level))
    }
}

/// Install the global subscriber.
///
/// Returns `false` when a subscriber was already installed, which makes
/// repeated calls from several tests harmless.
pub fn init_logging(config: &LoggingConfig) -> bool {
    let filter = config.env_filter();
    let registry = tracing_subscriber::registry().with(filter);
    let installed = if config.json {
        registry.with(fmt::layer().json()).try_init()
    } else {
        registry.with(fmt::layer().with_target(true)).try_init()
    };
    installed.is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LoggingConfig::default();
        assert_eq!(config.level, "info");
        assert!(!config.json);
    }

    #[test]
    fn test_builder() {
        let config = LoggingConfig::new().with_level("tapflow=debug").with_json(true);
        assert_eq!(config.level, "tapflow=debug");
        assert!(config.json);
    }

    #[test]
    fn test_init_is_idempotent() {
        let config = LoggingConfig::new().with_level("warn");
        let _ = init_logging(&config);
        assert!(!init_logging(&config));
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config: LoggingConfig = serde_yaml_ng::from_str("json: true\n").unwrap();
        assert_eq!(config.level, "info");
        assert!(config.json);
    }
}
