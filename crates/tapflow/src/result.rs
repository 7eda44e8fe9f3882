//! Result and error types for Tapflow.

use thiserror::Error;

/// Result type for Tapflow operations
pub type FlowResult<T> = Result<T, FlowError>;

/// Errors that can occur while running steps and pipelines.
///
/// None of these are recovered inside a pipeline: the first failing step
/// aborts the run and its error is returned to the caller unchanged.
#[derive(Debug, Error)]
pub enum FlowError {
    /// The driver could not find an element for a locator
    #[error("No element matches {locator}")]
    NotFound {
        /// Rendered locator
        locator: String,
    },

    /// An action or assertion failed against the live UI
    #[error("Driver operation `{operation}` failed: {message}")]
    Driver {
        /// Driver operation name
        operation: String,
        /// Error message
        message: String,
    },

    /// A wait deadline elapsed before its condition held
    #[error("Wait timed out after {ms}ms")]
    Timeout {
        /// Timeout in milliseconds
        ms: u64,
    },

    /// A step without a locator ran with no element to carry forward
    #[error("Step `{step}` has no locator and no element from a previous step")]
    MissingElement {
        /// Label of the step that needed an element
        step: String,
    },

    /// A step was composed in a way that cannot be executed
    #[error("Invalid step: {message}")]
    InvalidStep {
        /// Error message
        message: String,
    },

    /// Scenario document failed validation
    #[error("Scenario error: {message}")]
    Scenario {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl FlowError {
    /// Build a driver failure for `operation`
    pub fn driver(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Driver {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Build an invalid-step error
    pub fn invalid_step(message: impl Into<String>) -> Self {
        Self::InvalidStep {
            message: message.into(),
        }
    }

    /// Whether this is a lookup failure
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Whether this is a wait deadline failure
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Whether the live UI rejected an action or assertion
    #[must_use]
    pub const fn is_driver_failure(&self) -> bool {
        matches!(self, Self::Driver { .. })
    }
}
