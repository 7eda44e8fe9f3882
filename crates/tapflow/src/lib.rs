//! Tapflow: composable step pipelines for mobile UI automation
//!
//! Tapflow turns end-to-end UI tests into small, reusable steps: gestures,
//! assertions, waits and element lookups. Each step takes the previous
//! step's output and produces its own. Pipelines run their steps in order,
//! and a pipeline is itself a step, so flows nest freely.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      TAPFLOW Architecture                        │
//! ├─────────────────────────────────────────────────────────────────┤
//! │   ┌────────────┐    ┌────────────┐    ┌────────────────────┐    │
//! │   │ Steps      │    │ Pipeline   │    │ AutomationContext  │    │
//! │   │ tap/expect │───►│ fail-fast  │───►│ (device driver or  │    │
//! │   │ wait/find  │    │ fold       │    │  MockDevice)       │    │
//! │   └────────────┘    └────────────┘    └────────────────────┘    │
//! │         ▲                                                        │
//! │   ┌─────┴──────┐                                                 │
//! │   │ Scenario   │  YAML documents compiled into pipelines         │
//! │   └────────────┘                                                 │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use tapflow::prelude::*;
//!
//! let login = pipeline![
//!     find(Locator::by_id("email")),
//!     type_text("ada@example.com"),
//!     tap().on(Locator::by_id("submit")),
//!     wait_for(is_visible().on(Locator::by_text("Welcome")), Duration::from_secs(2)),
//! ];
//! login.run(&device).await?;
//! ```

#![warn(missing_docs)]
// Lints are configured in workspace Cargo.toml [workspace.lints.clippy]

/// Gesture, find and reload steps
pub mod actions;
/// Run configuration
pub mod config;
/// Automation driver capability surface
pub mod driver;
/// Assertion steps
pub mod expectations;
/// Element locators
pub mod locator;
/// Tracing subscriber setup
pub mod logging;
/// In-memory automation backend
#[cfg(feature = "mock")]
#[allow(clippy::missing_errors_doc, clippy::must_use_candidate)]
pub mod mock;
/// Sequential step composition
pub mod pipeline;
/// Element resolution
pub mod resolver;
mod result;
/// Declarative YAML scenarios
#[allow(clippy::missing_errors_doc)]
pub mod scenario;
/// The step contract
pub mod step;
/// Wait steps
pub mod wait;

pub use actions::{
    clear_text, find, long_press, multi_tap, reload_app, replace_text, scroll, scroll_to, swipe,
    tap, type_text, Action, ActionStep, FindStep, ReloadStep,
};
pub use config::FlowConfig;
pub use driver::{
    AutomationContext, Direction, DriverResult, Edge, Element, ElementHandle, Expectation,
    LookupMode, Pending, SwipeSpeed,
};
pub use expectations::{
    does_not_exist, exists, has_id, has_text, has_value, is_not_visible, is_visible, Assertion,
    ExpectStep,
};
pub use locator::{Locator, Selector};
pub use logging::{init_logging, LoggingConfig};
pub use pipeline::Pipeline;
pub use resolver::{
    resolve_element, ElementLookup, ImmediateLookup, RepeatWhileLookup, WaitingLookup,
};
pub use result::{FlowError, FlowResult};
pub use scenario::{Scenario, ScenarioStep};
pub use step::{boxed, Step, StepOutput, StepRef};
pub use wait::{wait_for, wait_for_default, wait_while, WaitMode, WaitStep};

/// Everything needed to author and run pipelines
pub mod prelude {
    pub use super::actions::*;
    pub use super::config::*;
    pub use super::driver::*;
    pub use super::expectations::*;
    pub use super::locator::*;
    pub use super::logging::*;
    pub use super::pipeline::*;
    pub use super::result::*;
    pub use super::scenario::*;
    pub use super::step::*;
    pub use super::wait::*;
    pub use crate::pipeline;
    pub use std::time::Duration;
}
