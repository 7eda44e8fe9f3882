//! Declarative scenarios.
//!
//! A scenario is a YAML document describing a pipeline, so flows can be
//! kept next to the app they drive instead of in Rust code:
//!
//! ```yaml
//! name: login
//! description: Sign in with a known account
//! steps:
//!   - type: find
//!     locator:
//!       selector: { by: id, value: email }
//!   - type: type_text
//!     text: ada@example.com
//!   - type: tap
//!     locator:
//!       selector: { by: id, value: submit }
//!   - type: wait_for
//!     timeout_ms: 2000
//!     expectation:
//!       type: expect
//!       check: { expect: visible }
//!       locator:
//!         selector: { by: text, value: Welcome }
//! ```

use crate::actions::{Action, ActionStep, FindStep, ReloadStep};
use crate::config::FlowConfig;
use crate::driver::{Direction, Edge, SwipeSpeed};
use crate::expectations::{Assertion, ExpectStep};
use crate::locator::Locator;
use crate::pipeline::Pipeline;
use crate::result::{FlowError, FlowResult};
use crate::step::StepRef;
use crate::wait::{WaitMode, WaitStep};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// A named, validated list of steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario name
    pub name: String,
    /// Human-readable description
    #[serde(default)]
    pub description: String,
    /// Steps in execution order
    pub steps: Vec<ScenarioStep>,
}

/// One step of a scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScenarioStep {
    /// Look up an element
    Find {
        /// Element to find
        locator: Locator,
    },
    /// Reload the app
    ReloadApp,
    /// Tap once
    Tap {
        /// Target, or the carried element
        #[serde(default)]
        locator: Option<Locator>,
    },
    /// Press and hold
    LongPress {
        /// Target, or the carried element
        #[serde(default)]
        locator: Option<Locator>,
    },
    /// Tap several times
    MultiTap {
        /// Number of taps
        times: u32,
        /// Target, or the carried element
        #[serde(default)]
        locator: Option<Locator>,
    },
    /// Type at the cursor
    TypeText {
        /// Text to type
        text: String,
        /// Target, or the carried element
        #[serde(default)]
        locator: Option<Locator>,
    },
    /// Replace field content
    ReplaceText {
        /// Replacement text
        text: String,
        /// Target, or the carried element
        #[serde(default)]
        locator: Option<Locator>,
    },
    /// Clear field content
    ClearText {
        /// Target, or the carried element
        #[serde(default)]
        locator: Option<Locator>,
    },
    /// Scroll by a distance
    Scroll {
        /// Distance in points
        distance: f64,
        /// Scroll direction
        direction: Direction,
        /// Target, or the carried element
        #[serde(default)]
        locator: Option<Locator>,
    },
    /// Scroll to an edge
    ScrollTo {
        /// Edge to reach
        edge: Edge,
        /// Target, or the carried element
        #[serde(default)]
        locator: Option<Locator>,
    },
    /// Swipe gesture
    Swipe {
        /// Swipe direction
        direction: Direction,
        /// Swipe speed
        #[serde(default)]
        speed: SwipeSpeed,
        /// Screen fraction to travel
        #[serde(default)]
        percentage: Option<f64>,
        /// Target, or the carried element
        #[serde(default)]
        locator: Option<Locator>,
    },
    /// Assert on an element
    Expect {
        /// Assertion to check
        check: Assertion,
        /// Target, or the carried element
        #[serde(default)]
        locator: Option<Locator>,
    },
    /// Poll an expectation until it holds
    WaitFor {
        /// Expectation to poll
        expectation: Box<ScenarioStep>,
        /// Deadline; the configured default when omitted
        #[serde(default)]
        timeout_ms: Option<u64>,
    },
    /// Repeat a gesture while an expectation does not hold
    WaitWhile {
        /// Expectation to satisfy
        expectation: Box<ScenarioStep>,
        /// Gesture to repeat; must name its target
        condition: Box<ScenarioStep>,
    },
    /// Nested pipeline
    Pipeline {
        /// Nested steps
        #[serde(default)]
        steps: Vec<ScenarioStep>,
    },
}

impl ScenarioStep {
    /// Gesture step that names its own target
    const fn is_targeted_gesture(&self) -> bool {
        matches!(
            self,
            Self::Tap { locator: Some(_) }
                | Self::LongPress { locator: Some(_) }
                | Self::MultiTap { locator: Some(_), .. }
                | Self::TypeText { locator: Some(_), .. }
                | Self::ReplaceText { locator: Some(_), .. }
                | Self::ClearText { locator: Some(_) }
                | Self::Scroll { locator: Some(_), .. }
                | Self::ScrollTo { locator: Some(_), .. }
                | Self::Swipe { locator: Some(_), .. }
        )
    }

    /// Whether running this step leaves a pending driver result behind
    fn produces_pending(&self) -> bool {
        match self {
            Self::Find { .. } => false,
            Self::Pipeline { steps } => steps.iter().any(Self::produces_pending),
            _ => true,
        }
    }

    fn validate(&self, path: &str) -> FlowResult<()> {
        match self {
            Self::MultiTap { times: 0, .. } => {
                Err(scenario_error(path, "multi_tap count must be at least 1"))
            }
            Self::Swipe {
                percentage: Some(p),
                ..
            } if !(*p > 0.0 && *p <= 1.0) => Err(scenario_error(
                path,
                format!("swipe percentage {p} is outside (0, 1]"),
            )),
            Self::WaitFor {
                expectation,
                timeout_ms,
            } => {
                if *timeout_ms == Some(0) {
                    return Err(scenario_error(path, "wait_for timeout must be positive"));
                }
                if !expectation.produces_pending() {
                    return Err(scenario_error(
                        path,
                        "wait_for needs an expectation or gesture, not find",
                    ));
                }
                expectation.validate(&format!("{path}.expectation"))
            }
            Self::WaitWhile {
                expectation,
                condition,
            } => {
                if !expectation.produces_pending() {
                    return Err(scenario_error(
                        path,
                        "wait_while needs an expectation or gesture, not find",
                    ));
                }
                if !condition.is_targeted_gesture() {
                    return Err(scenario_error(
                        path,
                        "wait_while condition must be a gesture with a locator",
                    ));
                }
                expectation.validate(&format!("{path}.expectation"))?;
                condition.validate(&format!("{path}.condition"))
            }
            Self::Pipeline { steps } => validate_steps(steps, path),
            _ => Ok(()),
        }
    }

    /// Build the executable step, resolving default timeouts from `config`
    #[must_use]
    pub fn to_step(&self, config: &FlowConfig) -> StepRef {
        match self {
            Self::Find { locator } => Arc::new(FindStep::new().on(locator.clone())),
            Self::ReloadApp => Arc::new(ReloadStep),
            Self::Tap { locator } => gesture(Action::Tap, locator.as_ref()),
            Self::LongPress { locator } => gesture(Action::LongPress, locator.as_ref()),
            Self::MultiTap { times, locator } => {
                gesture(Action::MultiTap { times: *times }, locator.as_ref())
            }
            Self::TypeText { text, locator } => {
                gesture(Action::TypeText { text: text.clone() }, locator.as_ref())
            }
            Self::ReplaceText { text, locator } => {
                gesture(Action::ReplaceText { text: text.clone() }, locator.as_ref())
            }
            Self::ClearText { locator } => gesture(Action::ClearText, locator.as_ref()),
            Self::Scroll {
                distance,
                direction,
                locator,
            } => gesture(
                Action::Scroll {
                    distance: *distance,
                    direction: *direction,
                },
                locator.as_ref(),
            ),
            Self::ScrollTo { edge, locator } => {
                gesture(Action::ScrollTo { edge: *edge }, locator.as_ref())
            }
            Self::Swipe {
                direction,
                speed,
                percentage,
                locator,
            } => gesture(
                Action::Swipe {
                    direction: *direction,
                    speed: *speed,
                    percentage: *percentage,
                },
                locator.as_ref(),
            ),
            Self::Expect { check, locator } => {
                let step = ExpectStep::new(check.clone());
                match locator {
                    Some(locator) => Arc::new(step.on(locator.clone())),
                    None => Arc::new(step),
                }
            }
            Self::WaitFor {
                expectation,
                timeout_ms,
            } => {
                let timeout =
                    timeout_ms.map_or_else(|| config.default_timeout(), Duration::from_millis);
                Arc::new(WaitStep::new(
                    expectation.to_step(config),
                    WaitMode::Timeout(timeout),
                ))
            }
            Self::WaitWhile {
                expectation,
                condition,
            } => Arc::new(WaitStep::new(
                expectation.to_step(config),
                WaitMode::While(condition.to_step(config)),
            )),
            Self::Pipeline { steps } => Arc::new(compile(steps, config)),
        }
    }
}

fn gesture(action: Action, locator: Option<&Locator>) -> StepRef {
    let step = ActionStep::new(action);
    match locator {
        Some(locator) => Arc::new(step.on(locator.clone())),
        None => Arc::new(step),
    }
}

fn scenario_error(path: &str, message: impl std::fmt::Display) -> FlowError {
    FlowError::Scenario {
        message: format!("{path}: {message}"),
    }
}

fn validate_steps(steps: &[ScenarioStep], path: &str) -> FlowResult<()> {
    for (index, step) in steps.iter().enumerate() {
        step.validate(&format!("{path}[{index}]"))?;
    }
    Ok(())
}

fn compile(steps: &[ScenarioStep], config: &FlowConfig) -> Pipeline {
    Pipeline::from_steps(steps.iter().map(|s| s.to_step(config)).collect()).configured(config)
}

impl Scenario {
    /// Parse and validate a scenario from YAML
    pub fn from_yaml(yaml: &str) -> FlowResult<Self> {
        let scenario: Self = serde_yaml_ng::from_str(yaml)?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// Load a scenario file
    pub fn from_file(path: impl AsRef<Path>) -> FlowResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Check structural constraints that YAML typing cannot express
    pub fn validate(&self) -> FlowResult<()> {
        if self.name.trim().is_empty() {
            return Err(FlowError::Scenario {
                message: "scenario name must not be empty".to_string(),
            });
        }
        if self.steps.is_empty() {
            return Err(FlowError::Scenario {
                message: format!("scenario `{}` has no steps", self.name),
            });
        }
        validate_steps(&self.steps, "steps")
    }

    /// Compile into an executable pipeline
    #[must_use]
    pub fn to_pipeline(&self, config: &FlowConfig) -> Pipeline {
        compile(&self.steps, config)
    }
}
