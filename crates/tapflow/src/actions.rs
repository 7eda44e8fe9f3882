//! Action steps: gestures, element lookup and device control.
//!
//! Every gesture constructor takes only the gesture's own arguments. The
//! target is attached separately with [`ActionStep::on`]; without it the
//! step acts on the element carried forward from the previous step.
//!
//! ```ignore
//! let flow = pipeline![
//!     find(Locator::by_id("email")),
//!     type_text("ada@example.com"),
//!     tap().on(Locator::by_id("submit")),
//! ];
//! ```

use crate::driver::{AutomationContext, Direction, DriverResult, Edge, ElementHandle, SwipeSpeed};
use crate::locator::Locator;
use crate::resolver::{resolve_element, ElementLookup};
use crate::result::FlowResult;
use crate::step::{Step, StepOutput};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// A gesture delegated 1:1 to the driver's element surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "gesture", rename_all = "snake_case")]
pub enum Action {
    /// Tap once
    Tap,
    /// Press and hold
    LongPress,
    /// Tap several times
    MultiTap {
        /// Number of taps
        times: u32,
    },
    /// Type at the cursor
    TypeText {
        /// Text to type
        text: String,
    },
    /// Replace field content
    ReplaceText {
        /// Replacement text
        text: String,
    },
    /// Clear field content
    ClearText,
    /// Scroll by a distance
    Scroll {
        /// Distance in points
        distance: f64,
        /// Scroll direction
        direction: Direction,
    },
    /// Scroll to an edge
    ScrollTo {
        /// Edge to reach
        edge: Edge,
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
    },
}

impl Action {
    /// Driver operation name
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Tap => "tap",
            Self::LongPress => "long_press",
            Self::MultiTap { .. } => "multi_tap",
            Self::TypeText { .. } => "type_text",
            Self::ReplaceText { .. } => "replace_text",
            Self::ClearText => "clear_text",
            Self::Scroll { .. } => "scroll",
            Self::ScrollTo { .. } => "scroll_to",
            Self::Swipe { .. } => "swipe",
        }
    }

    /// Dispatch this gesture to `element`
    pub async fn perform(&self, element: &ElementHandle) -> FlowResult<DriverResult> {
        match self {
            Self::Tap => element.tap().await,
            Self::LongPress => element.long_press().await,
            Self::MultiTap { times } => element.multi_tap(*times).await,
            Self::TypeText { text } => element.type_text(text).await,
            Self::ReplaceText { text } => element.replace_text(text).await,
            Self::ClearText => element.clear_text().await,
            Self::Scroll {
                distance,
                direction,
            } => element.scroll(*distance, *direction).await,
            Self::ScrollTo { edge } => element.scroll_to(*edge).await,
            Self::Swipe {
                direction,
                speed,
                percentage,
            } => element.swipe(*direction, *speed, *percentage).await,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tap | Self::LongPress | Self::ClearText => write!(f, "{}()", self.name()),
            Self::MultiTap { times } => write!(f, "multi_tap({times})"),
            Self::TypeText { text } => write!(f, "type_text({text:?})"),
            Self::ReplaceText { text } => write!(f, "replace_text({text:?})"),
            Self::Scroll {
                distance,
                direction,
            } => write!(f, "scroll({distance}, {direction})"),
            Self::ScrollTo { edge } => write!(f, "scroll_to({edge})"),
            Self::Swipe {
                direction,
                speed,
                percentage,
            } => match percentage {
                Some(p) => write!(f, "swipe({direction}, {speed}, {p})"),
                None => write!(f, "swipe({direction}, {speed})"),
            },
        }
    }
}

/// Step that resolves an element and performs a gesture on it.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionStep {
    action: Action,
    locator: Option<Locator>,
}

impl ActionStep {
    /// Gesture on the carried-forward element
    #[must_use]
    pub const fn new(action: Action) -> Self {
        Self {
            action,
            locator: None,
        }
    }

    /// Target the element found by `locator` instead
    #[must_use]
    pub fn on(mut self, locator: Locator) -> Self {
        self.locator = Some(locator);
        self
    }

    /// Set swipe speed; no effect on other gestures
    #[must_use]
    pub fn speed(mut self, value: SwipeSpeed) -> Self {
        if let Action::Swipe { speed, .. } = &mut self.action {
            *speed = value;
        }
        self
    }

    /// Set swipe travel fraction; no effect on other gestures
    #[must_use]
    pub fn percentage(mut self, value: f64) -> Self {
        if let Action::Swipe { percentage, .. } = &mut self.action {
            *percentage = Some(value);
        }
        self
    }

    /// The gesture
    #[must_use]
    pub const fn action(&self) -> &Action {
        &self.action
    }

    /// The explicit locator, if any
    #[must_use]
    pub const fn locator(&self) -> Option<&Locator> {
        self.locator.as_ref()
    }
}

#[async_trait]
impl Step for ActionStep {
    fn label(&self) -> String {
        match &self.locator {
            Some(locator) => format!("{} on {locator}", self.action),
            None => self.action.to_string(),
        }
    }

    async fn run(
        &self,
        previous: StepOutput,
        _ctx: &dyn AutomationContext,
        lookup: &dyn ElementLookup,
    ) -> FlowResult<StepOutput> {
        let element =
            resolve_element(self.action.name(), self.locator.as_ref(), &previous, lookup).await?;
        debug!(action = %self.action, "performing gesture");
        let pending = self.action.perform(&element).await?;
        Ok(StepOutput::acted(element, pending))
    }
}

/// Step that only resolves an element, to seed later locator-less steps.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindStep {
    locator: Option<Locator>,
}

impl FindStep {
    /// Re-emit the carried-forward element
    #[must_use]
    pub const fn new() -> Self {
        Self { locator: None }
    }

    /// Find the element for `locator` instead
    #[must_use]
    pub fn on(mut self, locator: Locator) -> Self {
        self.locator = Some(locator);
        self
    }
}

#[async_trait]
impl Step for FindStep {
    fn label(&self) -> String {
        match &self.locator {
            Some(locator) => format!("find({locator})"),
            None => "find()".to_string(),
        }
    }

    async fn run(
        &self,
        previous: StepOutput,
        _ctx: &dyn AutomationContext,
        lookup: &dyn ElementLookup,
    ) -> FlowResult<StepOutput> {
        let element = resolve_element("find", self.locator.as_ref(), &previous, lookup).await?;
        Ok(StepOutput {
            element: Some(element),
            pending: previous.pending,
        })
    }
}

/// Step that reloads the application runtime.
///
/// Ignores its input entirely; after a reload there is no current element.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReloadStep;

#[async_trait]
impl Step for ReloadStep {
    fn label(&self) -> String {
        "reload_app()".to_string()
    }

    async fn run(
        &self,
        _previous: StepOutput,
        ctx: &dyn AutomationContext,
        _lookup: &dyn ElementLookup,
    ) -> FlowResult<StepOutput> {
        let pending = ctx.reload_app().await?;
        Ok(StepOutput {
            element: None,
            pending: Some(pending),
        })
    }
}

/// Resolve `locator` without acting on it
#[must_use]
pub fn find(locator: Locator) -> FindStep {
    FindStep::new().on(locator)
}

/// Reload the application runtime
#[must_use]
pub const fn reload_app() -> ReloadStep {
    ReloadStep
}

/// Tap once
#[must_use]
pub const fn tap() -> ActionStep {
    ActionStep::new(Action::Tap)
}

/// Press and hold
#[must_use]
pub const fn long_press() -> ActionStep {
    ActionStep::new(Action::LongPress)
}

/// Tap `times` times
#[must_use]
pub const fn multi_tap(times: u32) -> ActionStep {
    ActionStep::new(Action::MultiTap { times })
}

/// Type `text` at the cursor
#[must_use]
pub fn type_text(text: impl Into<String>) -> ActionStep {
    ActionStep::new(Action::TypeText { text: text.into() })
}

/// Replace the field content with `text`
#[must_use]
pub fn replace_text(text: impl Into<String>) -> ActionStep {
    ActionStep::new(Action::ReplaceText { text: text.into() })
}

/// Clear the field
#[must_use]
pub const fn clear_text() -> ActionStep {
    ActionStep::new(Action::ClearText)
}

/// Scroll by `distance` points
#[must_use]
pub fn scroll(distance: f64, direction: Direction) -> ActionStep {
    ActionStep::new(Action::Scroll {
        distance,
        direction,
    })
}

/// Scroll until `edge`
#[must_use]
pub const fn scroll_to(edge: Edge) -> ActionStep {
    ActionStep::new(Action::ScrollTo { edge })
}

/// Swipe toward `direction` at the default speed and distance
#[must_use]
pub const fn swipe(direction: Direction) -> ActionStep {
    ActionStep::new(Action::Swipe {
        direction,
        speed: SwipeSpeed::Fast,
        percentage: None,
    })
}
