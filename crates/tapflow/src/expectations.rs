//! Assertion steps.
//!
//! Same shape as gestures: the assertion resolves its element through the
//! lookup it was given, asks that lookup for an [`Expectation`] on the
//! element, and hands the driver's outcome on as the pending result. Under
//! a wait the lookup builds the assertion through the context's
//! wait-capable builder, whether the element was found or carried.

use crate::driver::{AutomationContext, DriverResult, Expectation};
use crate::locator::Locator;
use crate::resolver::{resolve_element, ElementLookup};
use crate::result::FlowResult;
use crate::step::{Step, StepOutput};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// An expectation delegated 1:1 to the driver's assertion builder.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "expect", content = "value", rename_all = "snake_case")]
pub enum Assertion {
    /// Element is visible
    Visible,
    /// Element is not visible
    NotVisible,
    /// Element exists
    Exists,
    /// Element does not exist
    NotExists,
    /// Element shows this text
    Text(String),
    /// Element carries this test ID
    Id(String),
    /// Element reports this value
    Value(String),
}

impl Assertion {
    /// Driver operation name
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Visible => "to_be_visible",
            Self::NotVisible => "to_be_not_visible",
            Self::Exists => "to_exist",
            Self::NotExists => "to_not_exist",
            Self::Text(_) => "to_have_text",
            Self::Id(_) => "to_have_id",
            Self::Value(_) => "to_have_value",
        }
    }

    /// Dispatch this assertion to an expectation builder
    pub async fn check(&self, expectation: &dyn Expectation) -> FlowResult<DriverResult> {
        match self {
            Self::Visible => expectation.to_be_visible().await,
            Self::NotVisible => expectation.to_be_not_visible().await,
            Self::Exists => expectation.to_exist().await,
            Self::NotExists => expectation.to_not_exist().await,
            Self::Text(text) => expectation.to_have_text(text).await,
            Self::Id(id) => expectation.to_have_id(id).await,
            Self::Value(value) => expectation.to_have_value(value).await,
        }
    }
}

impl fmt::Display for Assertion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(v) | Self::Id(v) | Self::Value(v) => write!(f, "{}({v:?})", self.name()),
            _ => write!(f, "{}()", self.name()),
        }
    }
}

/// Step that resolves an element and asserts on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpectStep {
    assertion: Assertion,
    locator: Option<Locator>,
}

impl ExpectStep {
    /// Assert on the carried-forward element
    #[must_use]
    pub const fn new(assertion: Assertion) -> Self {
        Self {
            assertion,
            locator: None,
        }
    }

    /// Assert on the element found by `locator` instead
    #[must_use]
    pub fn on(mut self, locator: Locator) -> Self {
        self.locator = Some(locator);
        self
    }

    /// The assertion
    #[must_use]
    pub const fn assertion(&self) -> &Assertion {
        &self.assertion
    }

    /// The explicit locator, if any
    #[must_use]
    pub const fn locator(&self) -> Option<&Locator> {
        self.locator.as_ref()
    }
}

#[async_trait]
impl Step for ExpectStep {
    fn label(&self) -> String {
        match &self.locator {
            Some(locator) => format!("expect({locator}).{}", self.assertion),
            None => format!("expect().{}", self.assertion),
        }
    }

    async fn run(
        &self,
        previous: StepOutput,
        ctx: &dyn AutomationContext,
        lookup: &dyn ElementLookup,
    ) -> FlowResult<StepOutput> {
        let element =
            resolve_element(self.assertion.name(), self.locator.as_ref(), &previous, lookup)
                .await?;
        debug!(assertion = %self.assertion, waiting = element.is_waiting(), "checking expectation");
        let expectation = lookup.expect(ctx, &element);
        let pending = self.assertion.check(expectation.as_ref()).await?;
        Ok(StepOutput::acted(element, pending))
    }
}

/// Element is visible
#[must_use]
pub const fn is_visible() -> ExpectStep {
    ExpectStep::new(Assertion::Visible)
}

/// Element is not visible
#[must_use]
pub const fn is_not_visible() -> ExpectStep {
    ExpectStep::new(Assertion::NotVisible)
}

/// Element exists
#[must_use]
pub const fn exists() -> ExpectStep {
    ExpectStep::new(Assertion::Exists)
}

/// Element does not exist
#[must_use]
pub const fn does_not_exist() -> ExpectStep {
    ExpectStep::new(Assertion::NotExists)
}

/// Element shows `text`
#[must_use]
pub fn has_text(text: impl Into<String>) -> ExpectStep {
    ExpectStep::new(Assertion::Text(text.into()))
}

/// Element carries test ID `id`
#[must_use]
pub fn has_id(id: impl Into<String>) -> ExpectStep {
    ExpectStep::new(Assertion::Id(id.into()))
}

/// Element reports `value`
#[must_use]
pub fn has_value(value: impl Into<String>) -> ExpectStep {
    ExpectStep::new(Assertion::Value(value.into()))
}
