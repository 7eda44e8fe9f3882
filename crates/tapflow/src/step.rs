//! The step contract shared by actions, assertions, waits and pipelines.

use crate::config::FlowConfig;
use crate::driver::{AutomationContext, DriverResult, ElementHandle};
use crate::resolver::{ElementLookup, ImmediateLookup};
use crate::result::FlowResult;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

/// Output of a step, consumed as the `previous` input of the next one.
///
/// `element` is the most recently resolved target; `pending` is the most
/// recent driver outcome, not necessarily settled yet.
#[derive(Debug, Clone, Default)]
pub struct StepOutput {
    /// Most recently resolved element
    pub element: Option<ElementHandle>,
    /// Most recent driver outcome
    pub pending: Option<DriverResult>,
}

impl StepOutput {
    /// Output with neither element nor pending result
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Seed a run with an already-resolved element
    #[must_use]
    pub fn from_element(element: ElementHandle) -> Self {
        Self {
            element: Some(element),
            pending: None,
        }
    }

    /// Element plus the outcome of acting on it
    #[must_use]
    pub fn acted(element: ElementHandle, pending: DriverResult) -> Self {
        Self {
            element: Some(element),
            pending: Some(pending),
        }
    }

    /// Settle the pending outcome, if any
    pub async fn settle(&self) -> FlowResult<()> {
        match &self.pending {
            Some(pending) => pending.settle().await,
            None => Ok(()),
        }
    }
}

impl From<ElementHandle> for StepOutput {
    fn from(element: ElementHandle) -> Self {
        Self::from_element(element)
    }
}

/// A composable unit of work.
///
/// `run` receives the lookup it must use when it resolves an explicit
/// locator. Callers normally go through [`Step::execute`], which passes
/// the context's immediate lookup; wait steps substitute their own.
#[async_trait]
pub trait Step: Send + Sync + fmt::Debug {
    /// Short label for logs and error messages
    fn label(&self) -> String;

    /// Run with an explicit element lookup
    async fn run(
        &self,
        previous: StepOutput,
        ctx: &dyn AutomationContext,
        lookup: &dyn ElementLookup,
    ) -> FlowResult<StepOutput>;

    /// Run with the context's immediate lookup
    async fn execute(
        &self,
        previous: StepOutput,
        ctx: &dyn AutomationContext,
    ) -> FlowResult<StepOutput> {
        let lookup = ImmediateLookup::new(ctx);
        self.run(previous, ctx, &lookup).await
    }

    /// Copy of this step with run settings from `config` applied.
    ///
    /// `None` means the step has no settings of its own.
    fn reconfigured(&self, _config: &FlowConfig) -> Option<StepRef> {
        None
    }
}

/// Shared, type-erased step
pub type StepRef = Arc<dyn Step>;

#[async_trait]
impl<S: Step + ?Sized> Step for Arc<S> {
    fn label(&self) -> String {
        (**self).label()
    }

    async fn run(
        &self,
        previous: StepOutput,
        ctx: &dyn AutomationContext,
        lookup: &dyn ElementLookup,
    ) -> FlowResult<StepOutput> {
        (**self).run(previous, ctx, lookup).await
    }

    fn reconfigured(&self, config: &FlowConfig) -> Option<StepRef> {
        (**self).reconfigured(config)
    }
}

#[async_trait]
impl<S: Step + ?Sized> Step for Box<S> {
    fn label(&self) -> String {
        (**self).label()
    }

    async fn run(
        &self,
        previous: StepOutput,
        ctx: &dyn AutomationContext,
        lookup: &dyn ElementLookup,
    ) -> FlowResult<StepOutput> {
        (**self).run(previous, ctx, lookup).await
    }

    fn reconfigured(&self, config: &FlowConfig) -> Option<StepRef> {
        (**self).reconfigured(config)
    }
}

/// Wrap a step for storage in a pipeline
pub fn boxed<S: Step + 'static>(step: S) -> StepRef {
    Arc::new(step)
}

#[cfg(all(test, feature = "mock"))]
mod tests {
    use super::*;
    use crate::mock::MockDevice;
    use crate::Locator;

    #[tokio::test]
    async fn test_empty_output() {
        let out = StepOutput::empty();
        assert!(out.element.is_none());
        assert!(out.pending.is_none());
        out.settle().await.unwrap();
    }

    #[tokio::test]
    async fn test_from_element_keeps_identity() {
        let device = MockDevice::new();
        let el = device.register(Locator::by_id("x"));
        let out = StepOutput::from(device.handle(&el));
        assert!(out.element.unwrap().same_as(&device.handle(&el)));
    }
}
