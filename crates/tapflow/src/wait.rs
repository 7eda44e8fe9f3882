//! Wait steps: poll an expectation through the driver.
//!
//! A wait step never loops by itself. It re-runs its inner expectation with
//! the context's wait-capable lookup, then hands the resulting pending
//! handle to the driver's timeout or repeat-while primitive. Poll cadence
//! and backoff belong to the driver.
//!
//! ```ignore
//! // Poll until the banner shows up, for at most two seconds
//! wait_for(is_visible().on(Locator::by_id("banner")), Duration::from_secs(2));
//!
//! // Keep scrolling the list while the row is not visible
//! wait_while(
//!     is_visible().on(Locator::by_text("Row 40")),
//!     scroll(50.0, Direction::Down).on(Locator::by_id("list")),
//! );
//! ```

use crate::config::FlowConfig;
use crate::driver::AutomationContext;
use crate::resolver::{ElementLookup, RepeatWhileLookup, WaitingLookup};
use crate::result::{FlowError, FlowResult};
use crate::step::{Step, StepOutput, StepRef};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// How the pending expectation is finally resolved
#[derive(Debug, Clone)]
pub enum WaitMode {
    /// Poll until the expectation holds or the timeout elapses
    Timeout(Duration),
    /// Repeat the condition step's gesture while the expectation does not hold
    While(StepRef),
}

/// Step that retries an expectation through the driver.
#[derive(Debug, Clone)]
pub struct WaitStep {
    expectation: StepRef,
    mode: WaitMode,
}

impl WaitStep {
    /// Build a wait step around `expectation`
    pub fn new(expectation: StepRef, mode: WaitMode) -> Self {
        Self { expectation, mode }
    }

    /// The wrapped expectation step
    #[must_use]
    pub fn expectation(&self) -> &StepRef {
        &self.expectation
    }

    /// The resolution mode
    #[must_use]
    pub const fn mode(&self) -> &WaitMode {
        &self.mode
    }
}

#[async_trait]
impl Step for WaitStep {
    fn label(&self) -> String {
        match &self.mode {
            WaitMode::Timeout(timeout) => format!(
                "wait_for({}, {}ms)",
                self.expectation.label(),
                timeout.as_millis()
            ),
            WaitMode::While(condition) => format!(
                "wait_while({}, {})",
                self.expectation.label(),
                condition.label()
            ),
        }
    }

    async fn run(
        &self,
        previous: StepOutput,
        ctx: &dyn AutomationContext,
        _lookup: &dyn ElementLookup,
    ) -> FlowResult<StepOutput> {
        let waiting = WaitingLookup::new(ctx);
        let awaited = self.expectation.run(previous, ctx, &waiting).await?;
        let handle = awaited.pending.clone().ok_or_else(|| {
            FlowError::invalid_step(format!(
                "`{}` produced no driver result to wait on",
                self.expectation.label()
            ))
        })?;

        match &self.mode {
            WaitMode::Timeout(timeout) => {
                debug!(timeout_ms = timeout.as_millis() as u64, "waiting with timeout");
                let pending = handle.with_timeout(*timeout).await?;
                Ok(StepOutput {
                    element: awaited.element,
                    pending: Some(pending),
                })
            }
            WaitMode::While(condition) => {
                debug!(condition = %condition.label(), "waiting while condition repeats");
                let repeat = RepeatWhileLookup::new(&handle);
                let repeated = condition.run(awaited.clone(), ctx, &repeat).await?;
                if repeat.uses() == 0 {
                    return Err(FlowError::invalid_step(format!(
                        "wait_while condition `{}` must target its element with a locator",
                        condition.label()
                    )));
                }
                Ok(StepOutput {
                    element: awaited.element,
                    pending: repeated.pending,
                })
            }
        }
    }
}

/// Poll `expectation` until it holds or `timeout` elapses
pub fn wait_for<S: Step + 'static>(expectation: S, timeout: Duration) -> WaitStep {
    WaitStep::new(Arc::new(expectation), WaitMode::Timeout(timeout))
}

/// [`wait_for`] with the configured default timeout
pub fn wait_for_default<S: Step + 'static>(expectation: S, config: &FlowConfig) -> WaitStep {
    wait_for(expectation, config.default_timeout())
}

/// Repeat `condition` while `expectation` does not hold
pub fn wait_while<S, C>(expectation: S, condition: C) -> WaitStep
where
    S: Step + 'static,
    C: Step + 'static,
{
    WaitStep::new(
        Arc::new(expectation),
        WaitMode::While(Arc::new(condition)),
    )
}
