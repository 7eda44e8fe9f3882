//! Element resolution: explicit locator or carry-forward.
//!
//! A step either names its target with a locator, in which case the
//! lookup it was given is always queried, or it omits one and acts on the
//! element the previous step resolved. Nothing is cached: UI state may
//! have changed between two steps naming the same locator.

use crate::driver::{AutomationContext, DriverResult, ElementHandle, Expectation};
use crate::locator::Locator;
use crate::result::{FlowError, FlowResult};
use crate::step::StepOutput;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::trace;

/// Strategy for turning a locator into an element handle.
///
/// The lookup also decides how assertions on the resolved element are
/// built, so a carried-forward element is awaited the same way as one
/// found by locator.
#[async_trait]
pub trait ElementLookup: Send + Sync {
    /// Find the element for `locator`
    async fn find(&self, locator: &Locator) -> FlowResult<ElementHandle>;

    /// Assertion builder for `element`; checked on the spot by default
    fn expect<'a>(
        &self,
        ctx: &'a dyn AutomationContext,
        element: &ElementHandle,
    ) -> Box<dyn Expectation + 'a> {
        ctx.expect(element)
    }
}

/// Context's standard, immediate lookup
#[derive(Clone, Copy)]
pub struct ImmediateLookup<'a> {
    ctx: &'a dyn AutomationContext,
}

impl<'a> ImmediateLookup<'a> {
    /// Borrow the context's immediate lookup
    pub fn new(ctx: &'a dyn AutomationContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl ElementLookup for ImmediateLookup<'_> {
    async fn find(&self, locator: &Locator) -> FlowResult<ElementHandle> {
        self.ctx.lookup_element(locator).await
    }
}

impl std::fmt::Debug for ImmediateLookup<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ImmediateLookup")
    }
}

/// Context's wait-capable lookup
#[derive(Clone, Copy)]
pub struct WaitingLookup<'a> {
    ctx: &'a dyn AutomationContext,
}

impl<'a> WaitingLookup<'a> {
    /// Borrow the context's wait-capable lookup
    pub fn new(ctx: &'a dyn AutomationContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl ElementLookup for WaitingLookup<'_> {
    async fn find(&self, locator: &Locator) -> FlowResult<ElementHandle> {
        self.ctx.wait_for_lookup(locator).await
    }

    fn expect<'a>(
        &self,
        ctx: &'a dyn AutomationContext,
        element: &ElementHandle,
    ) -> Box<dyn Expectation + 'a> {
        ctx.wait_for(element)
    }
}

impl std::fmt::Debug for WaitingLookup<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("WaitingLookup")
    }
}

/// Lookup wired to a pending expectation's repeat-while primitive.
///
/// Counts how often it was queried so the caller can tell whether the
/// condition step actually went through it.
#[derive(Debug)]
pub struct RepeatWhileLookup<'a> {
    pending: &'a DriverResult,
    uses: AtomicUsize,
}

impl<'a> RepeatWhileLookup<'a> {
    /// Wire lookups to `pending.while_element`
    pub fn new(pending: &'a DriverResult) -> Self {
        Self {
            pending,
            uses: AtomicUsize::new(0),
        }
    }

    /// Number of lookups served
    pub fn uses(&self) -> usize {
        self.uses.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ElementLookup for RepeatWhileLookup<'_> {
    async fn find(&self, locator: &Locator) -> FlowResult<ElementHandle> {
        self.uses.fetch_add(1, Ordering::SeqCst);
        self.pending.while_element(locator).await
    }
}

/// Decide which element a step acts on.
///
/// With a locator, `lookup` is always queried and `previous` is ignored.
/// Without one, the previous step's element is returned unchanged.
pub async fn resolve_element(
    step: &str,
    locator: Option<&Locator>,
    previous: &StepOutput,
    lookup: &dyn ElementLookup,
) -> FlowResult<ElementHandle> {
    match locator {
        Some(locator) => {
            trace!(step, %locator, "resolving element by locator");
            lookup.find(locator).await
        }
        None => previous
            .element
            .clone()
            .ok_or_else(|| FlowError::MissingElement {
                step: step.to_string(),
            }),
    }
}
