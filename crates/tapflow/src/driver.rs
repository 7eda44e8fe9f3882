//! Automation driver capability surface.
//!
//! Tapflow does not find elements or simulate gestures itself. It consumes
//! the capabilities below, implemented by an external automation backend:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │  AutomationContext (one per pipeline run, passed by reference)   │
//! ├──────────────────────────────────────────────────────────────────┤
//! │  lookup_element(locator)   ──► ElementHandle ──► tap/scroll/...  │
//! │  wait_for_lookup(locator)  ──► ElementHandle (waiting)           │
//! │  expect(element)           ──► Expectation  ──► to_be_visible... │
//! │  wait_for(element)         ──► Expectation (deferred)            │
//! │  reload_app()              ──► DriverResult                      │
//! │                                                                  │
//! │  DriverResult ──► with_timeout(ms) / while_element(locator)      │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every capability is async: awaiting it dispatches the operation to the
//! device and surfaces failures as [`FlowError`](crate::FlowError). The
//! returned [`DriverResult`] is the driver's deferred handle for that
//! operation, which a wait step may still refine before it is settled.

use crate::locator::Locator;
use crate::result::FlowResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Scroll and swipe direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Toward the top of the screen
    Up,
    /// Toward the bottom of the screen
    Down,
    /// Toward the left edge
    Left,
    /// Toward the right edge
    Right,
}

impl Direction {
    /// Lowercase name used by drivers
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scroll container edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Edge {
    /// Top edge
    Top,
    /// Bottom edge
    Bottom,
    /// Left edge
    Left,
    /// Right edge
    Right,
}

impl Edge {
    /// Lowercase name used by drivers
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::Bottom => "bottom",
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Swipe gesture speed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwipeSpeed {
    /// Quick flick
    #[default]
    Fast,
    /// Slow drag
    Slow,
}

impl SwipeSpeed {
    /// Lowercase name used by drivers
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Fast => "fast",
            Self::Slow => "slow",
        }
    }
}

impl fmt::Display for SwipeSpeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Gesture surface of a native element.
#[async_trait]
pub trait Element: Send + Sync + fmt::Debug {
    /// Tap once
    async fn tap(&self) -> FlowResult<DriverResult>;

    /// Press and hold
    async fn long_press(&self) -> FlowResult<DriverResult>;

    /// Tap `times` times in quick succession
    async fn multi_tap(&self, times: u32) -> FlowResult<DriverResult>;

    /// Type text at the cursor
    async fn type_text(&self, text: &str) -> FlowResult<DriverResult>;

    /// Replace the whole field content
    async fn replace_text(&self, text: &str) -> FlowResult<DriverResult>;

    /// Clear the field
    async fn clear_text(&self) -> FlowResult<DriverResult>;

    /// Scroll by `distance` points
    async fn scroll(&self, distance: f64, direction: Direction) -> FlowResult<DriverResult>;

    /// Scroll until `edge` is reached
    async fn scroll_to(&self, edge: Edge) -> FlowResult<DriverResult>;

    /// Swipe; `percentage` is the screen fraction to travel, `None` for the driver default
    async fn swipe(
        &self,
        direction: Direction,
        speed: SwipeSpeed,
        percentage: Option<f64>,
    ) -> FlowResult<DriverResult>;
}

/// How a handle was obtained from the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LookupMode {
    /// Looked up immediately; expectations are evaluated on the spot
    #[default]
    Immediate,
    /// Looked up through the wait-capable path; expectations are deferred
    Waiting,
    /// Proxy produced by a repeat-while primitive
    RepeatWhile,
}

/// Opaque, cheap-to-clone reference to a driver element.
///
/// Equality of handles is reference identity: two handles are the same
/// element when they share the driver's allocation, whatever mode they
/// were looked up in.
#[derive(Clone)]
pub struct ElementHandle {
    inner: Arc<dyn Element>,
    mode: LookupMode,
}

impl ElementHandle {
    /// Wrap an element looked up immediately
    pub fn new(inner: Arc<dyn Element>) -> Self {
        Self {
            inner,
            mode: LookupMode::Immediate,
        }
    }

    /// Wrap an element looked up through the wait-capable path
    pub fn waiting(inner: Arc<dyn Element>) -> Self {
        Self {
            inner,
            mode: LookupMode::Waiting,
        }
    }

    /// Wrap a repeat-while proxy
    pub fn repeat_while(inner: Arc<dyn Element>) -> Self {
        Self {
            inner,
            mode: LookupMode::RepeatWhile,
        }
    }

    /// Lookup mode this handle came from
    #[must_use]
    pub const fn mode(&self) -> LookupMode {
        self.mode
    }

    /// Whether expectations on this handle should be deferred
    #[must_use]
    pub fn is_waiting(&self) -> bool {
        self.mode == LookupMode::Waiting
    }

    /// Reference identity
    #[must_use]
    pub fn same_as(&self, other: &Self) -> bool {
        Arc::as_ptr(&self.inner).cast::<()>() == Arc::as_ptr(&other.inner).cast::<()>()
    }

    /// Whether this handle wraps `element`
    #[must_use]
    pub fn wraps(&self, element: &Arc<dyn Element>) -> bool {
        Arc::as_ptr(&self.inner).cast::<()>() == Arc::as_ptr(element).cast::<()>()
    }
}

impl std::ops::Deref for ElementHandle {
    type Target = dyn Element;

    fn deref(&self) -> &Self::Target {
        self.inner.as_ref()
    }
}

impl fmt::Debug for ElementHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElementHandle")
            .field("element", &self.inner)
            .field("mode", &self.mode)
            .finish()
    }
}

/// Assertion builder returned by [`AutomationContext::expect`].
#[async_trait]
pub trait Expectation: Send + Sync {
    /// Element is visible on screen
    async fn to_be_visible(&self) -> FlowResult<DriverResult>;

    /// Element is not visible
    async fn to_be_not_visible(&self) -> FlowResult<DriverResult>;

    /// Element exists in the hierarchy
    async fn to_exist(&self) -> FlowResult<DriverResult>;

    /// Element does not exist
    async fn to_not_exist(&self) -> FlowResult<DriverResult>;

    /// Element shows `text`
    async fn to_have_text(&self, text: &str) -> FlowResult<DriverResult>;

    /// Element carries test ID `id`
    async fn to_have_id(&self, id: &str) -> FlowResult<DriverResult>;

    /// Element reports value `value`
    async fn to_have_value(&self, value: &str) -> FlowResult<DriverResult>;
}

/// Driver-side deferred outcome of an operation.
#[async_trait]
pub trait Pending: Send + Sync + fmt::Debug {
    /// Human-readable description of the operation chain
    fn describe(&self) -> String;

    /// Poll the underlying expectation until it holds or `timeout` elapses
    async fn with_timeout(&self, timeout: Duration) -> FlowResult<DriverResult>;

    /// Repeat-while primitive: an element proxy whose gesture is repeated
    /// while the underlying expectation does not hold
    async fn while_element(&self, locator: &Locator) -> FlowResult<ElementHandle>;

    /// Wait for the operation to finish
    async fn settle(&self) -> FlowResult<()>;
}

/// Opaque, cheap-to-clone handle to a driver outcome.
#[derive(Clone)]
pub struct DriverResult {
    inner: Arc<dyn Pending>,
}

impl DriverResult {
    /// Wrap a driver outcome
    pub fn new(inner: Arc<dyn Pending>) -> Self {
        Self { inner }
    }

    /// Reference identity
    #[must_use]
    pub fn same_as(&self, other: &Self) -> bool {
        Arc::as_ptr(&self.inner).cast::<()>() == Arc::as_ptr(&other.inner).cast::<()>()
    }
}

impl std::ops::Deref for DriverResult {
    type Target = dyn Pending;

    fn deref(&self) -> &Self::Target {
        self.inner.as_ref()
    }
}

impl fmt::Debug for DriverResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DriverResult")
            .field(&self.inner.describe())
            .finish()
    }
}

/// Capability bundle a pipeline run executes against.
///
/// Owned by the caller; every step borrows it for the duration of the run.
#[async_trait]
pub trait AutomationContext: Send + Sync {
    /// Immediate lookup; fails with `NotFound` when nothing matches
    async fn lookup_element(&self, locator: &Locator) -> FlowResult<ElementHandle>;

    /// Lookup that may block or poll until the element is available
    async fn wait_for_lookup(&self, locator: &Locator) -> FlowResult<ElementHandle>;

    /// Assertion builder for `element`
    fn expect<'a>(&'a self, element: &ElementHandle) -> Box<dyn Expectation + 'a>;

    /// Wait-capable assertion builder for `element`.
    ///
    /// Nothing is checked when the assertion is built; the returned
    /// [`DriverResult`] is resolved by `with_timeout` or `while_element`.
    fn wait_for<'a>(&'a self, element: &ElementHandle) -> Box<dyn Expectation + 'a>;

    /// Reload the application runtime
    async fn reload_app(&self) -> FlowResult<DriverResult>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Inert;

    #[async_trait]
    impl Pending for Inert {
        fn describe(&self) -> String {
            "inert".to_string()
        }

        async fn with_timeout(&self, _timeout: Duration) -> FlowResult<DriverResult> {
            Ok(DriverResult::new(Arc::new(Inert)))
        }

        async fn while_element(&self, locator: &Locator) -> FlowResult<ElementHandle> {
            Err(crate::FlowError::NotFound {
                locator: locator.to_string(),
            })
        }

        async fn settle(&self) -> FlowResult<()> {
            Ok(())
        }
    }

    mod gesture_arg_tests {
        use super::*;

        #[test]
        fn test_direction_names() {
            assert_eq!(Direction::Up.to_string(), "up");
            assert_eq!(Direction::Right.as_str(), "right");
        }

        #[test]
        fn test_edge_names() {
            assert_eq!(Edge::Bottom.to_string(), "bottom");
        }

        #[test]
        fn test_swipe_speed_default() {
            assert_eq!(SwipeSpeed::default(), SwipeSpeed::Fast);
            assert_eq!(SwipeSpeed::Slow.to_string(), "slow");
        }

        #[test]
        fn test_direction_serde() {
            let d: Direction = serde_json::from_str("\"down\"").unwrap();
            assert_eq!(d, Direction::Down);
        }
    }

    mod driver_result_tests {
        use super::*;

        #[test]
        fn test_identity() {
            let a = DriverResult::new(Arc::new(Inert));
            let b = a.clone();
            let c = DriverResult::new(Arc::new(Inert));
            assert!(a.same_as(&b));
            assert!(!a.same_as(&c));
        }

        #[test]
        fn test_debug_uses_description() {
            let a = DriverResult::new(Arc::new(Inert));
            assert_eq!(format!("{a:?}"), "DriverResult(\"inert\")");
        }
    }
}
