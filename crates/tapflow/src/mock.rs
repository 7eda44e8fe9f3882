//! In-memory automation backend.
//!
//! [`MockDevice`] implements [`AutomationContext`] over a table of
//! registered [`MockElement`]s. Gestures mutate element state, every lookup
//! is recorded in a call history, and waits are simulated with a fixed
//! poll budget so timing-sensitive flows stay deterministic.
//!
//! ```ignore
//! let device = MockDevice::new();
//! let toast = device.register(Locator::by_id("toast"));
//! toast.appear_after_polls(3);
//!
//! wait_for(is_visible().on(Locator::by_id("toast")), Duration::from_millis(500))
//!     .execute(StepOutput::empty(), &device)
//!     .await?;
//! ```

use crate::actions::Action;
use crate::driver::{
    AutomationContext, Direction, DriverResult, Edge, Element, ElementHandle, Expectation, Pending,
    SwipeSpeed,
};
use crate::expectations::Assertion;
use crate::locator::Locator;
use crate::result::{FlowError, FlowResult};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Simulated interval between two wait polls
pub const POLL_INTERVAL_MS: u64 = 50;

/// Default number of gesture repetitions a repeat-while allows
pub const DEFAULT_MAX_REPEATS: usize = 20;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Last scroll applied to an element
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scrolled {
    /// Scrolled by a distance
    By {
        /// Distance in points
        distance: f64,
        /// Scroll direction
        direction: Direction,
    },
    /// Scrolled to an edge
    ToEdge(Edge),
}

/// Last swipe applied to an element
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Swiped {
    /// Swipe direction
    pub direction: Direction,
    /// Swipe speed
    pub speed: SwipeSpeed,
    /// Screen fraction, if given
    pub percentage: Option<f64>,
}

/// Observable state of a [`MockElement`]
#[derive(Debug, Clone, PartialEq)]
pub struct MockState {
    /// Tapped at least once
    pub tapped: bool,
    /// Long-pressed at least once
    pub long_pressed: bool,
    /// Count of the last multi-tap
    pub tapped_times: Option<u32>,
    /// Field content
    pub text: String,
    /// Test ID reported to `to_have_id`
    pub id: Option<String>,
    /// Value reported to `to_have_value`
    pub value: Option<String>,
    /// Visible on screen
    pub visible: bool,
    /// Present in the hierarchy
    pub exists: bool,
    /// Last scroll
    pub scrolled: Option<Scrolled>,
    /// Last swipe
    pub swiped: Option<Swiped>,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            tapped: false,
            long_pressed: false,
            tapped_times: None,
            text: String::new(),
            id: None,
            value: None,
            visible: true,
            exists: true,
            scrolled: None,
            swiped: None,
        }
    }
}

/// Element registered on a [`MockDevice`].
#[derive(Debug)]
pub struct MockElement {
    locator: Locator,
    state: Mutex<MockState>,
    failing: Mutex<HashSet<String>>,
    hidden_for: Mutex<Option<u32>>,
    scrolls: AtomicUsize,
}

impl MockElement {
    /// Visible, existing element for `locator`
    #[must_use]
    pub fn new(locator: Locator) -> Self {
        Self {
            locator,
            state: Mutex::new(MockState::default()),
            failing: Mutex::new(HashSet::new()),
            hidden_for: Mutex::new(None),
            scrolls: AtomicUsize::new(0),
        }
    }

    /// Locator this element was registered under
    #[must_use]
    pub const fn locator(&self) -> &Locator {
        &self.locator
    }

    /// Snapshot of the current state
    #[must_use]
    pub fn state(&self) -> MockState {
        lock(&self.state).clone()
    }

    /// Number of scroll gestures received
    #[must_use]
    pub fn scroll_count(&self) -> usize {
        self.scrolls.load(Ordering::SeqCst)
    }

    /// Set the displayed text
    pub fn set_text(&self, text: impl Into<String>) {
        lock(&self.state).text = text.into();
    }

    /// Set the reported test ID
    pub fn set_id(&self, id: impl Into<String>) {
        lock(&self.state).id = Some(id.into());
    }

    /// Set the reported value
    pub fn set_value(&self, value: impl Into<String>) {
        lock(&self.state).value = Some(value.into());
    }

    /// Show or hide the element
    pub fn set_visible(&self, visible: bool) {
        lock(&self.state).visible = visible;
    }

    /// Add or remove the element from the hierarchy
    pub fn set_exists(&self, exists: bool) {
        lock(&self.state).exists = exists;
    }

    /// Make the named driver operation fail on this element
    pub fn fail_on(&self, operation: impl Into<String>) {
        lock(&self.failing).insert(operation.into());
    }

    /// Hide the element until it has been polled `polls` times
    pub fn appear_after_polls(&self, polls: u32) {
        *lock(&self.hidden_for) = (polls > 0).then_some(polls);
        let mut state = lock(&self.state);
        state.visible = polls == 0;
        state.exists = polls == 0;
    }

    /// Advance one simulated wait poll
    pub fn poll(&self) {
        let mut hidden_for = lock(&self.hidden_for);
        if let Some(remaining) = hidden_for.as_mut() {
            *remaining = remaining.saturating_sub(1);
            if *remaining == 0 {
                *hidden_for = None;
                let mut state = lock(&self.state);
                state.visible = true;
                state.exists = true;
            }
        }
    }

    /// Whether `assertion` currently holds for this element
    #[must_use]
    pub fn holds(&self, assertion: &Assertion) -> bool {
        let state = lock(&self.state);
        match assertion {
            Assertion::Visible => state.exists && state.visible,
            Assertion::NotVisible => !state.exists || !state.visible,
            Assertion::Exists => state.exists,
            Assertion::NotExists => !state.exists,
            Assertion::Text(text) => state.text == *text,
            Assertion::Id(id) => state.id.as_deref() == Some(id.as_str()),
            Assertion::Value(value) => state.value.as_deref() == Some(value.as_str()),
        }
    }

    fn apply(&self, action: &Action) -> FlowResult<String> {
        if lock(&self.failing).contains(action.name()) {
            return Err(FlowError::driver(
                action.name(),
                format!("rejected by {}", self.locator),
            ));
        }

        let mut state = lock(&self.state);
        match action {
            Action::Tap => state.tapped = true,
            Action::LongPress => state.long_pressed = true,
            Action::MultiTap { times } => state.tapped_times = Some(*times),
            Action::TypeText { text } => state.text.push_str(text),
            Action::ReplaceText { text } => state.text.clone_from(text),
            Action::ClearText => state.text.clear(),
            Action::Scroll {
                distance,
                direction,
            } => {
                state.scrolled = Some(Scrolled::By {
                    distance: *distance,
                    direction: *direction,
                });
                self.scrolls.fetch_add(1, Ordering::SeqCst);
            }
            Action::ScrollTo { edge } => {
                state.scrolled = Some(Scrolled::ToEdge(*edge));
                self.scrolls.fetch_add(1, Ordering::SeqCst);
            }
            Action::Swipe {
                direction,
                speed,
                percentage,
            } => {
                state.swiped = Some(Swiped {
                    direction: *direction,
                    speed: *speed,
                    percentage: *percentage,
                });
            }
        }
        Ok(gesture_description(action, &self.locator))
    }

    fn perform(&self, action: &Action) -> FlowResult<DriverResult> {
        let description = self.apply(action)?;
        Ok(MockPending::labelled(&description))
    }
}

fn gesture_description(action: &Action, locator: &Locator) -> String {
    let name = action.name();
    match action {
        Action::Tap | Action::LongPress | Action::ClearText => format!("{name}({locator})"),
        Action::MultiTap { times } => format!("{name}({locator}, {times})"),
        Action::TypeText { text } | Action::ReplaceText { text } => {
            format!("{name}({locator}, {text:?})")
        }
        Action::Scroll {
            distance,
            direction,
        } => format!("{name}({locator}, {distance}, {direction})"),
        Action::ScrollTo { edge } => format!("{name}({locator}, {edge})"),
        Action::Swipe {
            direction,
            speed,
            percentage: Some(p),
        } => format!("{name}({locator}, {direction}, {speed}, {p})"),
        Action::Swipe {
            direction, speed, ..
        } => format!("{name}({locator}, {direction}, {speed})"),
    }
}

#[async_trait]
impl Element for MockElement {
    async fn tap(&self) -> FlowResult<DriverResult> {
        self.perform(&Action::Tap)
    }

    async fn long_press(&self) -> FlowResult<DriverResult> {
        self.perform(&Action::LongPress)
    }

    async fn multi_tap(&self, times: u32) -> FlowResult<DriverResult> {
        self.perform(&Action::MultiTap { times })
    }

    async fn type_text(&self, text: &str) -> FlowResult<DriverResult> {
        self.perform(&Action::TypeText {
            text: text.to_string(),
        })
    }

    async fn replace_text(&self, text: &str) -> FlowResult<DriverResult> {
        self.perform(&Action::ReplaceText {
            text: text.to_string(),
        })
    }

    async fn clear_text(&self) -> FlowResult<DriverResult> {
        self.perform(&Action::ClearText)
    }

    async fn scroll(&self, distance: f64, direction: Direction) -> FlowResult<DriverResult> {
        self.perform(&Action::Scroll {
            distance,
            direction,
        })
    }

    async fn scroll_to(&self, edge: Edge) -> FlowResult<DriverResult> {
        self.perform(&Action::ScrollTo { edge })
    }

    async fn swipe(
        &self,
        direction: Direction,
        speed: SwipeSpeed,
        percentage: Option<f64>,
    ) -> FlowResult<DriverResult> {
        self.perform(&Action::Swipe {
            direction,
            speed,
            percentage,
        })
    }
}

/// An expectation as seen by the device
#[derive(Debug, Clone)]
pub struct MockCheck {
    /// Element the expectation was built for
    pub element: ElementHandle,
    /// Assertion requested
    pub assertion: Assertion,
}

#[derive(Debug)]
struct Shared {
    elements: Mutex<HashMap<Locator, Arc<MockElement>>>,
    history: Mutex<Vec<String>>,
    last_check: Mutex<Option<MockCheck>>,
    reloaded: AtomicBool,
    max_repeats: usize,
}

impl Shared {
    fn record(&self, entry: String) {
        lock(&self.history).push(entry);
    }

    fn find(&self, locator: &Locator) -> FlowResult<Arc<MockElement>> {
        lock(&self.elements)
            .get(locator)
            .cloned()
            .ok_or_else(|| FlowError::NotFound {
                locator: locator.to_string(),
            })
    }
}

/// Expectation a pending result still refers to
#[derive(Debug, Clone)]
struct Watch {
    shared: Arc<Shared>,
    element: Arc<MockElement>,
    assertion: Assertion,
    settled: bool,
}

impl Watch {
    fn holds(&self) -> bool {
        self.settled || self.element.holds(&self.assertion)
    }

    fn into_settled(mut self) -> Self {
        self.settled = true;
        self
    }
}

/// Deferred driver outcome produced by the mock.
#[derive(Debug)]
pub struct MockPending {
    description: String,
    watch: Option<Watch>,
}

impl MockPending {
    /// Settled outcome with a fixed description
    #[must_use]
    pub fn labelled(description: &str) -> DriverResult {
        DriverResult::new(Arc::new(Self {
            description: description.to_string(),
            watch: None,
        }))
    }

    fn watching(description: String, watch: Watch) -> DriverResult {
        DriverResult::new(Arc::new(Self {
            description,
            watch: Some(watch),
        }))
    }
}

#[async_trait]
impl Pending for MockPending {
    fn describe(&self) -> String {
        self.description.clone()
    }

    async fn with_timeout(&self, timeout: Duration) -> FlowResult<DriverResult> {
        let ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        let description = format!("{}.with_timeout({ms}ms)", self.description);
        let Some(watch) = &self.watch else {
            return Ok(Self::labelled(&description));
        };

        for _ in 0..ms / POLL_INTERVAL_MS {
            if watch.holds() {
                break;
            }
            watch.element.poll();
        }
        if watch.holds() {
            Ok(Self::watching(description, watch.clone().into_settled()))
        } else {
            Err(FlowError::Timeout { ms })
        }
    }

    async fn while_element(&self, locator: &Locator) -> FlowResult<ElementHandle> {
        let watch = self.watch.as_ref().ok_or_else(|| {
            FlowError::driver(
                "while_element",
                format!("`{}` has no expectation to repeat on", self.description),
            )
        })?;
        watch.shared.record(format!("while_element:{locator}"));
        let target = watch.shared.find(locator)?;
        Ok(ElementHandle::repeat_while(Arc::new(MockRepeat {
            target,
            watch: watch.clone(),
            description: self.description.clone(),
        })))
    }

    async fn settle(&self) -> FlowResult<()> {
        match &self.watch {
            Some(watch) if !watch.holds() => Err(FlowError::driver(
                watch.assertion.name(),
                format!("{} does not hold", self.description),
            )),
            _ => Ok(()),
        }
    }
}

/// Element proxy that repeats its gesture while an expectation fails
#[derive(Debug)]
struct MockRepeat {
    target: Arc<MockElement>,
    watch: Watch,
    description: String,
}

impl MockRepeat {
    fn repeat(&self, action: &Action) -> FlowResult<DriverResult> {
        let max_repeats = self.watch.shared.max_repeats;
        for _ in 0..max_repeats {
            if self.watch.holds() {
                break;
            }
            self.target.apply(action)?;
            self.watch.element.poll();
        }
        if !self.watch.holds() {
            return Err(FlowError::driver(
                action.name(),
                format!(
                    "{} still unmet after {max_repeats} repeats of {action}",
                    self.description
                ),
            ));
        }
        let description = format!(
            "{}.while({})",
            self.description,
            gesture_description(action, self.target.locator())
        );
        Ok(MockPending::watching(description, self.watch.clone().into_settled()))
    }
}

#[async_trait]
impl Element for MockRepeat {
    async fn tap(&self) -> FlowResult<DriverResult> {
        self.repeat(&Action::Tap)
    }

    async fn long_press(&self) -> FlowResult<DriverResult> {
        self.repeat(&Action::LongPress)
    }

    async fn multi_tap(&self, times: u32) -> FlowResult<DriverResult> {
        self.repeat(&Action::MultiTap { times })
    }

    async fn type_text(&self, text: &str) -> FlowResult<DriverResult> {
        self.repeat(&Action::TypeText {
            text: text.to_string(),
        })
    }

    async fn replace_text(&self, text: &str) -> FlowResult<DriverResult> {
        self.repeat(&Action::ReplaceText {
            text: text.to_string(),
        })
    }

    async fn clear_text(&self) -> FlowResult<DriverResult> {
        self.repeat(&Action::ClearText)
    }

    async fn scroll(&self, distance: f64, direction: Direction) -> FlowResult<DriverResult> {
        self.repeat(&Action::Scroll {
            distance,
            direction,
        })
    }

    async fn scroll_to(&self, edge: Edge) -> FlowResult<DriverResult> {
        self.repeat(&Action::ScrollTo { edge })
    }

    async fn swipe(
        &self,
        direction: Direction,
        speed: SwipeSpeed,
        percentage: Option<f64>,
    ) -> FlowResult<DriverResult> {
        self.repeat(&Action::Swipe {
            direction,
            speed,
            percentage,
        })
    }
}

struct MockExpectation {
    shared: Arc<Shared>,
    handle: ElementHandle,
    target: Option<Arc<MockElement>>,
    deferred: bool,
}

impl MockExpectation {
    /// Deferred checks are left to the pending result; the rest are checked now
    fn evaluate(&self, assertion: Assertion) -> FlowResult<DriverResult> {
        *lock(&self.shared.last_check) = Some(MockCheck {
            element: self.handle.clone(),
            assertion: assertion.clone(),
        });

        let element = self.target.clone().ok_or_else(|| {
            FlowError::driver(assertion.name(), "element is not managed by this device")
        })?;
        let description = format!("expect({}).{assertion}", element.locator());
        let deferred = self.deferred;
        if !deferred && !element.holds(&assertion) {
            return Err(FlowError::driver(
                assertion.name(),
                format!("{description} does not hold"),
            ));
        }

        Ok(MockPending::watching(
            description,
            Watch {
                shared: Arc::clone(&self.shared),
                element,
                assertion,
                settled: !deferred,
            },
        ))
    }
}

#[async_trait]
impl Expectation for MockExpectation {
    async fn to_be_visible(&self) -> FlowResult<DriverResult> {
        self.evaluate(Assertion::Visible)
    }

    async fn to_be_not_visible(&self) -> FlowResult<DriverResult> {
        self.evaluate(Assertion::NotVisible)
    }

    async fn to_exist(&self) -> FlowResult<DriverResult> {
        self.evaluate(Assertion::Exists)
    }

    async fn to_not_exist(&self) -> FlowResult<DriverResult> {
        self.evaluate(Assertion::NotExists)
    }

    async fn to_have_text(&self, text: &str) -> FlowResult<DriverResult> {
        self.evaluate(Assertion::Text(text.to_string()))
    }

    async fn to_have_id(&self, id: &str) -> FlowResult<DriverResult> {
        self.evaluate(Assertion::Id(id.to_string()))
    }

    async fn to_have_value(&self, value: &str) -> FlowResult<DriverResult> {
        self.evaluate(Assertion::Value(value.to_string()))
    }
}

/// In-memory [`AutomationContext`].
#[derive(Debug, Clone)]
pub struct MockDevice {
    shared: Arc<Shared>,
}

impl Default for MockDevice {
    fn default() -> Self {
        Self::with_max_repeats(DEFAULT_MAX_REPEATS)
    }
}

impl MockDevice {
    /// Empty device
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty device whose repeat-while gives up after `max_repeats` gestures
    #[must_use]
    pub fn with_max_repeats(max_repeats: usize) -> Self {
        Self {
            shared: Arc::new(Shared {
                elements: Mutex::new(HashMap::new()),
                history: Mutex::new(Vec::new()),
                last_check: Mutex::new(None),
                reloaded: AtomicBool::new(false),
                max_repeats,
            }),
        }
    }

    /// Register a fresh element under `locator`, replacing any previous one
    pub fn register(&self, locator: Locator) -> Arc<MockElement> {
        let element = Arc::new(MockElement::new(locator.clone()));
        lock(&self.shared.elements).insert(locator, Arc::clone(&element));
        element
    }

    /// Remove the element registered under `locator`
    pub fn unregister(&self, locator: &Locator) -> Option<Arc<MockElement>> {
        lock(&self.shared.elements).remove(locator)
    }

    /// Registered element for `locator`
    #[must_use]
    pub fn element(&self, locator: &Locator) -> Option<Arc<MockElement>> {
        lock(&self.shared.elements).get(locator).cloned()
    }

    /// Immediate handle to a registered element
    #[must_use]
    pub fn handle(&self, element: &Arc<MockElement>) -> ElementHandle {
        ElementHandle::new(Arc::clone(element) as Arc<dyn Element>)
    }

    /// Lookups and device calls, oldest first
    #[must_use]
    pub fn history(&self) -> Vec<String> {
        lock(&self.shared.history).clone()
    }

    /// Whether `reload_app` was called
    #[must_use]
    pub fn reloaded(&self) -> bool {
        self.shared.reloaded.load(Ordering::SeqCst)
    }

    /// Most recent expectation built through [`AutomationContext::expect`]
    #[must_use]
    pub fn last_check(&self) -> Option<MockCheck> {
        lock(&self.shared.last_check).clone()
    }

    fn managed(&self, handle: &ElementHandle) -> Option<Arc<MockElement>> {
        lock(&self.shared.elements)
            .values()
            .find(|element| handle.wraps(&(Arc::clone(element) as Arc<dyn Element>)))
            .cloned()
    }
}

#[async_trait]
impl AutomationContext for MockDevice {
    async fn lookup_element(&self, locator: &Locator) -> FlowResult<ElementHandle> {
        self.shared.record(format!("lookup:{locator}"));
        let element = self.shared.find(locator)?;
        Ok(ElementHandle::new(element))
    }

    async fn wait_for_lookup(&self, locator: &Locator) -> FlowResult<ElementHandle> {
        self.shared.record(format!("wait_for_lookup:{locator}"));
        let element = self.shared.find(locator)?;
        Ok(ElementHandle::waiting(element))
    }

    fn expect<'a>(&'a self, element: &ElementHandle) -> Box<dyn Expectation + 'a> {
        Box::new(MockExpectation {
            shared: Arc::clone(&self.shared),
            handle: element.clone(),
            target: self.managed(element),
            deferred: element.is_waiting(),
        })
    }

    fn wait_for<'a>(&'a self, element: &ElementHandle) -> Box<dyn Expectation + 'a> {
        Box::new(MockExpectation {
            shared: Arc::clone(&self.shared),
            handle: element.clone(),
            target: self.managed(element),
            deferred: true,
        })
    }

    async fn reload_app(&self) -> FlowResult<DriverResult> {
        self.shared.record("reload_app".to_string());
        self.shared.reloaded.store(true, Ordering::SeqCst);
        Ok(MockPending::labelled("reload_app()"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod element_tests {
        use super::*;

        #[test]
        fn test_defaults_visible_and_existing() {
            let el = MockElement::new(Locator::by_id("a"));
            let state = el.state();
            assert!(state.visible);
            assert!(state.exists);
            assert!(el.holds(&Assertion::Visible));
            assert!(!el.holds(&Assertion::NotExists));
        }

        #[test]
        fn test_appear_after_polls() {
            let el = MockElement::new(Locator::by_id("a"));
            el.appear_after_polls(2);
            assert!(!el.holds(&Assertion::Exists));
            el.poll();
            assert!(!el.state().visible);
            el.poll();
            assert!(el.state().visible);
            el.poll();
            assert!(el.state().visible);
        }

        #[test]
        fn test_gesture_descriptions() {
            let locator = Locator::by_id("list");
            assert_eq!(gesture_description(&Action::Tap, &locator), "tap(id=list)");
            assert_eq!(
                gesture_description(
                    &Action::Scroll {
                        distance: 50.0,
                        direction: Direction::Down
                    },
                    &locator
                ),
                "scroll(id=list, 50, down)"
            );
            assert_eq!(
                gesture_description(
                    &Action::TypeText {
                        text: "hi".into()
                    },
                    &locator
                ),
                "type_text(id=list, \"hi\")"
            );
        }

        #[tokio::test]
        async fn test_failing_operation_only() {
            let el = MockElement::new(Locator::by_id("a"));
            el.fail_on("long_press");
            assert!(el.tap().await.is_ok());
            assert!(el.long_press().await.unwrap_err().is_driver_failure());
        }
    }

    mod device_tests {
        use super::*;

        #[tokio::test]
        async fn test_lookup_records_history() {
            let device = MockDevice::new();
            device.register(Locator::by_id("a"));
            device.lookup_element(&Locator::by_id("a")).await.unwrap();
            let err = device
                .wait_for_lookup(&Locator::by_id("b"))
                .await
                .unwrap_err();

            assert!(err.is_not_found());
            assert_eq!(
                device.history(),
                vec!["lookup:id=a".to_string(), "wait_for_lookup:id=b".to_string()]
            );
        }

        #[tokio::test]
        async fn test_unregister() {
            let device = MockDevice::new();
            device.register(Locator::by_id("a"));
            assert!(device.unregister(&Locator::by_id("a")).is_some());
            assert!(device.element(&Locator::by_id("a")).is_none());
            assert!(device
                .lookup_element(&Locator::by_id("a"))
                .await
                .unwrap_err()
                .is_not_found());
        }

        #[tokio::test]
        async fn test_unmanaged_handle_is_rejected() {
            let device = MockDevice::new();
            let stranger = ElementHandle::new(Arc::new(MockElement::new(Locator::by_id("x"))));
            let err = device.expect(&stranger).to_exist().await.unwrap_err();
            assert!(err.is_driver_failure());
            assert!(device.last_check().is_some());
        }
    }

    mod pending_tests {
        use super::*;

        #[tokio::test]
        async fn test_deferred_check_settles_later() {
            let device = MockDevice::new();
            let el = device.register(Locator::by_id("a"));
            el.set_visible(false);
            let handle = device.wait_for_lookup(&Locator::by_id("a")).await.unwrap();

            let pending = device.expect(&handle).to_be_visible().await.unwrap();
            assert!(pending.settle().await.is_err());

            el.set_visible(true);
            pending.settle().await.unwrap();
        }

        #[tokio::test]
        async fn test_wait_for_defers_immediate_handle() {
            let device = MockDevice::new();
            let el = device.register(Locator::by_id("a"));
            el.set_visible(false);
            let handle = device.handle(&el);
            assert!(!handle.is_waiting());

            let pending = device.wait_for(&handle).to_be_visible().await.unwrap();
            assert!(pending.settle().await.is_err());

            el.appear_after_polls(2);
            let settled = pending.with_timeout(Duration::from_millis(200)).await.unwrap();
            settled.settle().await.unwrap();
        }

        #[tokio::test]
        async fn test_gesture_result_has_no_repeat_primitive() {
            let device = MockDevice::new();
            let el = device.register(Locator::by_id("a"));
            let pending = el.tap().await.unwrap();
            let err = pending.while_element(&Locator::by_id("a")).await.unwrap_err();
            assert!(err.is_driver_failure());
        }

        #[tokio::test]
        async fn test_already_satisfied_repeat_does_nothing() {
            let device = MockDevice::new();
            device.register(Locator::by_id("row"));
            let list = device.register(Locator::by_id("list"));
            let row = device.wait_for_lookup(&Locator::by_id("row")).await.unwrap();
            let pending = device.expect(&row).to_be_visible().await.unwrap();

            let proxy = pending.while_element(&Locator::by_id("list")).await.unwrap();
            proxy.scroll(10.0, Direction::Up).await.unwrap();

            assert_eq!(list.scroll_count(), 0);
        }
    }
}
