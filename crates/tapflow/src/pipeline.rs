//! Sequential step composition.
//!
//! A [`Pipeline`] folds its steps left to right, feeding each step the
//! previous step's output. It is itself a [`Step`], so pipelines nest:
//! `pipeline![pipeline![a], b, c]` behaves exactly like `pipeline![a, b, c]`.
//!
//! Execution is fail-fast. The first error aborts the run and is returned
//! unchanged; later steps never start.

use crate::config::FlowConfig;
use crate::driver::AutomationContext;
use crate::resolver::ElementLookup;
use crate::result::FlowResult;
use crate::step::{Step, StepOutput, StepRef};
use async_trait::async_trait;
use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, info_span, warn, Instrument};
use uuid::Uuid;

/// Build a [`Pipeline`] from a list of steps.
///
/// ```ignore
/// let login = pipeline![
///     find(Locator::by_id("email")),
///     type_text("ada@example.com"),
///     tap().on(Locator::by_id("submit")),
/// ];
/// ```
#[macro_export]
macro_rules! pipeline {
    () => {
        $crate::Pipeline::new()
    };
    ($($step:expr),+ $(,)?) => {
        $crate::Pipeline::from_steps(::std::vec![
            $($crate::step::boxed($step)),+
        ])
    };
}

/// Ordered, sequential composition of steps.
#[derive(Debug, Clone)]
pub struct Pipeline {
    steps: Vec<StepRef>,
    log_steps: bool,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self {
            steps: Vec::new(),
            log_steps: true,
        }
    }
}

impl Pipeline {
    /// Empty pipeline; running it returns its input unchanged
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pipeline over already-shared steps
    #[must_use]
    pub fn from_steps(steps: Vec<StepRef>) -> Self {
        Self {
            steps,
            log_steps: true,
        }
    }

    /// Apply run settings from `config`, including to nested pipelines
    #[must_use]
    pub fn configured(mut self, config: &FlowConfig) -> Self {
        self.log_steps = config.log_steps;
        self.steps = self
            .steps
            .into_iter()
            .map(|step| step.reconfigured(config).unwrap_or(step))
            .collect();
        self
    }

    /// Append a step
    #[must_use]
    pub fn then<S: Step + 'static>(mut self, step: S) -> Self {
        self.steps.push(Arc::new(step));
        self
    }

    /// Number of top-level steps
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether there are no steps
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Top-level steps in order
    #[must_use]
    pub fn steps(&self) -> &[StepRef] {
        &self.steps
    }

    /// Run with no prior result
    pub async fn run(&self, ctx: &dyn AutomationContext) -> FlowResult<StepOutput> {
        self.run_from(StepOutput::empty(), ctx).await
    }

    /// Run starting from `initial`
    pub async fn run_from(
        &self,
        initial: impl Into<StepOutput> + Send,
        ctx: &dyn AutomationContext,
    ) -> FlowResult<StepOutput> {
        let run_id = Uuid::new_v4();
        let span = info_span!("pipeline", %run_id, steps = self.steps.len());
        self.execute(initial.into(), ctx).instrument(span).await
    }

    /// Run independently against several contexts at once.
    ///
    /// Each run gets its own context; nothing is shared between them.
    pub async fn run_each(
        &self,
        contexts: &[&dyn AutomationContext],
    ) -> Vec<FlowResult<StepOutput>> {
        join_all(contexts.iter().map(|ctx| self.run(*ctx))).await
    }

    async fn fold(
        &self,
        initial: StepOutput,
        ctx: &dyn AutomationContext,
        lookup: &dyn ElementLookup,
    ) -> FlowResult<StepOutput> {
        let mut output = initial;
        for (index, step) in self.steps.iter().enumerate() {
            let label = step.label();
            if self.log_steps {
                debug!(index, step = %label, "running step");
            }
            output = match step.run(output, ctx, lookup).await {
                Ok(next) => next,
                Err(err) => {
                    warn!(index, step = %label, error = %err, "step failed, aborting pipeline");
                    return Err(err);
                }
            };
        }
        Ok(output)
    }
}

#[async_trait]
impl Step for Pipeline {
    fn label(&self) -> String {
        let inner: Vec<String> = self.steps.iter().map(|s| s.label()).collect();
        format!("pipeline[{}]", inner.join(", "))
    }

    async fn run(
        &self,
        previous: StepOutput,
        ctx: &dyn AutomationContext,
        lookup: &dyn ElementLookup,
    ) -> FlowResult<StepOutput> {
        self.fold(previous, ctx, lookup).await
    }

    fn reconfigured(&self, config: &FlowConfig) -> Option<StepRef> {
        Some(Arc::new(self.clone().configured(config)))
    }
}

impl<S: Step + 'static> FromIterator<S> for Pipeline {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::from_steps(iter.into_iter().map(|s| Arc::new(s) as StepRef).collect())
    }
}

#[cfg(all(test, feature = "mock"))]
mod tests {
    use super::*;
    use crate::actions::{clear_text, find, tap, type_text};
    use crate::mock::MockDevice;
    use crate::result::FlowError;
    use crate::Locator;
    use std::sync::Mutex;

    /// Step that records what it received and returns a canned output
    #[derive(Debug)]
    struct Recorder {
        name: &'static str,
        seen: Arc<Mutex<Vec<(&'static str, Option<String>)>>>,
        emit: Option<&'static str>,
        fail: bool,
    }

    impl Recorder {
        fn new(
            name: &'static str,
            seen: &Arc<Mutex<Vec<(&'static str, Option<String>)>>>,
            emit: Option<&'static str>,
        ) -> Self {
            Self {
                name,
                seen: Arc::clone(seen),
                emit,
                fail: false,
            }
        }

        fn failing(mut self) -> Self {
            self.fail = true;
            self
        }
    }

    #[async_trait]
    impl Step for Recorder {
        fn label(&self) -> String {
            self.name.to_string()
        }

        async fn run(
            &self,
            previous: StepOutput,
            _ctx: &dyn AutomationContext,
            _lookup: &dyn ElementLookup,
        ) -> FlowResult<StepOutput> {
            let prev = previous.pending.as_ref().map(|p| p.describe());
            self.seen.lock().unwrap().push((self.name, prev));
            if self.fail {
                return Err(FlowError::driver(self.name, "boom"));
            }
            Ok(StepOutput {
                element: None,
                pending: self.emit.map(crate::mock::MockPending::labelled),
            })
        }
    }

    fn journal() -> Arc<Mutex<Vec<(&'static str, Option<String>)>>> {
        Arc::new(Mutex::new(Vec::new()))
    }

    mod threading_tests {
        use super::*;

        #[tokio::test]
        async fn test_passes_previous_result() {
            let device = MockDevice::new();
            let seen = journal();

            let out = pipeline![
                Recorder::new("a", &seen, Some("first")),
                Recorder::new("b", &seen, Some("second")),
            ]
            .run(&device)
            .await
            .unwrap();

            assert_eq!(
                *seen.lock().unwrap(),
                vec![("a", None), ("b", Some("first".to_string()))]
            );
            assert_eq!(out.pending.unwrap().describe(), "second");
        }

        #[tokio::test]
        async fn test_nested_pipeline_is_a_step() {
            let device = MockDevice::new();
            let seen = journal();

            pipeline![
                pipeline![Recorder::new("a", &seen, Some("one"))],
                Recorder::new("b", &seen, Some("two")),
                Recorder::new("c", &seen, None),
            ]
            .run(&device)
            .await
            .unwrap();

            assert_eq!(
                *seen.lock().unwrap(),
                vec![
                    ("a", None),
                    ("b", Some("one".to_string())),
                    ("c", Some("two".to_string())),
                ]
            );
        }

        #[tokio::test]
        async fn test_empty_pipeline_returns_initial() {
            let device = MockDevice::new();
            let el = device.register(Locator::by_id("x"));

            let out = Pipeline::new()
                .run_from(device.handle(&el), &device)
                .await
                .unwrap();

            assert!(out.element.unwrap().same_as(&device.handle(&el)));
            assert!(out.pending.is_none());
        }

        #[tokio::test]
        async fn test_run_equals_run_from_empty() {
            let device = MockDevice::new();
            device.register(Locator::by_id("x"));
            let flow = pipeline![find(Locator::by_id("x")), tap()];

            let a = flow.run(&device).await.unwrap();
            let b = flow.run_from(StepOutput::empty(), &device).await.unwrap();

            assert!(a.element.unwrap().same_as(&b.element.unwrap()));
            assert_eq!(
                a.pending.unwrap().describe(),
                b.pending.unwrap().describe()
            );
        }
    }

    mod failure_tests {
        use super::*;

        #[tokio::test]
        async fn test_fail_fast_skips_remaining_steps() {
            let device = MockDevice::new();
            let seen = journal();

            let err = pipeline![
                Recorder::new("a", &seen, Some("one")),
                Recorder::new("b", &seen, None).failing(),
                Recorder::new("c", &seen, None),
            ]
            .run(&device)
            .await
            .unwrap_err();

            let names: Vec<_> = seen.lock().unwrap().iter().map(|(n, _)| *n).collect();
            assert_eq!(names, vec!["a", "b"]);
            assert!(matches!(err, FlowError::Driver { ref operation, .. } if operation == "b"));
        }

        #[tokio::test]
        async fn test_lookup_failure_propagates() {
            let device = MockDevice::new();
            let err = pipeline![tap().on(Locator::by_id("missing")), clear_text()]
                .run(&device)
                .await
                .unwrap_err();
            assert!(err.is_not_found());
        }
    }

    mod scenario_tests {
        use super::*;

        #[tokio::test]
        async fn test_find_then_tap() {
            let device = MockDevice::new();
            let el = device.register(Locator::by_id("x"));

            let out = pipeline![find(Locator::by_id("x")), tap()]
                .run(&device)
                .await
                .unwrap();

            assert_eq!(device.history(), vec!["lookup:id=x".to_string()]);
            assert!(el.state().tapped);
            assert!(out.element.unwrap().same_as(&device.handle(&el)));
            assert_eq!(out.pending.unwrap().describe(), "tap(id=x)");
        }

        #[tokio::test]
        async fn test_type_then_clear_carries_element() {
            let device = MockDevice::new();
            let el = device.register(Locator::by_id("field"));

            let out = pipeline![type_text("a"), clear_text()]
                .run_from(device.handle(&el), &device)
                .await
                .unwrap();

            assert!(out.element.unwrap().same_as(&device.handle(&el)));
            assert_eq!(el.state().text, "");
            assert!(device.history().is_empty());
        }

        #[tokio::test]
        async fn test_independent_concurrent_runs() {
            let first = MockDevice::new();
            let second = MockDevice::new();
            let a = first.register(Locator::by_id("go"));
            let b = second.register(Locator::by_id("go"));
            let flow = pipeline![tap().on(Locator::by_id("go"))];

            let contexts: [&dyn AutomationContext; 2] = [&first, &second];
            let results = flow.run_each(&contexts).await;

            assert!(results.iter().all(Result::is_ok));
            assert!(a.state().tapped);
            assert!(b.state().tapped);
        }
    }

    mod builder_tests {
        use super::*;
        use std::sync::atomic::{AtomicUsize, Ordering};
        use tracing::{Event, Level, Subscriber};
        use tracing_subscriber::layer::{Context, SubscriberExt};
        use tracing_subscriber::Layer;

        /// Counts debug events emitted by the pipeline fold
        struct StepLogCounter(Arc<AtomicUsize>);

        impl<S: Subscriber> Layer<S> for StepLogCounter {
            fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
                let meta = event.metadata();
                if *meta.level() == Level::DEBUG && meta.target() == "tapflow::pipeline" {
                    self.0.fetch_add(1, Ordering::SeqCst);
                }
            }
        }

        fn step_logs_during_run(flow: &Pipeline, device: &MockDevice) -> usize {
            let count = Arc::new(AtomicUsize::new(0));
            let subscriber =
                tracing_subscriber::registry().with(StepLogCounter(Arc::clone(&count)));
            let rt = tokio::runtime::Builder::new_current_thread()
                .build()
                .unwrap();
            tracing::subscriber::with_default(subscriber, || {
                rt.block_on(flow.run(device)).unwrap();
            });
            count.load(Ordering::SeqCst)
        }

        #[test]
        fn test_then_and_len() {
            let flow = Pipeline::new().then(tap()).then(clear_text());
            assert_eq!(flow.len(), 2);
            assert!(!flow.is_empty());
            assert_eq!(flow.label(), "pipeline[tap(), clear_text()]");
        }

        #[test]
        fn test_from_iterator() {
            let flow: Pipeline = vec![tap(), tap()].into_iter().collect();
            assert_eq!(flow.len(), 2);
        }

        #[test]
        fn test_configured_keeps_steps() {
            let config = FlowConfig::new().with_log_steps(false);
            let flow = pipeline![tap()].configured(&config);
            assert_eq!(flow.len(), 1);
            assert!(!flow.log_steps);
        }

        #[test]
        fn test_configured_reaches_nested_pipelines() {
            let device = MockDevice::new();
            device.register(Locator::by_id("a"));
            let flow = pipeline![pipeline![tap().on(Locator::by_id("a"))], tap()];

            assert_eq!(step_logs_during_run(&flow, &device), 3);
            let quiet = flow.configured(&FlowConfig::new().with_log_steps(false));
            assert_eq!(step_logs_during_run(&quiet, &device), 0);
        }

        #[test]
        fn test_empty_macro() {
            let flow = pipeline![];
            assert!(flow.is_empty());
        }
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        fn run_labels(flow: &Pipeline) -> Vec<String> {
            let device = MockDevice::new();
            device.register(Locator::by_id("x"));
            let rt = tokio::runtime::Builder::new_current_thread()
                .build()
                .unwrap();
            let out = rt.block_on(flow.run(&device)).unwrap();
            let mut labels = device.history();
            labels.push(out.pending.map(|p| p.describe()).unwrap_or_default());
            labels
        }

        proptest! {
            #[test]
            fn prop_nesting_is_associative(split in 0usize..4, taps in 1usize..4) {
                let mut steps: Vec<StepRef> = vec![crate::step::boxed(find(Locator::by_id("x")))];
                steps.extend((0..taps).map(|_| crate::step::boxed(tap())));
                let split = split.min(steps.len());

                let flat = Pipeline::from_steps(steps.clone());
                let (head, tail) = steps.split_at(split);
                let mut nested_steps: Vec<StepRef> =
                    vec![crate::step::boxed(Pipeline::from_steps(head.to_vec()))];
                nested_steps.extend(tail.iter().cloned());
                let nested = Pipeline::from_steps(nested_steps);

                prop_assert_eq!(run_labels(&flat), run_labels(&nested));
            }
        }
    }
}
