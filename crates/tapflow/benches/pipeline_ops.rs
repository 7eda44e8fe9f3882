//! Pipeline Operations Benchmarks
//!
//! Benchmarks for pipeline composition, scenario compilation, and running
//! flows against the in-memory device.
//!
//! Run with: `cargo bench --bench pipeline_ops`

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use tapflow::mock::MockDevice;
use tapflow::prelude::*;

const SCENARIO: &str = r"
name: checkout
steps:
  - type: find
    locator:
      selector: { by: id, value: cart }
  - type: tap
  - type: type_text
    text: '4242 4242 4242 4242'
    locator:
      selector: { by: id, value: card }
  - type: wait_for
    timeout_ms: 500
    expectation:
      type: expect
      check: { expect: visible }
      locator:
        selector: { by: text, value: Paid }
";

fn bench_pipeline_composition(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline_composition");

    for len in [1usize, 8, 64] {
        group.bench_with_input(BenchmarkId::from_parameter(len), &len, |bench, &len| {
            bench.iter(|| {
                let flow = (0..len).fold(Pipeline::new(), |flow, _| flow.then(tap()));
                black_box(flow);
            });
        });
    }

    group.finish();
}

fn bench_scenario_compile(c: &mut Criterion) {
    let config = FlowConfig::new();
    c.bench_function("scenario_parse_and_compile", |bench| {
        bench.iter(|| {
            let scenario = Scenario::from_yaml(black_box(SCENARIO)).unwrap();
            black_box(scenario.to_pipeline(&config));
        });
    });
}

fn bench_run_on_mock(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let mut group = c.benchmark_group("run_on_mock");

    for len in [1usize, 16, 128] {
        let device = MockDevice::new();
        device.register(Locator::by_id("button"));
        let flow = (0..len).fold(pipeline![find(Locator::by_id("button"))], |flow, _| {
            flow.then(tap())
        });

        group.bench_with_input(BenchmarkId::from_parameter(len), &flow, |bench, flow| {
            bench.to_async(&rt).iter(|| async {
                black_box(flow.run(&device).await.unwrap());
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_pipeline_composition,
    bench_scenario_compile,
    bench_run_on_mock
);
criterion_main!(benches);
