//! Benchmarks for flow coordination.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use devflow::prelude::*;
use devflow::testing::demo_project;

fn flow_benchmark(c: &mut Criterion) {
    c.bench_function("complete_all_stages", |b| {
        b.iter(|| {
            let mut flow = FlowCoordinator::new(FlowConfig::default());
            flow.start(demo_project()).ok();
            while flow.complete_stage().is_ok() {}
            black_box(flow.get_progress())
        })
    });

    c.bench_function("record_metric", |b| {
        let quality = QualityMetricsCollector::with_stage_defaults(QualityConfig::default());
        b.iter(|| {
            black_box(quality.record_metric(Stage::BackendDevelopment, "apiCompliance", 97.0))
        })
    });
}

criterion_group!(benches, flow_benchmark);
criterion_main!(benches);
