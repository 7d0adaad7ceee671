//! Benchmarks for `apply()` over representative pipeline shapes: a short
//! chain that only `RangeByIsCount` touches, and a longer chain that
//! exercises the full built-in strategy set together.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use travopt::engine::EngineTag;
use travopt::pipeline::Pipeline;
use travopt::predicate::Predicate;
use travopt::step::{HasContainer, RangeBounds, StepKind};
use travopt::strategy::{self, StrategyRegistry};
use travopt::value::Value;

fn range_by_is_count_pipeline() -> Pipeline {
    let mut p = Pipeline::new();
    p.append_step(StepKind::VertexSource).unwrap();
    p.append_step(StepKind::Out).unwrap();
    p.append_step(StepKind::Count).unwrap();
    p.append_step(StepKind::Is(Predicate::Gte(Value::Int(100))))
        .unwrap();
    p
}

fn mixed_pipeline() -> Pipeline {
    let mut p = Pipeline::new();
    p.append_step(StepKind::VertexSource).unwrap();
    p.append_step(StepKind::Has(HasContainer::new(
        "id",
        Predicate::Eq(Value::Int(1)),
    )))
    .unwrap();
    p.append_step(StepKind::Identity).unwrap();
    p.append_step(StepKind::Out).unwrap();
    p.append_step(StepKind::FilterOpaque {
        name: "costly".to_string(),
        selectivity_hint: Some(0.8),
    })
    .unwrap();
    p.append_step(StepKind::Has(HasContainer::new(
        "age",
        Predicate::Gt(Value::Int(18)),
    )))
    .unwrap();
    p.append_step(StepKind::Range(RangeBounds::bounded(0, 1000)))
        .unwrap();
    p.append_step(StepKind::Count).unwrap();
    p.append_step(StepKind::Is(Predicate::Lte(Value::Int(50))))
        .unwrap();
    p
}

fn bench_range_by_is_count(c: &mut Criterion) {
    let registry = StrategyRegistry::init();
    c.bench_function("apply/range_by_is_count_only", |b| {
        b.iter(|| {
            let mut p = range_by_is_count_pipeline();
            strategy::apply(black_box(&mut p), EngineTag::Standard, &registry.all()).unwrap();
        });
    });
}

fn bench_mixed_pipeline(c: &mut Criterion) {
    let registry = StrategyRegistry::init();
    c.bench_function("apply/mixed_strategies", |b| {
        b.iter(|| {
            let mut p = mixed_pipeline();
            strategy::apply(black_box(&mut p), EngineTag::Standard, &registry.all()).unwrap();
        });
    });
}

criterion_group!(benches, bench_range_by_is_count, bench_mixed_pipeline);
criterion_main!(benches);
