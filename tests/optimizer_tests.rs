//! Integration tests exercising the full strategy registry against
//! end-to-end pipelines, rather than a single rule in isolation.

use travopt::engine::EngineTag;
use travopt::pipeline::Pipeline;
use travopt::predicate::Predicate;
use travopt::step::{HasContainer, RangeBounds, StepKind};
use travopt::strategy::{self, StrategyRegistry};
use travopt::value::Value;

fn range_steps(p: &Pipeline) -> Vec<RangeBounds> {
    p.steps()
        .iter()
        .filter_map(|s| match s.kind() {
            StepKind::Range(b) => Some(*b),
            _ => None,
        })
        .collect()
}

#[test]
fn full_registry_folds_range_by_is_count() {
    let mut p = Pipeline::new();
    p.append_step(StepKind::VertexSource).unwrap();
    p.append_step(StepKind::Out).unwrap();
    p.append_step(StepKind::Count).unwrap();
    p.append_step(StepKind::Is(Predicate::Gte(Value::Int(3))))
        .unwrap();

    let registry = StrategyRegistry::init();
    let stats = strategy::apply(&mut p, EngineTag::Standard, &registry.all()).unwrap();

    assert_eq!(range_steps(&p), vec![RangeBounds::bounded(0, 3)]);
    assert!(stats.fired_count("RangeByIsCount") >= 1);
    assert!(p.is_frozen());
}

#[test]
fn nested_has_traversal_count_is_scenario() {
    // g.V().has(out("created").count().is(eq(0)))
    let mut p = Pipeline::new();
    let v = p.append_step(StepKind::VertexSource).unwrap();
    let has_id = p.append_step(StepKind::HasTraversal { negate: false }).unwrap();

    let mut child = p.child_pipeline();
    child.append_step(StepKind::OutEdges).unwrap();
    child.append_step(StepKind::Count).unwrap();
    child
        .append_step(StepKind::Is(Predicate::Eq(Value::Int(0))))
        .unwrap();
    p.attach_child(has_id, child).unwrap();

    let registry = StrategyRegistry::init();
    strategy::apply(&mut p, EngineTag::Standard, &registry.all()).unwrap();

    let has_step = p.step(has_id).unwrap();
    let nested = &has_step.children()[0];
    assert_eq!(range_steps(nested), vec![RangeBounds::bounded(0, 1)]);
    let _ = v;
}

#[test]
fn identity_removal_and_range_merge_compose() {
    let mut p = Pipeline::new();
    p.append_step(StepKind::VertexSource).unwrap();
    p.append_step(StepKind::Identity).unwrap();
    p.append_step(StepKind::Range(RangeBounds::bounded(0, 10)))
        .unwrap();
    p.append_step(StepKind::Identity).unwrap();
    p.append_step(StepKind::Range(RangeBounds::bounded(2, 5)))
        .unwrap();

    let registry = StrategyRegistry::init();
    strategy::apply(&mut p, EngineTag::Standard, &registry.all()).unwrap();

    // Both identities removed, adjacent ranges merged into one.
    assert_eq!(p.len(), 2);
    assert_eq!(range_steps(&p), vec![RangeBounds::bounded(2, 5)]);
}

#[test]
fn vertices_by_id_folding_runs_alongside_filter_reordering() {
    let mut p = Pipeline::new();
    p.append_step(StepKind::VertexSource).unwrap();
    p.append_step(StepKind::Has(HasContainer::new(
        "id",
        Predicate::Eq(Value::Int(42)),
    )))
    .unwrap();
    p.append_step(StepKind::FilterOpaque {
        name: "expensive".to_string(),
        selectivity_hint: Some(0.9),
    })
    .unwrap();

    let registry = StrategyRegistry::init();
    strategy::apply(&mut p, EngineTag::Standard, &registry.all()).unwrap();

    assert!(matches!(p.steps()[0].kind(), StepKind::VertexSourceById(_)));
}

#[test]
fn profile_injection_and_range_by_is_count_compose() {
    let mut p = Pipeline::new();
    p.append_step(StepKind::VertexSource).unwrap();
    p.append_step(StepKind::Out).unwrap();
    p.append_step(StepKind::Count).unwrap();
    p.append_step(StepKind::Is(Predicate::Lt(Value::Int(10))))
        .unwrap();
    p.append_step(StepKind::Profile).unwrap();

    let registry = StrategyRegistry::init();
    let stats = strategy::apply(&mut p, EngineTag::Standard, &registry.all()).unwrap();

    assert!(stats.fired_count("RangeByIsCount") >= 1);
    assert!(stats.fired_count("ProfileInjection") >= 1);
    assert!(p
        .steps()
        .iter()
        .any(|s| matches!(s.kind(), StepKind::ProfileProbe)));
    assert!(range_steps(&p).iter().any(|r| r.high == Some(10)));
}

#[test]
fn computer_engine_restriction_prevents_fire_under_label() {
    let mut p = Pipeline::new();
    let out = p.append_step(StepKind::Out).unwrap();
    p.label_step(out, "mid").unwrap();
    p.append_step(StepKind::Count).unwrap();
    p.append_step(StepKind::Is(Predicate::Eq(Value::Int(0))))
        .unwrap();

    let registry = StrategyRegistry::init();
    let stats = strategy::apply(&mut p, EngineTag::Computer, &registry.all()).unwrap();

    assert!(range_steps(&p).is_empty());
    assert!(stats.fired_count("RangeByIsCount") == 0);
}

#[test]
fn reapplying_to_frozen_pipeline_errors() {
    let mut p = Pipeline::new();
    p.append_step(StepKind::VertexSource).unwrap();

    let registry = StrategyRegistry::init();
    strategy::apply(&mut p, EngineTag::Standard, &registry.all()).unwrap();

    let err = strategy::apply(&mut p, EngineTag::Standard, &registry.all()).unwrap_err();
    assert!(matches!(err, travopt::error::OptimizerError::Frozen));
}
