//! End-to-end integration: configuration loading feeding the strategy
//! registry, and the full apply lifecycle from a freshly built pipeline
//! through to a frozen, optimized one.

use travopt::config::Config;
use travopt::engine::EngineTag;
use travopt::error::OptimizerError;
use travopt::pipeline::Pipeline;
use travopt::predicate::Predicate;
use travopt::step::{RangeBounds, StepKind};
use travopt::strategy::{self, StrategyRegistry};
use travopt::value::Value;

#[test]
fn default_config_strategy_ids_all_resolve() {
    let config = Config::default();
    let registry = StrategyRegistry::init();
    let resolved = registry.resolve(&config.default_strategies).unwrap();
    assert_eq!(resolved.len(), config.default_strategies.len());
}

#[test]
fn unknown_strategy_id_is_a_configuration_error() {
    let registry = StrategyRegistry::init();
    let err = registry.resolve(&["NotARealStrategy".to_string()]).unwrap_err();
    assert!(matches!(err, OptimizerError::Configuration(_)));
}

#[test]
fn mutation_after_apply_is_rejected() {
    let mut p = Pipeline::new();
    p.append_step(StepKind::VertexSource).unwrap();

    let registry = StrategyRegistry::init();
    strategy::apply(&mut p, EngineTag::Standard, &registry.all()).unwrap();

    let err = p.append_step(StepKind::Count).unwrap_err();
    assert!(matches!(err, OptimizerError::Frozen));
}

#[test]
fn end_to_end_pipeline_lifecycle() {
    let mut p = Pipeline::new();
    p.append_step(StepKind::VertexSource).unwrap();
    p.append_step(StepKind::Out).unwrap();
    p.append_step(StepKind::Range(RangeBounds::bounded(0, 100)))
        .unwrap();
    p.append_step(StepKind::Count).unwrap();
    p.append_step(StepKind::Is(Predicate::Lte(Value::Int(5))))
        .unwrap();

    let registry = StrategyRegistry::init();
    let stats = strategy::apply(&mut p, EngineTag::Standard, &registry.all()).unwrap();

    // range(0,100) merged down with the inserted range(0,6).
    let ranges: Vec<_> = p
        .steps()
        .iter()
        .filter_map(|s| match s.kind() {
            StepKind::Range(b) => Some(*b),
            _ => None,
        })
        .collect();
    assert_eq!(ranges.len(), 1);
    assert_eq!(ranges[0].high, Some(6));
    assert!(stats.fired_count("RangeByIsCount") >= 1);
    assert!(p.is_frozen());
    p.check_invariants().unwrap();
}
