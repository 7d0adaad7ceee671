//! # Strategy framework (C5)
//!
//! A [`Strategy`] is a pure, in-place rewrite `(Pipeline, Engine) ->
//! Pipeline`. This module computes the topological application order from
//! each strategy's declared *before*/*after* edges, then drives the
//! application discipline in §4.2: apply once at the top level, then
//! recurse into nested child pipelines with the same order, then freeze.

pub mod rules;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::{debug, trace};

use crate::engine::{EngineRestriction, EngineTag};
use crate::error::{OptimizerError, OptimizerResult};
use crate::pipeline::Pipeline;
use crate::trace::{OptimizationStats, UnsupportedReason};

/// A single algebraic rewrite rule.
///
/// Implementations must be idempotent (§4.2): applying an already-optimized
/// pipeline a second time must be a no-op. The framework itself does not
/// iterate to a fixed point — ordering is relied upon for single-pass
/// convergence.
pub trait Strategy: Send + Sync {
    /// A stable identifier, unique within a [`StrategyRegistry`]. Used for
    /// ordering-edge references and as a deterministic tie-break.
    fn id(&self) -> &'static str;

    /// Strategy identifiers this strategy must run before.
    fn before(&self) -> &'static [&'static str] {
        &[]
    }

    /// Strategy identifiers this strategy must run after.
    fn after(&self) -> &'static [&'static str] {
        &[]
    }

    /// Which engine tag(s) this strategy is legal under (§4.4).
    fn engine_restriction(&self) -> EngineRestriction {
        EngineRestriction::Any
    }

    /// Rewrite `pipeline` in place for the non-nested (current) level only.
    /// Returning `Ok(false)` means the pattern didn't match anywhere —
    /// not an error (§7's `Unsupported`).
    fn apply(
        &self,
        pipeline: &mut Pipeline,
        engine: EngineTag,
        stats: &mut OptimizationStats,
    ) -> OptimizerResult<bool>;
}

/// The closed, process-wide catalog of strategy descriptors (§5, §9):
/// assembled once at `init`, ordering edges are data carried on each
/// strategy, not code. No runtime class-loading.
pub struct StrategyRegistry {
    strategies: HashMap<&'static str, Arc<dyn Strategy>>,
}

impl StrategyRegistry {
    /// Assemble the closed catalog of built-in strategies.
    pub fn init() -> Self {
        let mut strategies: HashMap<&'static str, Arc<dyn Strategy>> = HashMap::new();
        for s in rules::built_in_strategies() {
            strategies.insert(s.id(), s);
        }
        StrategyRegistry { strategies }
    }

    /// Tear down the registry. A no-op beyond dropping the `Arc`s — kept as
    /// an explicit call so embedding applications have a symmetric
    /// init/teardown pair to reason about (§5).
    pub fn teardown(self) {}

    pub fn get(&self, id: &str) -> Option<Arc<dyn Strategy>> {
        self.strategies.get(id).cloned()
    }

    pub fn all(&self) -> Vec<Arc<dyn Strategy>> {
        self.strategies.values().cloned().collect()
    }

    /// Resolve a set of strategy identifiers to live strategies, in the
    /// order supplied, erroring on unknown ids (§7, `ConfigurationError`).
    pub fn resolve(&self, ids: &[impl AsRef<str>]) -> OptimizerResult<Vec<Arc<dyn Strategy>>> {
        ids.iter()
            .map(|id| {
                self.get(id.as_ref()).ok_or_else(|| {
                    OptimizerError::Configuration(format!("unknown strategy id '{}'", id.as_ref()))
                })
            })
            .collect()
    }
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        StrategyRegistry::init()
    }
}

/// Topologically order `strategies` by their declared before/after edges.
/// Ties are broken by strategy identifier for determinism (§4.2). A cycle
/// is a `ConfigurationError`.
fn topological_order(strategies: &[Arc<dyn Strategy>]) -> OptimizerResult<Vec<Arc<dyn Strategy>>> {
    let ids: HashSet<&'static str> = strategies.iter().map(|s| s.id()).collect();

    // edge[a] = set of b such that a must run before b.
    let mut edges: HashMap<&'static str, HashSet<&'static str>> = HashMap::new();
    let mut indegree: HashMap<&'static str, usize> = strategies.iter().map(|s| (s.id(), 0)).collect();

    let mut add_edge = |edges: &mut HashMap<&'static str, HashSet<&'static str>>,
                        indegree: &mut HashMap<&'static str, usize>,
                        from: &'static str,
                        to: &'static str| {
        if from == to || !ids.contains(from) || !ids.contains(to) {
            return;
        }
        if edges.entry(from).or_default().insert(to) {
            *indegree.entry(to).or_default() += 1;
        }
    };

    for s in strategies {
        for &must_run_before in s.before() {
            add_edge(&mut edges, &mut indegree, s.id(), must_run_before);
        }
        for &must_run_after in s.after() {
            add_edge(&mut edges, &mut indegree, must_run_after, s.id());
        }
    }

    let mut by_id: HashMap<&'static str, Arc<dyn Strategy>> =
        strategies.iter().map(|s| (s.id(), s.clone())).collect();

    let mut ready: Vec<&'static str> = indegree
        .iter()
        .filter(|(_, &d)| d == 0)
        .map(|(&id, _)| id)
        .collect();
    ready.sort_unstable();

    let mut ordered = Vec::with_capacity(strategies.len());
    while let Some(next) = ready.pop() {
        ordered.push(by_id.remove(next).expect("present by construction"));
        if let Some(targets) = edges.get(next) {
            let mut newly_ready = Vec::new();
            for &t in targets {
                let d = indegree.get_mut(t).expect("tracked");
                *d -= 1;
                if *d == 0 {
                    newly_ready.push(t);
                }
            }
            newly_ready.sort_unstable();
            ready.extend(newly_ready);
            ready.sort_unstable();
        }
    }

    if ordered.len() != strategies.len() {
        return Err(OptimizerError::Configuration(
            "cyclic strategy ordering".to_string(),
        ));
    }

    Ok(ordered)
}

/// `apply(pipeline, engineTag, strategySet) -> ()` (§6): mutates `pipeline`
/// in place, then freezes it. Errors per §7.
pub fn apply(
    pipeline: &mut Pipeline,
    engine: EngineTag,
    strategy_set: &[Arc<dyn Strategy>],
) -> OptimizerResult<OptimizationStats> {
    if pipeline.is_frozen() {
        return Err(OptimizerError::Frozen);
    }

    let ordered = topological_order(strategy_set)?;
    let mut stats = OptimizationStats::default();

    apply_ordered_recursive(pipeline, engine, &ordered, &mut stats)?;

    pipeline.set_engine_tag(engine);
    pipeline.freeze();

    Ok(stats)
}

fn apply_ordered_recursive(
    pipeline: &mut Pipeline,
    engine: EngineTag,
    ordered: &[Arc<dyn Strategy>],
    stats: &mut OptimizationStats,
) -> OptimizerResult<()> {
    for strategy in ordered {
        if !strategy.engine_restriction().allows(engine) {
            trace!(strategy = strategy.id(), ?engine, "strategy restricted to a different engine");
            stats.record_unsupported(strategy.id(), UnsupportedReason::EngineRestricted);
            continue;
        }
        let span = tracing::debug_span!("strategy", id = strategy.id());
        let _enter = span.enter();
        let fired = strategy.apply(pipeline, engine, stats)?;
        if fired {
            debug!(strategy = strategy.id(), "rule fired");
            stats.record_fired(strategy.id());
        } else {
            trace!(strategy = strategy.id(), "pattern did not match");
            stats.record_unsupported(strategy.id(), UnsupportedReason::NoMatch);
        }
    }

    pipeline.check_invariants()?;

    // Parent rewrites may have added/removed children, so collect the
    // current child pipelines only after this level has fully run (§4.2
    // step 3).
    for step in pipeline.steps_mut_for_helper() {
        for child in step.children_mut() {
            apply_ordered_recursive(child, engine, ordered, stats)?;
        }
    }

    Ok(())
}
