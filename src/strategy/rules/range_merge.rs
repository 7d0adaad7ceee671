//! # RangeMerge (§4.3.2)
//!
//! Collapse two adjacent `range(low1, high1)` steps into a single
//! `range(low1 + low2, min(high1, low1 + high2))`, treating an unbounded
//! high as +infinity for the purposes of the `min`. Runs after
//! `IdentityRemoval` so an intervening `identity` doesn't block the merge,
//! and after `RangeByIsCount` so a range it inserts is itself eligible.

use crate::engine::EngineTag;
use crate::error::OptimizerResult;
use crate::helper;
use crate::pipeline::Pipeline;
use crate::step::{RangeBounds, StepKind};
use crate::strategy::Strategy;
use crate::trace::OptimizationStats;

pub struct RangeMerge;

fn merge_bounds(a: RangeBounds, b: RangeBounds) -> RangeBounds {
    let low = a.low + b.low;
    let high = match (a.high, b.high) {
        (Some(ah), Some(bh)) => Some(ah.min(a.low + bh)),
        (Some(ah), None) => Some(ah),
        (None, Some(bh)) => Some(a.low + bh),
        (None, None) => None,
    };
    RangeBounds { low, high }
}

impl Strategy for RangeMerge {
    fn id(&self) -> &'static str {
        "RangeMerge"
    }

    fn after(&self) -> &'static [&'static str] {
        &["IdentityRemoval", "RangeByIsCount"]
    }

    fn apply(
        &self,
        pipeline: &mut Pipeline,
        _engine: EngineTag,
        stats: &mut OptimizationStats,
    ) -> OptimizerResult<bool> {
        let mut fired = false;

        loop {
            let pair = pipeline.steps().windows(2).find_map(|w| {
                let (first, second) = (&w[0], &w[1]);
                match (first.kind(), second.kind()) {
                    (StepKind::Range(a), StepKind::Range(b)) if !first.is_labeled() => {
                        Some((first.id(), second.id(), *a, *b))
                    }
                    _ => None,
                }
            });

            let Some((first_id, second_id, a, b)) = pair else {
                break;
            };

            let merged = merge_bounds(a, b);
            helper::replace(pipeline, first_id, StepKind::Range(merged))?;
            helper::remove(pipeline, second_id)?;
            stats.record_replaced(1);
            stats.record_removed(1);
            fired = true;
        }

        Ok(fired)
    }
}
