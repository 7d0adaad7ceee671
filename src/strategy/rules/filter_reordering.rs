//! # FilterReordering (§4.3.2)
//!
//! Within each maximal contiguous run of unlabeled pure-filter steps
//! ([`crate::step::StepKind::is_pure_filter`]), reorder by ascending
//! declared selectivity hint (most selective first), a stable sort so
//! steps without a hint, or tied at the same hint, keep their relative
//! order. Labeled steps end a run, since moving them could change what a
//! downstream label-reference observes.

use crate::engine::EngineTag;
use crate::error::OptimizerResult;
use crate::pipeline::Pipeline;
use crate::step::Step;
use crate::strategy::Strategy;
use crate::trace::OptimizationStats;

pub struct FilterReordering;

fn is_run_member(step: &Step) -> bool {
    step.kind().is_pure_filter() && !step.is_labeled()
}

impl Strategy for FilterReordering {
    fn id(&self) -> &'static str {
        "FilterReordering"
    }

    fn apply(
        &self,
        pipeline: &mut Pipeline,
        _engine: EngineTag,
        _stats: &mut OptimizationStats,
    ) -> OptimizerResult<bool> {
        let steps = pipeline.steps_mut_for_helper();
        let mut fired = false;
        let mut i = 0;
        while i < steps.len() {
            if !is_run_member(&steps[i]) {
                i += 1;
                continue;
            }
            let start = i;
            let mut end = i + 1;
            while end < steps.len() && is_run_member(&steps[end]) {
                end += 1;
            }

            if end - start > 1 {
                let before: Vec<_> = steps[start..end].iter().map(Step::id).collect();
                steps[start..end].sort_by(|a, b| {
                    let ha = a.kind().selectivity_hint().unwrap_or(f64::INFINITY);
                    let hb = b.kind().selectivity_hint().unwrap_or(f64::INFINITY);
                    ha.partial_cmp(&hb).unwrap_or(std::cmp::Ordering::Equal)
                });
                let after: Vec<_> = steps[start..end].iter().map(Step::id).collect();
                if before != after {
                    fired = true;
                }
            }

            i = end;
        }

        Ok(fired)
    }
}
