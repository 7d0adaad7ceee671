//! # IdentityRemoval (§4.3.2)
//!
//! Remove any `identity` step that is neither labeled nor the sole step in
//! its pipeline.

use crate::engine::EngineTag;
use crate::error::OptimizerResult;
use crate::helper;
use crate::pipeline::Pipeline;
use crate::step::StepKind;
use crate::strategy::Strategy;
use crate::trace::OptimizationStats;

pub struct IdentityRemoval;

impl Strategy for IdentityRemoval {
    fn id(&self) -> &'static str {
        "IdentityRemoval"
    }

    fn before(&self) -> &'static [&'static str] {
        &["RangeMerge"]
    }

    fn apply(
        &self,
        pipeline: &mut Pipeline,
        _engine: EngineTag,
        stats: &mut OptimizationStats,
    ) -> OptimizerResult<bool> {
        if pipeline.len() <= 1 {
            return Ok(false);
        }

        let removable: Vec<_> = pipeline
            .steps()
            .iter()
            .filter(|s| matches!(s.kind(), StepKind::Identity) && !s.is_labeled())
            .map(|s| s.id())
            .collect();

        for id in &removable {
            helper::remove(pipeline, *id)?;
        }

        if !removable.is_empty() {
            stats.record_removed(removable.len());
        }
        Ok(!removable.is_empty())
    }
}
