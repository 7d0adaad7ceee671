//! # ProfileInjection (§4.3.2)
//!
//! When a pipeline contains a `profile` step anywhere, insert a
//! [`StepKind::ProfileProbe`] marker immediately before every other step so
//! a downstream profiling sink can attribute timing per original step.
//! Idempotent: a step already immediately preceded by a probe is skipped.
//! Runs last among the built-in rules so its markers never get reordered or
//! merged away by the rules that look for real steps.

use crate::engine::EngineTag;
use crate::error::OptimizerResult;
use crate::helper;
use crate::pipeline::Pipeline;
use crate::step::StepKind;
use crate::strategy::Strategy;
use crate::trace::OptimizationStats;

pub struct ProfileInjection;

impl Strategy for ProfileInjection {
    fn id(&self) -> &'static str {
        "ProfileInjection"
    }

    fn after(&self) -> &'static [&'static str] {
        &[
            "IdentityRemoval",
            "RangeByIsCount",
            "RangeMerge",
            "FilterReordering",
            "VerticesByIdFolding",
        ]
    }

    fn apply(
        &self,
        pipeline: &mut Pipeline,
        _engine: EngineTag,
        stats: &mut OptimizationStats,
    ) -> OptimizerResult<bool> {
        let has_profile = pipeline
            .steps()
            .iter()
            .any(|s| matches!(s.kind(), StepKind::Profile));
        if !has_profile {
            return Ok(false);
        }

        let mut fired = false;
        let mut idx = 0;
        loop {
            let ids: Vec<_> = pipeline.steps().iter().map(|s| s.id()).collect();
            if idx >= ids.len() {
                break;
            }
            let current = ids[idx];
            let already_probed = idx > 0
                && matches!(pipeline.steps()[idx - 1].kind(), StepKind::ProfileProbe);
            let is_probe_itself = matches!(pipeline.step(current).unwrap().kind(), StepKind::ProfileProbe);

            if !already_probed && !is_probe_itself {
                helper::insert_before(pipeline, current, StepKind::ProfileProbe)?;
                stats.record_inserted(1);
                fired = true;
                idx += 2;
            } else {
                idx += 1;
            }
        }

        Ok(fired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::apply;
    use std::sync::Arc;

    #[test]
    fn no_profile_step_no_injection() {
        let mut p = Pipeline::new();
        p.append_step(StepKind::VertexSource).unwrap();
        p.append_step(StepKind::Count).unwrap();
        let strategies: Vec<Arc<dyn Strategy>> = vec![Arc::new(ProfileInjection)];
        apply(&mut p, EngineTag::Standard, &strategies).unwrap();
        assert_eq!(p.len(), 2);
    }

    #[test]
    fn injects_probe_before_every_step() {
        let mut p = Pipeline::new();
        p.append_step(StepKind::VertexSource).unwrap();
        p.append_step(StepKind::Out).unwrap();
        p.append_step(StepKind::Profile).unwrap();
        let strategies: Vec<Arc<dyn Strategy>> = vec![Arc::new(ProfileInjection)];
        apply(&mut p, EngineTag::Standard, &strategies).unwrap();
        assert_eq!(p.len(), 6);
        let kinds: Vec<_> = p.steps().iter().map(|s| s.kind().clone()).collect();
        assert!(matches!(kinds[0], StepKind::ProfileProbe));
        assert!(matches!(kinds[1], StepKind::VertexSource));
        assert!(matches!(kinds[2], StepKind::ProfileProbe));
        assert!(matches!(kinds[3], StepKind::Out));
        assert!(matches!(kinds[4], StepKind::ProfileProbe));
        assert!(matches!(kinds[5], StepKind::Profile));
    }

    #[test]
    fn idempotent_on_already_injected_pipeline() {
        let mut p = Pipeline::new();
        p.append_step(StepKind::VertexSource).unwrap();
        p.append_step(StepKind::Profile).unwrap();
        let mut stats = OptimizationStats::default();
        let mut stats2 = OptimizationStats::default();
        ProfileInjection.apply(&mut p, EngineTag::Standard, &mut stats).unwrap();
        let snapshot = p.clone();
        ProfileInjection.apply(&mut p, EngineTag::Standard, &mut stats2).unwrap();
        assert_eq!(snapshot.len(), p.len());
    }
}
