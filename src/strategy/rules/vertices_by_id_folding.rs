//! # VerticesByIdFolding (§4.3.2)
//!
//! Fold a `vertex-source` immediately followed by an unlabeled
//! `has("id", eq(v) | within([v...]))` into a single
//! [`StepKind::VertexSourceById`] direct lookup.

use crate::engine::EngineTag;
use crate::error::OptimizerResult;
use crate::helper;
use crate::pipeline::Pipeline;
use crate::predicate::Predicate;
use crate::step::StepKind;
use crate::strategy::Strategy;
use crate::trace::OptimizationStats;

pub struct VerticesByIdFolding;

const ID_KEY: &str = "id";

impl Strategy for VerticesByIdFolding {
    fn id(&self) -> &'static str {
        "VerticesByIdFolding"
    }

    fn apply(
        &self,
        pipeline: &mut Pipeline,
        _engine: EngineTag,
        stats: &mut OptimizationStats,
    ) -> OptimizerResult<bool> {
        let mut fired = false;

        loop {
            let found = pipeline.steps().windows(2).find_map(|w| {
                let (source, filter) = (&w[0], &w[1]);
                if !matches!(source.kind(), StepKind::VertexSource) || source.is_labeled() {
                    return None;
                }
                if filter.is_labeled() {
                    return None;
                }
                match filter.kind() {
                    StepKind::Has(container) if container.key == ID_KEY => {
                        let ids = match &container.predicate {
                            Predicate::Eq(v) => Some(vec![v.clone()]),
                            Predicate::Within(vs) => Some(vs.clone()),
                            _ => None,
                        };
                        ids.map(|ids| (source.id(), filter.id(), ids))
                    }
                    _ => None,
                }
            });

            let Some((source_id, filter_id, ids)) = found else {
                break;
            };

            helper::replace(pipeline, source_id, StepKind::VertexSourceById(ids))?;
            helper::remove(pipeline, filter_id)?;
            stats.record_replaced(1);
            stats.record_removed(1);
            fired = true;
        }

        Ok(fired)
    }
}
