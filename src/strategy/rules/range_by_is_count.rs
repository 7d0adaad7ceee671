//! # RangeByIsCount (§4.3.1)
//!
//! Truncates `… count is(P, V)` to the smallest prefix that still decides
//! `is(P, V)` exactly, by inserting a `range(0, highRange)` immediately
//! before `count`.

use crate::engine::{EngineRestriction, EngineTag};
use crate::error::OptimizerResult;
use crate::helper;
use crate::pipeline::{Pipeline, StepId};
use crate::predicate::Predicate;
use crate::step::{RangeBounds, StepKind};
use crate::strategy::Strategy;
use crate::trace::{OptimizationStats, UnsupportedReason};
use crate::value::Value;

pub struct RangeByIsCount;

/// The per-predicate `highRange` derivation from the table in §4.3.1.
/// Returns `None` when the rule cannot fire for this predicate: a negative
/// bound, an empty `within`/`without` set, a non-integer value, or an
/// opaque user predicate.
fn high_range_for(predicate: &Predicate) -> Option<i64> {
    let as_nonneg_int = |v: &Value| -> Option<i64> {
        let n = v.as_int()?;
        (!v.is_negative_number()).then_some(n)
    };

    match predicate {
        Predicate::Eq(v) | Predicate::Neq(v) | Predicate::Lte(v) => {
            as_nonneg_int(v).map(|n| n + 1)
        }
        Predicate::Lt(v) => as_nonneg_int(v),
        Predicate::Gt(v) => as_nonneg_int(v).map(|n| n + 1),
        Predicate::Gte(v) => as_nonneg_int(v),
        Predicate::Inside(_, hi) => as_nonneg_int(hi),
        Predicate::Outside(_, hi) => as_nonneg_int(hi).map(|b| b + 1),
        Predicate::Within(set) => {
            if set.is_empty() {
                return None;
            }
            let ints: Option<Vec<i64>> = set.iter().map(Value::as_int).collect();
            let max = ints?.into_iter().max()?;
            (max >= 0).then_some(max + 1)
        }
        Predicate::Without(set) => {
            if set.is_empty() {
                return None;
            }
            let ints: Option<Vec<i64>> = set.iter().map(Value::as_int).collect();
            let max = ints?.into_iter().max()?;
            (max >= 0).then_some(max)
        }
        Predicate::Opaque(_) => None,
    }
}

/// Steps immediately following `count_pos` that are `is(...)`, i.e. a
/// conjunction of `is` steps directly after `count` (§9's resolved open
/// question: combine by taking the max `highRange`).
fn trailing_is_predicates(pipeline: &Pipeline, count_pos: usize) -> Vec<Predicate> {
    let mut out = Vec::new();
    for step in pipeline.steps().iter().skip(count_pos + 1) {
        match step.kind() {
            StepKind::Is(p) => out.push(p.clone()),
            _ => break,
        }
    }
    out
}

/// Combined `highRange` for a run of conjoined `is` steps, or `None` if any
/// one of them disqualifies the rewrite (conservative: every condition in
/// the conjunction must be decidable on the truncated stream).
fn combined_high_range(predicates: &[Predicate]) -> Option<i64> {
    if predicates.is_empty() {
        return None;
    }
    predicates
        .iter()
        .map(high_range_for)
        .collect::<Option<Vec<i64>>>()
        .map(|ranges| ranges.into_iter().max().expect("non-empty"))
}

/// The nearest barrier step strictly before `count_pos`, if any — the
/// `COMPUTER` legality check only looks upstream of it (§4.3.1, "Engine
/// interaction").
fn region_start_after_last_barrier(pipeline: &Pipeline, count_pos: usize) -> usize {
    pipeline.steps()[..count_pos]
        .iter()
        .rposition(|s| s.kind().is_barrier())
        .map(|p| p + 1)
        .unwrap_or(0)
}

/// `COMPUTER` legality (§4.3.1): the region between the last barrier and
/// `count` must carry no side effects and no label (our conservative
/// rendering of "no label consumed downstream of count", since this IR has
/// no explicit label-consumer edges to inspect directly — see DESIGN.md).
fn computer_legal(pipeline: &Pipeline, count_pos: usize) -> bool {
    let start = region_start_after_last_barrier(pipeline, count_pos);
    pipeline.steps()[start..count_pos]
        .iter()
        .all(|s| !s.has_side_effects() && !s.is_labeled())
}

/// `Some(m)` if `pred_pos` holds an already-`range(0, m)` step (`m` itself
/// possibly `None` for unbounded); `None` if it isn't a zero-based range at
/// all.
fn existing_zero_based_range(pipeline: &Pipeline, pred_pos: usize) -> Option<Option<i64>> {
    match pipeline.steps().get(pred_pos)?.kind() {
        StepKind::Range(bounds) if bounds.low == 0 => Some(bounds.high),
        _ => None,
    }
}

impl Strategy for RangeByIsCount {
    fn id(&self) -> &'static str {
        "RangeByIsCount"
    }

    fn before(&self) -> &'static [&'static str] {
        &["RangeMerge"]
    }

    fn engine_restriction(&self) -> EngineRestriction {
        EngineRestriction::Any
    }

    fn apply(
        &self,
        pipeline: &mut Pipeline,
        engine: EngineTag,
        stats: &mut OptimizationStats,
    ) -> OptimizerResult<bool> {
        let mut fired = false;

        // Re-scan after each mutation since positions shift; a `count`
        // step is only ever rewritten once (its predecessor becomes the
        // merged range), so this converges.
        loop {
            let count_positions: Vec<usize> = pipeline
                .steps()
                .iter()
                .enumerate()
                .filter(|(_, s)| matches!(s.kind(), StepKind::Count))
                .map(|(i, _)| i)
                .collect();

            let mut progressed = false;

            for count_pos in count_positions {
                let predicates = trailing_is_predicates(pipeline, count_pos);
                let Some(high_range) = combined_high_range(&predicates) else {
                    stats.record_unsupported(self.id(), UnsupportedReason::NoMatch);
                    continue;
                };
                if high_range == 0 {
                    stats.record_unsupported(self.id(), UnsupportedReason::NoMatch);
                    continue;
                }
                if engine == EngineTag::Computer && !computer_legal(pipeline, count_pos) {
                    stats.record_unsupported(self.id(), UnsupportedReason::PreconditionFailed);
                    continue;
                }

                if count_pos > 0 {
                    if let Some(existing) = existing_zero_based_range(pipeline, count_pos - 1) {
                        let merged = match existing {
                            Some(m) => Some(m.min(high_range)),
                            None => Some(high_range),
                        };
                        if merged != existing {
                            let id: StepId = pipeline.steps()[count_pos - 1].id();
                            helper::replace(
                                pipeline,
                                id,
                                StepKind::Range(RangeBounds {
                                    low: 0,
                                    high: merged,
                                }),
                            )?;
                            stats.record_replaced(1);
                            progressed = true;
                        }
                        fired = true;
                        continue;
                    }
                }

                let count_id = pipeline.steps()[count_pos].id();
                helper::insert_before(
                    pipeline,
                    count_id,
                    StepKind::Range(RangeBounds::bounded(0, high_range)),
                )?;
                stats.record_inserted(1);
                fired = true;
                progressed = true;
            }

            if !progressed {
                break;
            }
        }

        Ok(fired)
    }
}
