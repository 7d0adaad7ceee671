//! # Pipeline Helper (C4)
//!
//! Structural queries and edits over pipelines, used by every rewrite
//! rule. Each query is a pure function of the current pipeline; edits are
//! synchronous, sequential, and mutate in place (§4.1). None of these
//! functions recurse into nested child pipelines unless stated — strategy
//! application itself handles recursion into children (§4.2 step 3).

use crate::error::{OptimizerError, OptimizerResult};
use crate::pipeline::{Pipeline, StepId};
use crate::step::{Step, StepKind};

/// `positionOf(step)` (§4.1): zero-based index, or `None`.
pub fn position_of(pipeline: &Pipeline, id: StepId) -> Option<usize> {
    pipeline.steps().iter().position(|s| s.id() == id)
}

/// `stepsOfKind(K, pipeline)` (§4.1): ordered sequence of steps in this
/// pipeline (not recursing into children) matching `matcher`.
pub fn steps_matching<'a>(
    pipeline: &'a Pipeline,
    matcher: impl Fn(&StepKind) -> bool + 'a,
) -> impl Iterator<Item = &'a Step> + 'a {
    pipeline.steps().iter().filter(move |s| matcher(s.kind()))
}

/// Deep variant of [`steps_matching`]: also recurses into nested child
/// pipelines, pre-order.
pub fn steps_matching_deep(pipeline: &Pipeline, matcher: impl Fn(&StepKind) -> bool + Copy) -> Vec<StepId> {
    let mut out = Vec::new();
    walk(pipeline, &mut |p, s| {
        if matcher(s.kind()) {
            out.push(s.id());
        }
        let _ = p;
    });
    out
}

/// `predecessor(step)` (§4.1): the adjacent step in the parent pipeline, or
/// `None` at the start.
pub fn predecessor(pipeline: &Pipeline, id: StepId) -> Option<&Step> {
    let pos = position_of(pipeline, id)?;
    pos.checked_sub(1).and_then(|p| pipeline.steps().get(p))
}

/// `successor(step)` (§4.1): the adjacent step in the parent pipeline, or
/// `None` at the end.
pub fn successor(pipeline: &Pipeline, id: StepId) -> Option<&Step> {
    let pos = position_of(pipeline, id)?;
    pipeline.steps().get(pos + 1)
}

/// `insertBefore(new, existing)` (§4.1): insert a freshly-built step
/// immediately before `existing`, returning its id.
pub fn insert_before(
    pipeline: &mut Pipeline,
    existing: StepId,
    kind: StepKind,
) -> OptimizerResult<StepId> {
    if pipeline.is_frozen() {
        return Err(OptimizerError::Frozen);
    }
    let pos = position_of(pipeline, existing)
        .ok_or_else(|| OptimizerError::invariant(Some(existing), "no such step"))?;
    insert_at(pipeline, pos, kind)
}

/// `insertAfter(new, existing)` (§4.1).
pub fn insert_after(
    pipeline: &mut Pipeline,
    existing: StepId,
    kind: StepKind,
) -> OptimizerResult<StepId> {
    if pipeline.is_frozen() {
        return Err(OptimizerError::Frozen);
    }
    let pos = position_of(pipeline, existing)
        .ok_or_else(|| OptimizerError::invariant(Some(existing), "no such step"))?;
    insert_at(pipeline, pos + 1, kind)
}

fn insert_at(pipeline: &mut Pipeline, pos: usize, kind: StepKind) -> OptimizerResult<StepId> {
    // Append to get a fresh, tree-unique id, then splice it into position.
    let id = pipeline.append_step(kind)?;
    let new_step = pipeline.steps_mut_for_helper().pop().expect("just pushed");
    pipeline.steps_mut_for_helper().insert(pos, new_step);
    Ok(id)
}

/// `replace(old, new)` (§4.1): swap `old`'s kind for `new`, keeping its id,
/// labels, children and requirements untouched (the rule is responsible
/// for reconciling requirements if the new kind needs more).
pub fn replace(pipeline: &mut Pipeline, old: StepId, new_kind: StepKind) -> OptimizerResult<()> {
    if pipeline.is_frozen() {
        return Err(OptimizerError::Frozen);
    }
    let step = pipeline
        .step_mut(old)
        .ok_or_else(|| OptimizerError::invariant(Some(old), "no such step"))?;
    step.set_kind(new_kind);
    Ok(())
}

/// `remove(step)` (§4.1). Fails with `Invariant` if another step's label
/// reference would dangle as a result — callers are expected to migrate or
/// drop labels before removing a labeled step.
pub fn remove(pipeline: &mut Pipeline, id: StepId) -> OptimizerResult<()> {
    if pipeline.is_frozen() {
        return Err(OptimizerError::Frozen);
    }
    let pos = position_of(pipeline, id)
        .ok_or_else(|| OptimizerError::invariant(Some(id), "no such step"))?;
    if pipeline.steps()[pos].is_labeled() {
        return Err(OptimizerError::invariant(
            Some(id),
            "cannot remove a labeled step without first migrating its label",
        ));
    }
    pipeline.steps_mut_for_helper().remove(pos);
    Ok(())
}

/// `lift(childPipeline, intoParent, atPosition)` (§4.1): splice a nested
/// pipeline's steps into the parent at `at_position`, consuming the child.
/// The lifted steps keep their (tree-unique) ids.
pub fn lift(parent: &mut Pipeline, child: Pipeline, at_position: usize) -> OptimizerResult<()> {
    if parent.is_frozen() {
        return Err(OptimizerError::Frozen);
    }
    let lifted_steps = child.into_steps();
    let dest = parent.steps_mut_for_helper();
    for (offset, step) in lifted_steps.into_iter().enumerate() {
        dest.insert(at_position + offset, step);
    }
    Ok(())
}

/// `walk(pipeline, visitor)` (§4.1): pre-order traversal including nested
/// child pipelines.
pub fn walk(pipeline: &Pipeline, visitor: &mut impl FnMut(&Pipeline, &Step)) {
    for step in pipeline.steps() {
        visitor(pipeline, step);
        for child in step.children() {
            walk(child, visitor);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::step::StepKind;

    #[test]
    fn insert_before_shifts_position() {
        let mut p = Pipeline::new();
        let a = p.append_step(StepKind::VertexSource).unwrap();
        let b = p.append_step(StepKind::Count).unwrap();
        let r = insert_before(&mut p, b, StepKind::Identity).unwrap();
        assert_eq!(position_of(&p, r), Some(1));
        assert_eq!(position_of(&p, a), Some(0));
        assert_eq!(position_of(&p, b), Some(2));
    }

    #[test]
    fn predecessor_and_successor() {
        let mut p = Pipeline::new();
        let a = p.append_step(StepKind::VertexSource).unwrap();
        let b = p.append_step(StepKind::Count).unwrap();
        assert_eq!(predecessor(&p, b).unwrap().id(), a);
        assert_eq!(successor(&p, a).unwrap().id(), b);
        assert!(predecessor(&p, a).is_none());
        assert!(successor(&p, b).is_none());
    }

    #[test]
    fn remove_labeled_step_rejected() {
        let mut p = Pipeline::new();
        let a = p.append_step(StepKind::VertexSource).unwrap();
        p.label_step(a, "x").unwrap();
        assert!(remove(&mut p, a).is_err());
    }
}
