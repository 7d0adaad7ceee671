//! # Pipeline (C3)
//!
//! An ordered, mutable sequence of [`Step`]s with stable identities and
//! nesting. Implemented as an arena (Design Notes §9): steps are addressed
//! by a dense [`StepId`], never by pointer, and predecessor/successor are
//! recomputed from array position rather than stored, so invariant (ii)
//! (§3) holds by construction.

use std::cell::Cell;
use std::rc::Rc;

use crate::engine::EngineTag;
use crate::error::{OptimizerError, OptimizerResult};
use crate::requirement::RequirementSet;
use crate::step::{Step, StepKind};

/// A stable identifier for a [`Step`], unique within a pipeline tree
/// (invariant (i), §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StepId(u64);

#[derive(Debug, Clone)]
struct IdGen(Rc<Cell<u64>>);

impl IdGen {
    fn new() -> Self {
        IdGen(Rc::new(Cell::new(0)))
    }

    fn next(&self) -> StepId {
        let id = self.0.get();
        self.0.set(id + 1);
        StepId(id)
    }
}

/// Ordered sequence of steps (§3). A pipeline is created *mutable*, is
/// transitioned to *applied* exactly once by the strategy framework, and is
/// read-only thereafter (Lifecycle, §3).
#[derive(Debug, Clone)]
pub struct Pipeline {
    steps: Vec<Step>,
    id_gen: IdGen,
    engine: Option<EngineTag>,
    frozen: bool,
}

impl Pipeline {
    /// `newPipeline()` (§6): a fresh, mutable, unoptimized pipeline.
    pub fn new() -> Self {
        Pipeline {
            steps: Vec::new(),
            id_gen: IdGen::new(),
            engine: None,
            frozen: false,
        }
    }

    /// Construct an empty pipeline meant to be attached as a nested child
    /// of a step in `self` (via [`Pipeline::attach_child`]). Sharing the
    /// id generator keeps identifiers unique across the whole tree
    /// (invariant (i)), not just within one arena.
    pub fn child_pipeline(&self) -> Pipeline {
        Pipeline {
            steps: Vec::new(),
            id_gen: self.id_gen.clone(),
            engine: self.engine,
            frozen: false,
        }
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub fn engine_tag(&self) -> Option<EngineTag> {
        self.engine
    }

    pub(crate) fn set_engine_tag(&mut self, tag: EngineTag) {
        self.engine = Some(tag);
        for step in &mut self.steps {
            for child in step.children_mut() {
                child.set_engine_tag(tag);
            }
        }
    }

    pub(crate) fn freeze(&mut self) {
        self.frozen = true;
        for step in &mut self.steps {
            for child in step.children_mut() {
                child.freeze();
            }
        }
    }

    fn check_mutable(&self) -> OptimizerResult<()> {
        if self.frozen {
            Err(OptimizerError::Frozen)
        } else {
            Ok(())
        }
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Direct mutable access to the step order, for the helper module
    /// (C4) only. All structural invariants are the helper functions'
    /// responsibility; this crate never exposes it outside `crate::`.
    pub(crate) fn steps_mut_for_helper(&mut self) -> &mut Vec<Step> {
        &mut self.steps
    }

    /// Consumes the pipeline, returning its steps in order — used by
    /// `helper::lift` to splice a child's steps into its parent.
    pub(crate) fn into_steps(self) -> Vec<Step> {
        self.steps
    }

    pub fn step(&self, id: StepId) -> Option<&Step> {
        self.steps.iter().find(|s| s.id() == id)
    }

    pub fn step_mut(&mut self, id: StepId) -> Option<&mut Step> {
        self.steps.iter_mut().find(|s| s.id() == id)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// `appendStep(kind, args...)` (§6).
    pub fn append_step(&mut self, kind: StepKind) -> OptimizerResult<StepId> {
        self.check_mutable()?;
        let id = self.id_gen.next();
        self.steps.push(Step::new(id, kind));
        Ok(id)
    }

    /// `attachChildPipeline(parentStep, child)` (§6). The child must have
    /// been built from [`Pipeline::child_pipeline`] so ids stay unique
    /// across the tree.
    pub fn attach_child(&mut self, parent: StepId, child: Pipeline) -> OptimizerResult<()> {
        self.check_mutable()?;
        let step = self
            .step_mut(parent)
            .ok_or_else(|| OptimizerError::invariant(Some(parent), "no such step"))?;
        step.push_child(child);
        Ok(())
    }

    /// `labelStep(step, name)` (§6). Fails if the label is already used
    /// anywhere in the tree (invariant (iii)).
    pub fn label_step(&mut self, id: StepId, name: impl Into<String>) -> OptimizerResult<()> {
        self.check_mutable()?;
        let name = name.into();
        if self.all_labels().contains(&name) {
            return Err(OptimizerError::invariant(
                Some(id),
                format!("label '{name}' is already in use"),
            ));
        }
        let step = self
            .step_mut(id)
            .ok_or_else(|| OptimizerError::invariant(Some(id), "no such step"))?;
        step.add_label(name);
        Ok(())
    }

    fn all_labels(&self) -> Vec<String> {
        let mut labels: Vec<String> = self.steps.iter().flat_map(|s| s.labels().to_vec()).collect();
        for step in &self.steps {
            for child in step.children() {
                labels.extend(child.all_labels());
            }
        }
        labels
    }

    /// The requirement set aggregated at pipeline root: the union over all
    /// steps and their nested child pipelines (§6).
    pub fn aggregated_requirements(&self) -> RequirementSet {
        let mut set = RequirementSet::EMPTY;
        for step in &self.steps {
            set |= step.requirements();
            for child in step.children() {
                set |= child.aggregated_requirements();
            }
        }
        set
    }

    /// Validate the structural invariants from §3. Called after every edit
    /// in debug builds and by tests; a violation here is always a bug in
    /// this crate, not user input, since the helper functions are supposed
    /// to maintain these invariants by construction.
    pub fn check_invariants(&self) -> OptimizerResult<()> {
        let mut seen = std::collections::HashSet::new();
        self.check_ids_unique(&mut seen)?;

        let mut labels = std::collections::HashSet::new();
        self.check_labels_unique(&mut labels)?;

        self.check_requirement_subset()?;
        Ok(())
    }

    fn check_ids_unique(&self, seen: &mut std::collections::HashSet<StepId>) -> OptimizerResult<()> {
        for step in &self.steps {
            if !seen.insert(step.id()) {
                return Err(OptimizerError::invariant(
                    Some(step.id()),
                    "duplicate step id",
                ));
            }
            for child in step.children() {
                child.check_ids_unique(seen)?;
            }
        }
        Ok(())
    }

    fn check_labels_unique(&self, seen: &mut std::collections::HashSet<String>) -> OptimizerResult<()> {
        for step in &self.steps {
            for label in step.labels() {
                if !seen.insert(label.clone()) {
                    return Err(OptimizerError::invariant(
                        Some(step.id()),
                        format!("duplicate label '{label}'"),
                    ));
                }
            }
            for child in step.children() {
                child.check_labels_unique(seen)?;
            }
        }
        Ok(())
    }

    fn check_requirement_subset(&self) -> OptimizerResult<()> {
        let parent_reqs = self.aggregated_requirements();
        for step in &self.steps {
            for child in step.children() {
                let child_reqs = child.aggregated_requirements();
                if !child_reqs.is_subset_of(&parent_reqs) {
                    return Err(OptimizerError::invariant(
                        Some(step.id()),
                        "child pipeline requirements are not a subset of the parent's",
                    ));
                }
                child.check_requirement_subset()?;
            }
        }
        Ok(())
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Pipeline::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_and_label() {
        let mut p = Pipeline::new();
        let s = p.append_step(StepKind::VertexSource).unwrap();
        p.label_step(s, "a").unwrap();
        assert_eq!(p.step(s).unwrap().labels(), &["a".to_string()]);
    }

    #[test]
    fn duplicate_label_rejected() {
        let mut p = Pipeline::new();
        let a = p.append_step(StepKind::VertexSource).unwrap();
        let b = p.append_step(StepKind::Identity).unwrap();
        p.label_step(a, "x").unwrap();
        assert!(p.label_step(b, "x").is_err());
    }

    #[test]
    fn frozen_rejects_mutation() {
        let mut p = Pipeline::new();
        p.append_step(StepKind::VertexSource).unwrap();
        p.freeze();
        assert!(p.append_step(StepKind::Identity).is_err());
    }

    #[test]
    fn child_ids_disjoint_from_parent() {
        let mut p = Pipeline::new();
        let parent_step = p.append_step(StepKind::HasTraversal { negate: false }).unwrap();
        let mut child = p.child_pipeline();
        let child_step = child.append_step(StepKind::Count).unwrap();
        assert_ne!(parent_step, child_step);
        p.attach_child(parent_step, child).unwrap();
        p.check_invariants().unwrap();
    }
}
