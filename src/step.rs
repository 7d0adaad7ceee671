//! # Step catalog (C2)
//!
//! The tagged variants of pipeline steps and their semantic attributes.
//! Kinds not listed here ("others exist but are opaque to listed rules",
//! §3) are represented by [`StepKind::Opaque`] so the pipeline can still
//! carry steps no rewrite rule understands without losing round-trip
//! fidelity.

use crate::pipeline::{Pipeline, StepId};
use crate::predicate::Predicate;
use crate::requirement::RequirementSet;
use crate::value::Value;

/// `(key, predicate, value)` triple carried by `has`-family steps.
#[derive(Debug, Clone, PartialEq)]
pub struct HasContainer {
    pub key: String,
    pub predicate: Predicate,
}

impl HasContainer {
    pub fn new(key: impl Into<String>, predicate: Predicate) -> Self {
        HasContainer {
            key: key.into(),
            predicate,
        }
    }
}

/// Inclusive-low, exclusive-or-unbounded-high bound pair for `range`.
///
/// `high = None` means unbounded (serialized as `-1`, §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeBounds {
    pub low: i64,
    pub high: Option<i64>,
}

impl RangeBounds {
    pub fn bounded(low: i64, high: i64) -> Self {
        RangeBounds {
            low,
            high: Some(high),
        }
    }

    pub fn unbounded(low: i64) -> Self {
        RangeBounds { low, high: None }
    }

    /// The number of elements this range admits, if finite.
    pub fn len(&self) -> Option<i64> {
        self.high.map(|h| (h - self.low).max(0))
    }
}

/// The tagged kind of a pipeline step.
#[derive(Debug, Clone, PartialEq)]
pub enum StepKind {
    VertexSource,
    EdgeSource,
    Out,
    In,
    Both,
    OutEdges,
    InEdges,
    /// A `has`-family filter over a single container.
    Has(HasContainer),
    /// `has(child-traversal)`, optionally negated. The nested body lives in
    /// the owning [`crate::pipeline::Step`]'s `children[0]`.
    HasTraversal { negate: bool },
    Count,
    /// `is(predicate, value)`; the predicate variant itself carries `value`
    /// (§3's separate "value" is folded into the predicate here).
    Is(Predicate),
    Range(RangeBounds),
    Identity,
    /// A pure filter step this crate's rules don't special-case, carrying a
    /// declared selectivity hint used by `FilterReordering`.
    FilterOpaque {
        name: String,
        selectivity_hint: Option<f64>,
    },
    GroupCount,
    Fold,
    Order,
    Profile,
    /// Internal marker step inserted by `ProfileInjection` (§4.3.2) ahead
    /// of every other step once a `Profile` step is present anywhere in
    /// the pipeline. Not part of the externally-named step kinds in §3;
    /// an implementation detail of that one rule.
    ProfileProbe,
    /// A `vertex-source` folded with an `id` constraint by
    /// `VerticesByIdFolding` (§4.3.2): a direct id-lookup.
    VertexSourceById(Vec<Value>),
    SideEffectOpaque {
        name: String,
    },
    /// Any other kind, carried opaquely for round-trip fidelity.
    Opaque {
        name: String,
        args: Vec<Value>,
    },
}

impl StepKind {
    /// True for steps `FilterReordering` (§4.3.2) is allowed to permute:
    /// steps that only decide whether a traverser continues, never mutate
    /// side effects, and (per the contract) carry no nested traversal with
    /// side effects of its own.
    pub fn is_pure_filter(&self) -> bool {
        matches!(
            self,
            StepKind::Has(_) | StepKind::Is(_) | StepKind::FilterOpaque { .. }
        )
    }

    pub fn is_barrier(&self) -> bool {
        matches!(
            self,
            StepKind::Count | StepKind::Order | StepKind::Fold | StepKind::GroupCount
        )
    }

    pub fn selectivity_hint(&self) -> Option<f64> {
        match self {
            StepKind::FilterOpaque {
                selectivity_hint, ..
            } => *selectivity_hint,
            _ => None,
        }
    }
}

/// A node in a pipeline (§3).
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    id: StepId,
    kind: StepKind,
    labels: Vec<String>,
    children: Vec<Pipeline>,
    requirements: RequirementSet,
}

impl Step {
    pub(crate) fn new(id: StepId, kind: StepKind) -> Self {
        let requirements = Self::intrinsic_requirements(&kind);
        Step {
            id,
            kind,
            labels: Vec::new(),
            children: Vec::new(),
            requirements,
        }
    }

    fn intrinsic_requirements(kind: &StepKind) -> RequirementSet {
        use crate::requirement::Requirement::*;
        match kind {
            StepKind::Count | StepKind::Fold | StepKind::Order | StepKind::GroupCount => {
                RequirementSet::of([Bulk, Object])
            }
            StepKind::SideEffectOpaque { .. } => RequirementSet::of([SideEffects, Object]),
            StepKind::HasTraversal { .. } => RequirementSet::of([Object]),
            StepKind::Profile | StepKind::ProfileProbe => RequirementSet::of([Bulk, Object]),
            _ => RequirementSet::of([Object]),
        }
    }

    pub fn id(&self) -> StepId {
        self.id
    }

    pub fn kind(&self) -> &StepKind {
        &self.kind
    }

    pub fn kind_mut(&mut self) -> &mut StepKind {
        &mut self.kind
    }

    pub fn set_kind(&mut self, kind: StepKind) {
        self.kind = kind;
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn add_label(&mut self, label: impl Into<String>) {
        self.labels.push(label.into());
    }

    pub fn is_labeled(&self) -> bool {
        !self.labels.is_empty()
    }

    pub fn children(&self) -> &[Pipeline] {
        &self.children
    }

    pub fn children_mut(&mut self) -> &mut Vec<Pipeline> {
        &mut self.children
    }

    pub fn push_child(&mut self, child: Pipeline) {
        self.children.push(child);
    }

    pub fn requirements(&self) -> RequirementSet {
        self.requirements
    }

    pub fn add_requirement(&mut self, r: crate::requirement::Requirement) {
        self.requirements.insert(r);
    }

    /// True if this step has a side effect directly, or through a nested
    /// child pipeline that does — used by `RangeByIsCount`'s `COMPUTER`
    /// legality check and `FilterReordering`'s "pure filter run" contract.
    pub fn has_side_effects(&self) -> bool {
        matches!(self.kind, StepKind::SideEffectOpaque { .. })
            || self
                .children
                .iter()
                .any(|c| c.steps().iter().any(Step::has_side_effects))
    }
}
