//! # Serialized form (§6)
//!
//! A tagged-record rendering of a [`Pipeline`] tree suitable for
//! `serde_json`/`toml` encoding, used to hand a pipeline to a different
//! process or to persist it for inspection. Round-trips structurally:
//! decoding a pipeline produces an equal tree of step kinds, labels and
//! nesting, though step ids are freshly assigned (§3 only guarantees
//! uniqueness, not a stable numbering across processes) and an opaque
//! predicate's identity handle is *not* preserved — only its label, since
//! the optimizer never looks inside an opaque predicate anyway.

use serde::{Deserialize, Serialize};

use crate::error::OptimizerResult;
use crate::pipeline::Pipeline;
use crate::predicate::{OpaqueHandle, Predicate};
use crate::step::{HasContainer, RangeBounds, Step, StepKind};
use crate::value::{ElementRef, Value};

/// Unbounded `range.high` is serialized as this sentinel (§6), matching the
/// wire convention of treating `-1` as "no upper bound".
const UNBOUNDED_SENTINEL: i64 = -1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SerializedValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
    Element(String),
    List(Vec<SerializedValue>),
}

impl From<&Value> for SerializedValue {
    fn from(v: &Value) -> Self {
        match v {
            Value::Int(n) => SerializedValue::Int(*n),
            Value::Float(f) => SerializedValue::Float(*f),
            Value::Bool(b) => SerializedValue::Bool(*b),
            Value::Str(s) => SerializedValue::Str(s.clone()),
            Value::Element(e) => SerializedValue::Element(e.as_str().to_string()),
            Value::List(items) => SerializedValue::List(items.iter().map(SerializedValue::from).collect()),
        }
    }
}

impl From<&SerializedValue> for Value {
    fn from(v: &SerializedValue) -> Self {
        match v {
            SerializedValue::Int(n) => Value::Int(*n),
            SerializedValue::Float(f) => Value::Float(*f),
            SerializedValue::Bool(b) => Value::Bool(*b),
            SerializedValue::Str(s) => Value::Str(s.clone()),
            SerializedValue::Element(id) => Value::Element(ElementRef::new(id.clone())),
            SerializedValue::List(items) => Value::List(items.iter().map(Value::from).collect()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", content = "value", rename_all = "snake_case")]
pub enum SerializedPredicate {
    Eq(SerializedValue),
    Neq(SerializedValue),
    Lt(SerializedValue),
    Lte(SerializedValue),
    Gt(SerializedValue),
    Gte(SerializedValue),
    Inside(SerializedValue, SerializedValue),
    Outside(SerializedValue, SerializedValue),
    Within(Vec<SerializedValue>),
    Without(Vec<SerializedValue>),
    /// Only the label survives — identity comparison is meaningless once a
    /// predicate has crossed a process boundary.
    Opaque(String),
}

impl From<&Predicate> for SerializedPredicate {
    fn from(p: &Predicate) -> Self {
        match p {
            Predicate::Eq(v) => SerializedPredicate::Eq(v.into()),
            Predicate::Neq(v) => SerializedPredicate::Neq(v.into()),
            Predicate::Lt(v) => SerializedPredicate::Lt(v.into()),
            Predicate::Lte(v) => SerializedPredicate::Lte(v.into()),
            Predicate::Gt(v) => SerializedPredicate::Gt(v.into()),
            Predicate::Gte(v) => SerializedPredicate::Gte(v.into()),
            Predicate::Inside(a, b) => SerializedPredicate::Inside(a.into(), b.into()),
            Predicate::Outside(a, b) => SerializedPredicate::Outside(a.into(), b.into()),
            Predicate::Within(vs) => SerializedPredicate::Within(vs.iter().map(SerializedValue::from).collect()),
            Predicate::Without(vs) => SerializedPredicate::Without(vs.iter().map(SerializedValue::from).collect()),
            Predicate::Opaque(handle) => SerializedPredicate::Opaque(format!("{handle:?}")),
        }
    }
}

impl From<&SerializedPredicate> for Predicate {
    fn from(p: &SerializedPredicate) -> Self {
        match p {
            SerializedPredicate::Eq(v) => Predicate::Eq(v.into()),
            SerializedPredicate::Neq(v) => Predicate::Neq(v.into()),
            SerializedPredicate::Lt(v) => Predicate::Lt(v.into()),
            SerializedPredicate::Lte(v) => Predicate::Lte(v.into()),
            SerializedPredicate::Gt(v) => Predicate::Gt(v.into()),
            SerializedPredicate::Gte(v) => Predicate::Gte(v.into()),
            SerializedPredicate::Inside(a, b) => Predicate::Inside(a.into(), b.into()),
            SerializedPredicate::Outside(a, b) => Predicate::Outside(a.into(), b.into()),
            SerializedPredicate::Within(vs) => Predicate::Within(vs.iter().map(Value::from).collect()),
            SerializedPredicate::Without(vs) => Predicate::Without(vs.iter().map(Value::from).collect()),
            SerializedPredicate::Opaque(label) => Predicate::Opaque(OpaqueHandle::new(label.clone())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SerializedStepKind {
    VertexSource,
    EdgeSource,
    Out,
    In,
    Both,
    OutEdges,
    InEdges,
    Has { key: String, predicate: SerializedPredicate },
    HasTraversal { negate: bool },
    Count,
    Is(SerializedPredicate),
    Range { low: i64, high: i64 },
    Identity,
    FilterOpaque { name: String, selectivity_hint: Option<f64> },
    GroupCount,
    Fold,
    Order,
    Profile,
    ProfileProbe,
    VertexSourceById { ids: Vec<SerializedValue> },
    SideEffectOpaque { name: String },
    Opaque { name: String, args: Vec<SerializedValue> },
}

impl From<&StepKind> for SerializedStepKind {
    fn from(k: &StepKind) -> Self {
        match k {
            StepKind::VertexSource => SerializedStepKind::VertexSource,
            StepKind::EdgeSource => SerializedStepKind::EdgeSource,
            StepKind::Out => SerializedStepKind::Out,
            StepKind::In => SerializedStepKind::In,
            StepKind::Both => SerializedStepKind::Both,
            StepKind::OutEdges => SerializedStepKind::OutEdges,
            StepKind::InEdges => SerializedStepKind::InEdges,
            StepKind::Has(c) => SerializedStepKind::Has {
                key: c.key.clone(),
                predicate: (&c.predicate).into(),
            },
            StepKind::HasTraversal { negate } => SerializedStepKind::HasTraversal { negate: *negate },
            StepKind::Count => SerializedStepKind::Count,
            StepKind::Is(p) => SerializedStepKind::Is(p.into()),
            StepKind::Range(r) => SerializedStepKind::Range {
                low: r.low,
                high: r.high.unwrap_or(UNBOUNDED_SENTINEL),
            },
            StepKind::Identity => SerializedStepKind::Identity,
            StepKind::FilterOpaque { name, selectivity_hint } => SerializedStepKind::FilterOpaque {
                name: name.clone(),
                selectivity_hint: *selectivity_hint,
            },
            StepKind::GroupCount => SerializedStepKind::GroupCount,
            StepKind::Fold => SerializedStepKind::Fold,
            StepKind::Order => SerializedStepKind::Order,
            StepKind::Profile => SerializedStepKind::Profile,
            StepKind::ProfileProbe => SerializedStepKind::ProfileProbe,
            StepKind::VertexSourceById(ids) => SerializedStepKind::VertexSourceById {
                ids: ids.iter().map(SerializedValue::from).collect(),
            },
            StepKind::SideEffectOpaque { name } => SerializedStepKind::SideEffectOpaque { name: name.clone() },
            StepKind::Opaque { name, args } => SerializedStepKind::Opaque {
                name: name.clone(),
                args: args.iter().map(SerializedValue::from).collect(),
            },
        }
    }
}

impl From<&SerializedStepKind> for StepKind {
    fn from(k: &SerializedStepKind) -> Self {
        match k {
            SerializedStepKind::VertexSource => StepKind::VertexSource,
            SerializedStepKind::EdgeSource => StepKind::EdgeSource,
            SerializedStepKind::Out => StepKind::Out,
            SerializedStepKind::In => StepKind::In,
            SerializedStepKind::Both => StepKind::Both,
            SerializedStepKind::OutEdges => StepKind::OutEdges,
            SerializedStepKind::InEdges => StepKind::InEdges,
            SerializedStepKind::Has { key, predicate } => {
                StepKind::Has(HasContainer::new(key.clone(), predicate.into()))
            }
            SerializedStepKind::HasTraversal { negate } => StepKind::HasTraversal { negate: *negate },
            SerializedStepKind::Count => StepKind::Count,
            SerializedStepKind::Is(p) => StepKind::Is(p.into()),
            SerializedStepKind::Range { low, high } => StepKind::Range(RangeBounds {
                low: *low,
                high: if *high == UNBOUNDED_SENTINEL { None } else { Some(*high) },
            }),
            SerializedStepKind::Identity => StepKind::Identity,
            SerializedStepKind::FilterOpaque { name, selectivity_hint } => StepKind::FilterOpaque {
                name: name.clone(),
                selectivity_hint: *selectivity_hint,
            },
            SerializedStepKind::GroupCount => StepKind::GroupCount,
            SerializedStepKind::Fold => StepKind::Fold,
            SerializedStepKind::Order => StepKind::Order,
            SerializedStepKind::Profile => StepKind::Profile,
            SerializedStepKind::ProfileProbe => StepKind::ProfileProbe,
            SerializedStepKind::VertexSourceById { ids } => {
                StepKind::VertexSourceById(ids.iter().map(Value::from).collect())
            }
            SerializedStepKind::SideEffectOpaque { name } => StepKind::SideEffectOpaque { name: name.clone() },
            SerializedStepKind::Opaque { name, args } => StepKind::Opaque {
                name: name.clone(),
                args: args.iter().map(Value::from).collect(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedStep {
    pub kind: SerializedStepKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<SerializedPipeline>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SerializedPipeline {
    pub steps: Vec<SerializedStep>,
}

impl From<&Step> for SerializedStep {
    fn from(step: &Step) -> Self {
        SerializedStep {
            kind: step.kind().into(),
            labels: step.labels().to_vec(),
            children: step.children().iter().map(SerializedPipeline::from).collect(),
        }
    }
}

impl From<&Pipeline> for SerializedPipeline {
    fn from(pipeline: &Pipeline) -> Self {
        SerializedPipeline {
            steps: pipeline.steps().iter().map(SerializedStep::from).collect(),
        }
    }
}

impl SerializedPipeline {
    /// Rebuild a fresh, mutable [`Pipeline`] from this serialized form.
    /// Step ids are newly assigned; structure, kinds and labels are
    /// preserved exactly.
    pub fn to_pipeline(&self) -> OptimizerResult<Pipeline> {
        let mut pipeline = Pipeline::new();
        self.populate(&mut pipeline)?;
        Ok(pipeline)
    }

    fn populate(&self, pipeline: &mut Pipeline) -> OptimizerResult<()> {
        for step in &self.steps {
            let id = pipeline.append_step((&step.kind).into())?;
            for label in &step.labels {
                pipeline.label_step(id, label.clone())?;
            }
            for child in &step.children {
                let mut child_pipeline = pipeline.child_pipeline();
                child.populate(&mut child_pipeline)?;
                pipeline.attach_child(id, child_pipeline)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predicate::Predicate;
    use crate::step::HasContainer;

    fn sample_pipeline() -> Pipeline {
        let mut p = Pipeline::new();
        p.append_step(StepKind::VertexSource).unwrap();
        p.append_step(StepKind::Has(HasContainer::new("name", Predicate::Eq(Value::Str("a".into())))))
            .unwrap();
        p.append_step(StepKind::Count).unwrap();
        let is_id = p.append_step(StepKind::Is(Predicate::Gte(Value::Int(3)))).unwrap();
        p.label_step(is_id, "result").unwrap();
        p
    }

    #[test]
    fn round_trips_flat_pipeline() {
        let p = sample_pipeline();
        let serialized = SerializedPipeline::from(&p);
        let rebuilt = serialized.to_pipeline().unwrap();
        let rebuilt_serialized = SerializedPipeline::from(&rebuilt);
        assert_eq!(serialized, rebuilt_serialized);
    }

    #[test]
    fn round_trips_through_json() {
        let p = sample_pipeline();
        let serialized = SerializedPipeline::from(&p);
        let json = serde_json::to_string(&serialized).unwrap();
        let decoded: SerializedPipeline = serde_json::from_str(&json).unwrap();
        assert_eq!(serialized, decoded);
    }

    #[test]
    fn unbounded_range_round_trips_as_sentinel() {
        let mut p = Pipeline::new();
        p.append_step(StepKind::Range(RangeBounds::unbounded(5))).unwrap();
        let serialized = SerializedPipeline::from(&p);
        let json = serde_json::to_value(&serialized).unwrap();
        assert_eq!(json["steps"][0]["high"], serde_json::json!(-1));
    }

    #[test]
    fn nested_child_pipeline_round_trips() {
        let mut p = Pipeline::new();
        let has_id = p
            .append_step(StepKind::HasTraversal { negate: false })
            .unwrap();
        let mut child = p.child_pipeline();
        child.append_step(StepKind::Out).unwrap();
        child.append_step(StepKind::Count).unwrap();
        p.attach_child(has_id, child).unwrap();

        let serialized = SerializedPipeline::from(&p);
        let rebuilt = serialized.to_pipeline().unwrap();
        assert_eq!(SerializedPipeline::from(&rebuilt), serialized);
        assert_eq!(rebuilt.steps()[0].children()[0].len(), 2);
    }
}
