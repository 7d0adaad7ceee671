//! # Predicate model (C1)
//!
//! The closed sum of predicates a rewrite rule is allowed to reason about.
//! User-opaque predicates are carried as an inert handle: the optimizer
//! compares them only for identity, never pattern-matches their contents
//! (Design Notes §9).

use std::sync::Arc;

use crate::value::Value;

/// An opaque, user-supplied predicate the optimizer treats as a black box.
/// Two handles are the same predicate iff they point at the same
/// allocation — content is never inspected.
#[derive(Debug, Clone)]
pub struct OpaqueHandle(Arc<str>);

impl OpaqueHandle {
    pub fn new(label: impl Into<Arc<str>>) -> Self {
        OpaqueHandle(label.into())
    }
}

impl PartialEq for OpaqueHandle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}
impl Eq for OpaqueHandle {}

/// A predicate attached to an `is`/`has` step.
///
/// `inside`/`outside` are strict on both ends (§3); `within`/`without`
/// carry a finite set of values.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Eq(Value),
    Neq(Value),
    Lt(Value),
    Lte(Value),
    Gt(Value),
    Gte(Value),
    /// Strict exclusive range `(lo, hi)`.
    Inside(Value, Value),
    /// Strict exclusive complement of a range `(lo, hi)`.
    Outside(Value, Value),
    Within(Vec<Value>),
    Without(Vec<Value>),
    /// Never pattern-matched by any rewrite rule — no rewrite is assumed.
    Opaque(OpaqueHandle),
}

impl Predicate {
    /// True for the closed set of predicates `RangeByIsCount` knows how to
    /// derive a `highRange` for; `Opaque` is always `false`.
    pub fn is_count_decidable(&self) -> bool {
        !matches!(self, Predicate::Opaque(_))
    }
}
