//! Optimizer Error Types
//!
//! The four error kinds from the strategy framework's contract: structural
//! invariant violations, strategy-ordering misconfiguration, mutation of a
//! frozen pipeline, and the non-error "rule didn't fire" signal used only
//! for diagnostics.

use thiserror::Error;

use crate::pipeline::StepId;

/// Errors raised while building or optimizing a [`crate::pipeline::Pipeline`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OptimizerError {
    /// A structural invariant (pipeline §3) would be violated by a proposed
    /// edit. Fatal for the current `apply`; the pipeline must be discarded.
    #[error("invariant violated at step {step:?}: {reason}")]
    Invariant {
        /// The step the violation was detected at, if any.
        step: Option<StepId>,
        /// Human-readable reason.
        reason: String,
    },

    /// Cyclic or contradictory strategy ordering, an unknown strategy
    /// identifier, or a missing engine tag. Reported before any rewrite runs.
    #[error("strategy configuration error: {0}")]
    Configuration(String),

    /// Mutation attempted on an already-applied (frozen) pipeline.
    #[error("pipeline is frozen and cannot be mutated")]
    Frozen,
}

/// Result alias used throughout the optimizer.
pub type OptimizerResult<T> = Result<T, OptimizerError>;

impl OptimizerError {
    pub(crate) fn invariant(step: Option<StepId>, reason: impl Into<String>) -> Self {
        OptimizerError::Invariant {
            step,
            reason: reason.into(),
        }
    }
}
