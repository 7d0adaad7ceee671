//! Algebraic rewrite strategies for graph-traversal query pipelines.
//!
//! Build a [`pipeline::Pipeline`] with [`pipeline::Pipeline::append_step`]
//! and friends, then hand it to [`strategy::apply`] with an
//! [`engine::EngineTag`] and a strategy set (typically
//! [`strategy::StrategyRegistry::all`]) to rewrite it in place into a
//! cheaper, semantically equivalent pipeline. The flagship rule,
//! [`strategy::rules::RangeByIsCount`], folds a trailing `count` + `is`
//! comparison into an upstream `range`, so the executor never materializes
//! more elements than the comparison could possibly need.
//!
//! ```
//! use travopt::engine::EngineTag;
//! use travopt::pipeline::Pipeline;
//! use travopt::predicate::Predicate;
//! use travopt::step::StepKind;
//! use travopt::strategy::{self, StrategyRegistry};
//! use travopt::value::Value;
//!
//! let mut pipeline = Pipeline::new();
//! pipeline.append_step(StepKind::VertexSource).unwrap();
//! pipeline.append_step(StepKind::Out).unwrap();
//! pipeline.append_step(StepKind::Count).unwrap();
//! pipeline
//!     .append_step(StepKind::Is(Predicate::Gte(Value::Int(3))))
//!     .unwrap();
//!
//! let registry = StrategyRegistry::init();
//! let stats = strategy::apply(&mut pipeline, EngineTag::Standard, &registry.all()).unwrap();
//! assert!(stats.fired_count("RangeByIsCount") >= 1);
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod helper;
pub mod pipeline;
pub mod predicate;
pub mod requirement;
pub mod serialize;
pub mod step;
pub mod strategy;
pub mod trace;
pub mod value;
