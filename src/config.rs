//! # Configuration (C9)
//!
//! Layered configuration for embedding applications: a default strategy
//! set, a default engine tag, and logging preferences. `apply()` itself
//! never reads this — it always takes an explicit strategy set and engine
//! tag (§6) — this is strictly a convenience for callers that want a
//! sensible default assembled once at startup.

use figment::providers::{Env, Format, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::engine::EngineTag;
use crate::error::{OptimizerError, OptimizerResult};

/// Logging verbosity and rendering, consumed by a caller wiring up
/// `tracing-subscriber` at process startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
    Compact,
}

/// Top-level configuration, merged from `travopt.toml`, an optional
/// `travopt.local.toml` override, then `TRAVOPT_`-prefixed environment
/// variables, in that priority order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub default_strategies: Vec<String>,
    pub default_engine: EngineTag,
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            default_strategies: vec![
                "IdentityRemoval".to_string(),
                "RangeByIsCount".to_string(),
                "RangeMerge".to_string(),
                "FilterReordering".to_string(),
                "VerticesByIdFolding".to_string(),
                "ProfileInjection".to_string(),
            ],
            default_engine: EngineTag::Standard,
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Merge `travopt.toml`, `travopt.local.toml`, and `TRAVOPT_`-prefixed
    /// environment variables over the built-in defaults.
    pub fn load() -> OptimizerResult<Self> {
        Figment::from(figment::providers::Serialized::defaults(Config::default()))
            .merge(Toml::file("travopt.toml"))
            .merge(Toml::file("travopt.local.toml"))
            .merge(Env::prefixed("TRAVOPT_").split("__"))
            .extract()
            .map_err(|e| OptimizerError::Configuration(e.to_string()))
    }
}
