//! # Engine tag (C7)
//!
//! Read-only parameter selecting the execution backend class. A pipeline
//! carries exactly one tag at the time strategies are applied (§3); no
//! rewrite may observe anything about the engine beyond this tag.

use serde::{Deserialize, Serialize};

/// The execution backend class a pipeline is being optimized for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EngineTag {
    /// Single-machine, in-process iteration.
    Standard,
    /// Bulk/partitioned/distributed evaluation over vertex programs.
    Computer,
}

/// Restriction a strategy may declare on which engine(s) it is legal for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineRestriction {
    /// Legal under both tags.
    Any,
    /// Legal only under the given tag.
    Only(EngineTag),
}

impl EngineRestriction {
    pub fn allows(&self, tag: EngineTag) -> bool {
        match self {
            EngineRestriction::Any => true,
            EngineRestriction::Only(t) => *t == tag,
        }
    }
}
