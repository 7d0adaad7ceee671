//! # Built-in rule catalog (§5)
//!
//! The closed set of strategies [`crate::strategy::StrategyRegistry::init`]
//! assembles. Ordering edges are declared on each strategy individually
//! (§4.2); this module only lists them.

mod filter_reordering;
mod identity_removal;
mod profile_injection;
mod range_by_is_count;
mod range_merge;
mod vertices_by_id_folding;

pub use filter_reordering::FilterReordering;
pub use identity_removal::IdentityRemoval;
pub use profile_injection::ProfileInjection;
pub use range_by_is_count::RangeByIsCount;
pub use range_merge::RangeMerge;
pub use vertices_by_id_folding::VerticesByIdFolding;

use std::sync::Arc;

use crate::strategy::Strategy;

/// The six built-in strategies, in no particular order — `apply()` derives
/// the actual application order from their declared `before`/`after` edges.
pub fn built_in_strategies() -> Vec<Arc<dyn Strategy>> {
    vec![
        Arc::new(IdentityRemoval),
        Arc::new(RangeByIsCount),
        Arc::new(RangeMerge),
        Arc::new(FilterReordering),
        Arc::new(VerticesByIdFolding),
        Arc::new(ProfileInjection),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::StrategyRegistry;

    #[test]
    fn registry_resolves_all_built_ins() {
        let registry = StrategyRegistry::init();
        let ids = [
            "IdentityRemoval",
            "RangeByIsCount",
            "RangeMerge",
            "FilterReordering",
            "VerticesByIdFolding",
            "ProfileInjection",
        ];
        for id in ids {
            assert!(registry.get(id).is_some(), "missing strategy {id}");
        }
        assert_eq!(registry.all().len(), 6);
    }
}
