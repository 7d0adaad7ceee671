//! # Traverser requirement set
//!
//! The closed, 8-element set of capabilities the executor must maintain for
//! elements flowing through a step (§3). Represented as a `u16` bitset
//! rather than a `HashSet` since the set is closed, tiny, and `Step` is
//! cloned often during rewrites.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

macro_rules! requirement_bits {
    ($($name:ident => $bit:expr,)+) => {
        /// A single capability the executor must provide for a step.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Requirement {
            $($name,)+
        }

        impl Requirement {
            const ALL: &'static [Requirement] = &[$(Requirement::$name,)+];

            fn bit(self) -> u16 {
                match self {
                    $(Requirement::$name => 1 << $bit,)+
                }
            }
        }
    };
}

requirement_bits! {
    Object => 0,
    Bulk => 1,
    SideEffects => 2,
    Path => 3,
    Sack => 4,
    LabeledPath => 5,
    SingleLoop => 6,
    NestedLoop => 7,
}

/// A set of [`Requirement`]s, stored as a bitmask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct RequirementSet(u16);

impl RequirementSet {
    pub const EMPTY: RequirementSet = RequirementSet(0);

    pub fn of(reqs: impl IntoIterator<Item = Requirement>) -> Self {
        let mut set = RequirementSet::EMPTY;
        for r in reqs {
            set.insert(r);
        }
        set
    }

    pub fn insert(&mut self, r: Requirement) {
        self.0 |= r.bit();
    }

    pub fn contains(&self, r: Requirement) -> bool {
        self.0 & r.bit() != 0
    }

    pub fn union(&self, other: &RequirementSet) -> RequirementSet {
        RequirementSet(self.0 | other.0)
    }

    /// True iff every requirement in `self` is also present in `other` —
    /// used to check invariant (iv): a child pipeline's requirements must
    /// be a subset of its parent's.
    pub fn is_subset_of(&self, other: &RequirementSet) -> bool {
        self.0 & other.0 == self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = Requirement> + '_ {
        Requirement::ALL.iter().copied().filter(move |r| self.contains(*r))
    }
}

impl BitOr for RequirementSet {
    type Output = RequirementSet;
    fn bitor(self, rhs: Self) -> Self::Output {
        self.union(&rhs)
    }
}

impl BitOrAssign for RequirementSet {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl FromIterator<Requirement> for RequirementSet {
    fn from_iter<T: IntoIterator<Item = Requirement>>(iter: T) -> Self {
        RequirementSet::of(iter)
    }
}

impl fmt::Display for RequirementSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        let mut first = true;
        for r in self.iter() {
            if !first {
                write!(f, ", ")?;
            }
            write!(f, "{r:?}")?;
            first = false;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subset_check() {
        let parent = RequirementSet::of([Requirement::Object, Requirement::Path]);
        let child = RequirementSet::of([Requirement::Object]);
        assert!(child.is_subset_of(&parent));
        assert!(!parent.is_subset_of(&child));
    }

    #[test]
    fn union_is_commutative() {
        let a = RequirementSet::of([Requirement::Bulk]);
        let b = RequirementSet::of([Requirement::Sack]);
        assert_eq!(a.union(&b), b.union(&a));
    }
}
