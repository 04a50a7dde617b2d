use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::canonical::canonical_hash;
use crate::error::Result;
use crate::hash::HashId;

/// On-disk shape of a directory snapshot: a mapping of child directory
/// names to tree hashes and file names to blob hashes. Hash = digest of the
/// canonical serialization of this mapping (§4.3).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tree {
    pub directories: BTreeMap<String, HashId>,
    pub files: BTreeMap<String, HashId>,
}

impl Tree {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.directories.is_empty() && self.files.is_empty()
    }

    /// Hash of this tree's canonical serialization. Every component that
    /// needs "the empty tree hash" calls this on `Tree::empty()` rather than
    /// hardcoding a constant, so there is exactly one empty-tree encoding
    /// (I5).
    pub fn hashid(&self) -> Result<HashId> {
        canonical_hash(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_tree_has_fixed_hash() {
        let a = Tree::empty();
        let b = Tree::empty();
        assert_eq!(a.hashid().unwrap(), b.hashid().unwrap());
    }

    #[test]
    fn equal_trees_hash_equal() {
        let mut a = Tree::empty();
        a.files.insert("x".into(), HashId::ZERO);

        let mut b = Tree::empty();
        b.files.insert("x".into(), HashId::ZERO);

        assert_eq!(a.hashid().unwrap(), b.hashid().unwrap());
    }

    #[test]
    fn different_content_hashes_differently() {
        let mut a = Tree::empty();
        a.files.insert("x".into(), HashId::ZERO);
        assert_ne!(a.hashid().unwrap(), Tree::empty().hashid().unwrap());
    }
}
