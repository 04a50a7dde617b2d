use serde::{Deserialize, Serialize};

use crate::canonical::canonical_hash;
use crate::error::Result;
use crate::hash::HashId;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub name: String,
    #[serde(default)]
    pub fullname: String,
    #[serde(default)]
    pub email: String,
}

impl Author {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fullname: String::new(),
            email: String::new(),
        }
    }
}

/// A tree plus metadata: author, message, and parent hashes. Always written
/// with zero or one `previous_commits_hashids` entry — the list shape is
/// capacity reserved for a future merge component, not exercised here
/// (see SPEC_FULL.md §9).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    pub author: Author,
    pub message: String,
    pub tree_hashid: HashId,
    #[serde(default)]
    pub previous_commits_hashids: Vec<HashId>,
}

impl Commit {
    pub fn hashid(&self) -> Result<HashId> {
        canonical_hash(self)
    }
}
