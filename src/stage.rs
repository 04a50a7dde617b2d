//! Stage (C7): a persisted selection of pending Added/Updated/Removed file
//! entries. Grounded on the reference implementation's
//! `repository_old.py::stage_differences`, which only filters and partitions
//! an already-computed difference set — no blob writes happen here.

use serde::{Deserialize, Serialize};

use crate::diff::{Difference, DifferenceKind};
use crate::error::{IoResultExt, Result};
use crate::hash::HashId;
use crate::repo::Repository;

/// One entry of a [`Stage`] list. `blob_path`/`hashid` are populated once the
/// content has actually been written into the object store, which happens at
/// commit, not at stage time — an added/updated entry carries neither until
/// then. A removed entry carries whatever hash it already had in the stored
/// tree it was diffed against.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    pub path: String,
    pub is_blob: bool,
    pub blob_path: Option<String>,
    pub hashid: String,
}

impl FileEntry {
    fn unresolved(path: String) -> Self {
        Self { path, is_blob: true, blob_path: None, hashid: String::new() }
    }

    fn resolved(path: String, hashid: HashId) -> Self {
        Self { path, is_blob: true, blob_path: Some(hashid.to_relpath()), hashid: hashid.to_hex() }
    }
}

/// The pending selection: three lists of [`FileEntry`], persisted as a single
/// JSON record at `.snapfs/stage`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stage {
    #[serde(rename = "added_files")]
    pub added: Vec<FileEntry>,
    #[serde(rename = "updated_files")]
    pub updated: Vec<FileEntry>,
    #[serde(rename = "removed_files")]
    pub removed: Vec<FileEntry>,
}

/// `filters.py::include_filter(string, glob)`: a `^`-prefixed pattern keeps
/// paths that do *not* match the stripped glob; otherwise keeps paths that
/// do match it. This is the single-pattern case `filter_differences`/
/// `patterns_filter` reduces to at staging's one call site
/// (`repository_old.py::stage_differences`, which always calls
/// `filter_differences(differences, [pattern])`) — distinct from, and not to
/// be confused with, C4's multi-pattern toggling `ignore()` fold used by the
/// scanner.
fn matches_pattern(path: &str, pattern: &str) -> bool {
    if let Some(stripped) = pattern.strip_prefix('^') {
        !crate::ignore::matches(stripped, path)
    } else {
        crate::ignore::matches(pattern, path)
    }
}

impl Stage {
    /// Filter `differences` by `pattern`, keeping entries whose path matches
    /// the glob (`filters.py::include_filter`/`patterns_filter`/
    /// `filter_differences`), and partition the survivors by kind.
    pub fn from_differences(differences: &[Difference], pattern: &str) -> Self {
        let mut stage = Stage::default();

        for difference in differences {
            if !matches_pattern(&difference.file.path, pattern) {
                continue;
            }
            match difference.kind {
                DifferenceKind::Added => {
                    stage.added.push(FileEntry::unresolved(difference.file.path.clone()));
                }
                DifferenceKind::Updated => {
                    stage.updated.push(FileEntry::unresolved(difference.file.path.clone()));
                }
                DifferenceKind::Removed => {
                    stage
                        .removed
                        .push(FileEntry::resolved(difference.file.path.clone(), difference.file.hashid));
                }
            }
        }

        stage
    }

    pub fn load(repo: &Repository) -> Result<Self> {
        let path = repo.stage_path();
        let content = std::fs::read_to_string(&path).with_path(&path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Write atomically via temp-file-then-rename, same discipline as every
    /// other mutable file under `.snapfs/`.
    pub fn store(&self, repo: &Repository) -> Result<()> {
        let encoded = crate::canonical::to_canonical_json(self)?;
        crate::refs::write_atomic(repo, &repo.stage_path(), encoded.as_bytes())
    }
}
