//! Tree comparator (C6): produces a typed difference set between two trees.
//! Grounded on the reference implementation's `directory.py::compare(path,
//! old, new)` — the live, test-backed comparator (as opposed to
//! `tree.py::compare_trees`, which belongs to an abandoned code path and
//! references types no longer defined anywhere in the source).

use crate::error::Result;
use crate::hash::{hash_file, HashId};
use crate::object::{get_tree, Tree};
use crate::repo::Repository;
use crate::scan::WorkingTree;

/// What kind of change a [`Difference`] describes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DifferenceKind {
    Added,
    Updated,
    Removed,
}

/// A single Added/Updated/Removed entry between two trees, carrying the
/// full path from the comparison root and, where known, the content hash.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Difference {
    pub kind: DifferenceKind,
    pub file: DiffEntry,
}

/// The file-level payload of a [`Difference`]: its path relative to the
/// comparison root and its content hash if one is already known (a working
/// copy's file is hashed on demand the first time it is needed).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiffEntry {
    pub path: String,
    pub hashid: HashId,
}

/// One side of a comparison: either absent, a stored (hash-only) tree, or a
/// working-copy (path-only) tree. Letting each side vary independently is
/// what lets `status()` diff a stored commit tree against a freshly scanned
/// working tree without forcing either side into the other's shape.
pub enum TreeSide<'a> {
    Empty,
    Stored(HashId),
    Working(&'a WorkingTree),
}

/// Resolved, read form of one side at a single level of recursion: the
/// child directories and files visible at this node, any way they got here.
enum Level<'a> {
    Stored(Tree),
    Working(&'a WorkingTree),
    Empty,
}

impl<'a> Level<'a> {
    fn directories(&self) -> Vec<String> {
        match self {
            Level::Stored(t) => t.directories.keys().cloned().collect(),
            Level::Working(w) => w.directories.keys().cloned().collect(),
            Level::Empty => Vec::new(),
        }
    }

    fn files(&self) -> Vec<String> {
        match self {
            Level::Stored(t) => t.files.keys().cloned().collect(),
            Level::Working(w) => w.files.keys().cloned().collect(),
            Level::Empty => Vec::new(),
        }
    }

    fn child_side(&self, name: &str) -> TreeSide<'a> {
        match self {
            Level::Stored(t) => match t.directories.get(name) {
                Some(hashid) => TreeSide::Stored(*hashid),
                None => TreeSide::Empty,
            },
            Level::Working(w) => match w.directories.get(name) {
                Some(subtree) => TreeSide::Working(subtree),
                None => TreeSide::Empty,
            },
            Level::Empty => TreeSide::Empty,
        }
    }

    fn file_hashid(&self, repo: &Repository, name: &str) -> Result<Option<HashId>> {
        match self {
            Level::Stored(t) => Ok(t.files.get(name).copied()),
            Level::Working(w) => match w.files.get(name) {
                Some(path) => Ok(Some(hash_file(path)?)),
                None => Ok(None),
            },
            Level::Empty => Ok(None),
        }
    }
}

fn resolve<'a>(repo: &Repository, side: &TreeSide<'a>) -> Result<Level<'a>> {
    match side {
        TreeSide::Empty => Ok(Level::Empty),
        TreeSide::Stored(hashid) => Ok(Level::Stored(get_tree(repo, hashid)?)),
        TreeSide::Working(w) => Ok(Level::Working(w)),
    }
}

fn join(base_path: &str, name: &str) -> String {
    if base_path.is_empty() {
        name.to_string()
    } else {
        format!("{base_path}/{name}")
    }
}

/// Recurse over matching directory names (missing sides are the empty
/// tree); within a level, directories are recursed before files, and names
/// within each bucket are visited lexicographically.
/// Per-kind buckets accumulated during recursion, mirroring the original's
/// `Differences` dataclass (three separate lists merged level by level,
/// `datatypes.py`'s `Differences`, `directory.py::compare`'s
/// `merge_differences` calls) rather than one interleaved sequence — this is
/// what lets the final result group added before updated before removed
/// regardless of which subdirectory contributed which entry.
#[derive(Default)]
struct Buckets {
    added: Vec<Difference>,
    updated: Vec<Difference>,
    removed: Vec<Difference>,
}

impl Buckets {
    fn merge(&mut self, other: Buckets) {
        self.added.extend(other.added);
        self.updated.extend(other.updated);
        self.removed.extend(other.removed);
    }

    fn into_vec(self) -> Vec<Difference> {
        let mut out = self.added;
        out.extend(self.updated);
        out.extend(self.removed);
        out
    }
}

/// Recurse on matching directory names (missing sides are the empty tree),
/// then compare files at this level. Ordering within the final result is
/// added, then updated, then removed; within each bucket, recursion order
/// (directories before files, lexicographic within each).
pub fn compare(
    repo: &Repository,
    old: &TreeSide<'_>,
    new: &TreeSide<'_>,
    base_path: &str,
) -> Result<Vec<Difference>> {
    Ok(compare_buckets(repo, old, new, base_path)?.into_vec())
}

fn compare_buckets(
    repo: &Repository,
    old: &TreeSide<'_>,
    new: &TreeSide<'_>,
    base_path: &str,
) -> Result<Buckets> {
    let old_level = resolve(repo, old)?;
    let new_level = resolve(repo, new)?;
    let mut out = Buckets::default();

    let mut dir_names: Vec<String> = new_level.directories();
    for name in old_level.directories() {
        if !dir_names.contains(&name) {
            dir_names.push(name);
        }
    }
    dir_names.sort();

    for name in &dir_names {
        let path = join(base_path, name);
        let old_child = old_level.child_side(name);
        let new_child = new_level.child_side(name);
        out.merge(compare_buckets(repo, &old_child, &new_child, &path)?);
    }

    let mut file_names: Vec<String> = new_level.files();
    file_names.sort();
    for name in &file_names {
        let path = join(base_path, name);
        let new_hashid = new_level.file_hashid(repo, name)?.expect("name came from this level");
        match old_level.file_hashid(repo, name)? {
            None => out.added.push(Difference {
                kind: DifferenceKind::Added,
                file: DiffEntry { path, hashid: new_hashid },
            }),
            Some(old_hashid) if old_hashid != new_hashid => out.updated.push(Difference {
                kind: DifferenceKind::Updated,
                file: DiffEntry { path, hashid: new_hashid },
            }),
            Some(_) => {}
        }
    }

    let mut removed_names: Vec<String> = old_level.files();
    removed_names.retain(|name| !file_names.contains(name));
    removed_names.sort();
    for name in &removed_names {
        let path = join(base_path, name);
        let old_hashid = old_level.file_hashid(repo, name)?.expect("name came from this level");
        out.removed.push(Difference {
            kind: DifferenceKind::Removed,
            file: DiffEntry { path, hashid: old_hashid },
        });
    }

    Ok(out)
}
