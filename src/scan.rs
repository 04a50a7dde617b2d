//! Working-tree scanner (C5): builds an in-memory tree from a directory,
//! honoring the `.ignore` filter (C4). Grounded on the reference
//! implementation's `new.py::get_tree` / `tree.py::get_tree` and the
//! teacher's `ops/commit.rs::commit_tree` sorted-recursion shape.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{IoResultExt, Result};
use crate::ignore::{keep, patterns_for_subtree};

/// An in-memory snapshot of a directory as it exists on disk right now:
/// files carry their working-copy path (not yet hashed), directories own
/// their children recursively. Distinct from [`crate::object::Tree`], which
/// is the on-disk, hash-only form written into the object store.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WorkingTree {
    pub directories: BTreeMap<String, WorkingTree>,
    pub files: BTreeMap<String, PathBuf>,
}

impl WorkingTree {
    pub fn is_empty(&self) -> bool {
        self.directories.is_empty() && self.files.is_empty()
    }
}

/// Name of the repository's own state directory, always excluded from the
/// tree it manages (the reference implementation seeds exactly this pattern,
/// `get_tree(path, [".snapfs"])`, when scanning a directory that is itself a
/// repository root).
const REPOSITORY_STATE_DIR: &str = ".snapfs";

/// Scan `root`, honoring `.ignore` files inherited additively down the tree.
/// Only regular files and directories are visited; any other directory-entry
/// kind (symlink, device node, fifo, socket) is skipped. `root`'s own
/// `.snapfs` directory, if present, is always excluded.
pub fn scan_working_tree(root: &Path) -> Result<WorkingTree> {
    scan_dir(root, &[REPOSITORY_STATE_DIR.to_string()])
}

fn scan_dir(dir: &Path, inherited_patterns: &[String]) -> Result<WorkingTree> {
    let patterns = patterns_for_subtree(inherited_patterns, dir)?;

    let mut entries: Vec<_> = fs::read_dir(dir)
        .with_path(dir)?
        .collect::<std::io::Result<Vec<_>>>()
        .with_path(dir)?;
    entries.sort_by_key(|e| e.file_name());

    let mut tree = WorkingTree::default();

    for entry in entries {
        let path = entry.path();
        let name = entry.file_name().to_string_lossy().to_string();
        let file_type = entry.file_type().with_path(&path)?;

        if file_type.is_file() {
            if keep(&name, &patterns) {
                tree.files.insert(name, path);
            }
        } else if file_type.is_dir() {
            let subtree = scan_dir(&path, &patterns)?;
            if !subtree.is_empty() {
                tree.directories.insert(name, subtree);
            }
        }
        // symlinks, device nodes, fifos, sockets: skipped, byte-content-only scope
    }

    Ok(tree)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scans_nested_directories_sorted() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("b/c")).unwrap();
        fs::write(dir.path().join("a.txt"), "a").unwrap();
        fs::write(dir.path().join("b/c/d.txt"), "d").unwrap();

        let tree = scan_working_tree(dir.path()).unwrap();
        assert!(tree.files.contains_key("a.txt"));
        assert!(tree.directories.contains_key("b"));
        assert!(tree.directories["b"].directories["c"]
            .files
            .contains_key("d.txt"));
    }

    #[test]
    fn omits_empty_subdirectories_after_filtering() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("empty")).unwrap();
        fs::create_dir_all(dir.path().join("filtered")).unwrap();
        fs::write(dir.path().join("filtered/x.c4d"), "x").unwrap();
        fs::write(dir.path().join(".ignore"), "*.c4d\n").unwrap();

        let tree = scan_working_tree(dir.path()).unwrap();
        assert!(!tree.directories.contains_key("empty"));
        assert!(!tree.directories.contains_key("filtered"));
    }

    #[test]
    fn ignore_file_scopes_to_subtree() {
        // S4: .ignore = "*\n^*.c4d" at root, test/foo.c4d kept
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("test")).unwrap();
        fs::write(dir.path().join("test/foo.c4d"), "x").unwrap();
        fs::write(dir.path().join(".ignore"), "*\n^*.c4d\n").unwrap();

        let tree = scan_working_tree(dir.path()).unwrap();
        assert_eq!(tree.files.len(), 0);
        assert!(tree.directories["test"].files.contains_key("foo.c4d"));
    }

    #[test]
    fn repository_state_directory_is_always_excluded() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join(".snapfs/blobs")).unwrap();
        fs::write(dir.path().join(".snapfs/blobs/junk"), "x").unwrap();
        fs::write(dir.path().join("a.txt"), "a").unwrap();

        let tree = scan_working_tree(dir.path()).unwrap();
        assert!(tree.files.contains_key("a.txt"));
        assert!(!tree.directories.contains_key(".snapfs"));
    }

    #[test]
    fn ignore_does_not_leak_to_sibling_subtrees() {
        // P9: a .ignore in one subtree does not affect another
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("a")).unwrap();
        fs::create_dir_all(dir.path().join("b")).unwrap();
        fs::write(dir.path().join("a/.ignore"), "*.log\n").unwrap();
        fs::write(dir.path().join("a/keep.txt"), "x").unwrap();
        fs::write(dir.path().join("a/drop.log"), "x").unwrap();
        fs::write(dir.path().join("b/drop.log"), "x").unwrap();

        let tree = scan_working_tree(dir.path()).unwrap();
        assert!(tree.directories["a"].files.contains_key("keep.txt"));
        assert!(!tree.directories["a"].files.contains_key("drop.log"));
        assert!(tree.directories["b"].files.contains_key("drop.log"));
    }
}
