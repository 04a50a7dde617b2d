//! Glob-based toggling inclusion/exclusion filter used by the working-tree
//! scanner (C5, see SPEC_FULL.md §4.7). Stage glob-filtering (C7) has its own
//! distinct predicate (`filters.py::include_filter`) and only shares this
//! module's raw pattern-match primitive, not the fold below.

use std::fs;
use std::path::Path;

use crate::error::{IoResultExt, Result};

/// Name of the per-directory pattern file.
pub const IGNORE_FILE: &str = ".ignore";

/// Evaluate the left-fold over `patterns` for `name` and report whether it
/// should be dropped.
///
/// - Start with `drop = false`.
/// - For each pattern in order: if it is `^`-prefixed and `name` matches the
///   pattern with the `^` stripped, force `drop = false` (unconditional
///   re-include, not a toggle). Otherwise, if the pattern matches `name`,
///   flip `drop = !drop`.
///
/// This is the normative fold (SPEC_FULL.md §4.4); the alternative
/// early-return fold found alongside it in the reference implementation
/// belongs to an abandoned code path and has no counterpart here.
pub fn ignore(name: &str, patterns: &[String]) -> bool {
    let mut drop = false;
    for pattern in patterns {
        if let Some(re_include) = pattern.strip_prefix('^') {
            if matches(re_include, name) {
                drop = false;
            }
        } else if matches(pattern, name) {
            drop = !drop;
        }
    }
    drop
}

/// `true` iff `name` should be kept under `patterns`.
pub fn keep(name: &str, patterns: &[String]) -> bool {
    !ignore(name, patterns)
}

pub(crate) fn matches(pattern: &str, name: &str) -> bool {
    glob::Pattern::new(pattern)
        .map(|p| p.matches(name))
        .unwrap_or(false)
}

/// Read `<dir>/.ignore`, dropping comment (`#`) and blank lines. Returns an
/// empty list if the file does not exist.
pub fn load_ignore_file(dir: &Path) -> Result<Vec<String>> {
    let path = dir.join(IGNORE_FILE);
    if !path.exists() {
        return Ok(Vec::new());
    }
    let content = fs::read_to_string(&path).with_path(&path)?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect())
}

/// Extend `inherited` with this directory's own `.ignore` patterns, additively.
pub fn patterns_for_subtree(inherited: &[String], dir: &Path) -> Result<Vec<String>> {
    let mut patterns = inherited.to_vec();
    patterns.extend(load_ignore_file(dir)?);
    Ok(patterns)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pats(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn exclude_all_include_some() {
        // S6: ["*", "^*.c4d", "^*.png"]
        let patterns = pats(&["*", "^*.c4d", "^*.png"]);
        assert!(ignore("filename.txt", &patterns));
        assert!(!ignore("filename.png", &patterns));
        assert!(!ignore("filename.c4d", &patterns));
    }

    #[test]
    fn include_all_exclude_some() {
        let patterns = pats(&["*.txt", "filename.png"]);
        assert!(ignore("notes.txt", &patterns));
        assert!(ignore("filename.png", &patterns));
        assert!(!ignore("other.rs", &patterns));
    }

    #[test]
    fn empty_patterns_keep_everything() {
        assert!(!ignore("anything", &[]));
    }

    #[test]
    fn reinclude_is_unconditional_not_toggle() {
        // a name matched by two exclude patterns should still be re-included
        // by one matching `^` pattern, not need a second re-include to undo
        // a "double toggle".
        let patterns = pats(&["*.c4d", "*.c4d", "^*.c4d"]);
        assert!(!ignore("model.c4d", &patterns));
    }

    #[test]
    fn ignore_file_skips_comments_and_blanks() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(".ignore"), "# comment\n\n*.log\n^keep.log\n").unwrap();

        let patterns = load_ignore_file(dir.path()).unwrap();
        assert_eq!(patterns, vec!["*.log".to_string(), "^keep.log".to_string()]);
    }

    #[test]
    fn missing_ignore_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_ignore_file(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn subtree_patterns_are_additive() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(".ignore"), "*.log\n").unwrap();

        let inherited = pats(&["*.tmp"]);
        let combined = patterns_for_subtree(&inherited, dir.path()).unwrap();
        assert_eq!(combined, vec!["*.tmp".to_string(), "*.log".to_string()]);
    }
}
