//! Reference set (C8): HEAD, branches, and tags over the commit graph.
//! Grounded on the teacher's `refs.rs` atomic write pattern and the
//! reference implementation's `new.py::Repository` / `repository_old.py`
//! (`checkout`, `get_commit_hashid_from_head`) transition rules.

use std::fs::{self, File};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, IoResultExt, Result};
use crate::hash::HashId;
use crate::object::{put_commit, Author, Commit};
use crate::repo::Repository;

const BRANCH_PREFIX: &str = "references/branches/";
const TAG_PREFIX: &str = "references/tags/";

#[derive(Clone, Debug, Serialize, Deserialize)]
struct Branch {
    commit_hashid: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct Tag {
    commit_hashid: String,
    #[serde(default)]
    message: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct Head {
    #[serde(rename = "ref")]
    ref_: String,
}

/// HEAD's meaning resolved at read time from its raw `ref` string.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HeadState {
    Empty,
    OnBranch(String),
    OnTag(String),
    Detached(HashId),
}

/// Write `data` to `path` via a temp file in the repository's `tmp/`
/// directory, then rename into place. Shared by every mutable file under
/// `.snapfs/` that is not content-addressed (HEAD, branches, tags, stage).
pub(crate) fn write_atomic(repo: &Repository, path: &Path, data: &[u8]) -> Result<()> {
    fs::create_dir_all(repo.tmp_path()).with_path(&repo.tmp_path())?;
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).with_path(dir)?;
    }

    let tmp_path = repo.tmp_path().join(uuid::Uuid::new_v4().to_string());
    {
        use std::io::Write;
        let mut tmp_file = File::create(&tmp_path).with_path(&tmp_path)?;
        tmp_file.write_all(data).with_path(&tmp_path)?;
        tmp_file.sync_all().with_path(&tmp_path)?;
    }
    fs::rename(&tmp_path, path).with_path(path)?;

    if let Some(dir) = path.parent() {
        let dir_file = File::open(dir).with_path(dir)?;
        dir_file.sync_all().with_path(dir)?;
    }
    Ok(())
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path).with_path(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Handle over one repository's reference state. Stateless beyond the
/// borrowed `Repository`; every method re-reads HEAD/branch/tag files from
/// disk, since nothing here is cached in memory.
pub struct ReferenceSet<'repo> {
    repo: &'repo Repository,
}

impl<'repo> ReferenceSet<'repo> {
    pub fn new(repo: &'repo Repository) -> Self {
        Self { repo }
    }

    /// Write an empty HEAD (`{"ref": ""}`). Called once, by `init`, before
    /// the first `checkout`.
    pub fn init_empty_head(repo: &Repository) -> Result<()> {
        let encoded = crate::canonical::to_canonical_json(&Head { ref_: String::new() })?;
        write_atomic(repo, &repo.head_path(), encoded.as_bytes())
    }

    fn read_head(&self) -> Result<Head> {
        read_json(&self.repo.head_path())
    }

    fn write_head(&self, ref_: String) -> Result<()> {
        let encoded = crate::canonical::to_canonical_json(&Head { ref_ })?;
        write_atomic(self.repo, &self.repo.head_path(), encoded.as_bytes())
    }

    pub fn head_state(&self) -> Result<HeadState> {
        let head = self.read_head()?;
        if head.ref_.is_empty() {
            Ok(HeadState::Empty)
        } else if let Some(name) = head.ref_.strip_prefix(BRANCH_PREFIX) {
            Ok(HeadState::OnBranch(name.to_string()))
        } else if let Some(name) = head.ref_.strip_prefix(TAG_PREFIX) {
            Ok(HeadState::OnTag(name.to_string()))
        } else {
            Ok(HeadState::Detached(HashId::from_hex(&head.ref_)?))
        }
    }

    /// `""` in Empty, the branch's target in OnBranch, the tag's target in
    /// OnTag, or HEAD itself in Detached. Surfaced as `Option` here rather
    /// than the reference implementation's empty-string sentinel, so
    /// callers don't have to special-case an empty hash string.
    pub fn latest_commit_hashid(&self) -> Result<Option<HashId>> {
        match self.head_state()? {
            HeadState::Empty => Ok(None),
            HeadState::OnBranch(name) => {
                let branch: Branch = read_json(&self.repo.branch_path(&name))?;
                if branch.commit_hashid.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(HashId::from_hex(&branch.commit_hashid)?))
                }
            }
            HeadState::OnTag(name) => {
                let tag: Tag = read_json(&self.repo.tag_path(&name))?;
                Ok(Some(HashId::from_hex(&tag.commit_hashid)?))
            }
            HeadState::Detached(hashid) => Ok(Some(hashid)),
        }
    }

    /// Fails with `NoReference` in the Empty state; every other state names
    /// a branch or tag (even if that branch's `commit_hashid` is itself
    /// still empty).
    fn require_reference(&self) -> Result<()> {
        match self.head_state()? {
            HeadState::Empty => Err(Error::NoReference),
            _ => Ok(()),
        }
    }

    /// 1. If a branch `name` exists, point HEAD at it.
    /// 2. Else if a tag `name` exists, detach HEAD to its commit.
    /// 3. Else create a new branch `name` at the current latest commit and
    ///    point HEAD at it.
    pub fn checkout(&self, name: &str) -> Result<HeadState> {
        let branch_path = self.repo.branch_path(name);
        if branch_path.is_file() {
            self.write_head(format!("{BRANCH_PREFIX}{name}"))?;
            return Ok(HeadState::OnBranch(name.to_string()));
        }

        let tag_path = self.repo.tag_path(name);
        if tag_path.is_file() {
            let tag: Tag = read_json(&tag_path)?;
            let hashid = HashId::from_hex(&tag.commit_hashid)?;
            self.write_head(hashid.to_hex())?;
            return Ok(HeadState::Detached(hashid));
        }

        let latest = self.latest_commit_hashid()?;
        let commit_hashid = latest.map(|h| h.to_hex()).unwrap_or_default();
        let encoded = crate::canonical::to_canonical_json(&Branch { commit_hashid })?;
        write_atomic(self.repo, &branch_path, encoded.as_bytes())?;
        self.write_head(format!("{BRANCH_PREFIX}{name}"))?;
        Ok(HeadState::OnBranch(name.to_string()))
    }

    /// Resolve the previous commit, write the new commit object, then
    /// advance whichever reference HEAD currently names.
    pub fn commit(&self, author: Author, message: String, tree_hashid: HashId) -> Result<HashId> {
        let previous = self.latest_commit_hashid()?;
        let commit = Commit {
            author,
            message,
            tree_hashid,
            previous_commits_hashids: previous.into_iter().collect(),
        };
        let commit_hashid = put_commit(self.repo, &commit)?;

        match self.head_state()? {
            HeadState::OnBranch(name) => {
                let encoded = crate::canonical::to_canonical_json(&Branch {
                    commit_hashid: commit_hashid.to_hex(),
                })?;
                write_atomic(self.repo, &self.repo.branch_path(&name), encoded.as_bytes())?;
            }
            HeadState::OnTag(_) | HeadState::Detached(_) | HeadState::Empty => {
                self.write_head(commit_hashid.to_hex())?;
            }
        }

        Ok(commit_hashid)
    }

    #[allow(dead_code)]
    pub fn get_reference(&self) -> Result<()> {
        self.require_reference()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_repo_is_empty_with_no_latest_commit() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path().join("repo")).unwrap();
        let refs = ReferenceSet::new(&repo);
        assert_eq!(refs.head_state().unwrap(), HeadState::OnBranch("main".into()));
        assert_eq!(refs.latest_commit_hashid().unwrap(), None);
    }

    #[test]
    fn commit_advances_branch_and_leaves_head_unchanged() {
        // P5
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path().join("repo")).unwrap();
        let refs = ReferenceSet::new(&repo);

        let tree_hashid = crate::object::Tree::empty().hashid().unwrap();
        let hashid = refs.commit(Author::new("a"), "m".into(), tree_hashid).unwrap();

        assert_eq!(refs.head_state().unwrap(), HeadState::OnBranch("main".into()));
        assert_eq!(refs.latest_commit_hashid().unwrap(), Some(hashid));
    }

    #[test]
    fn second_commit_chains_to_first() {
        // S5
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path().join("repo")).unwrap();
        let refs = ReferenceSet::new(&repo);
        let tree_hashid = crate::object::Tree::empty().hashid().unwrap();

        let first = refs.commit(Author::new("a"), "one".into(), tree_hashid).unwrap();
        let second = refs.commit(Author::new("a"), "two".into(), tree_hashid).unwrap();

        let second_commit = crate::object::get_commit(&repo, &second).unwrap();
        assert_eq!(second_commit.previous_commits_hashids, vec![first]);
    }

    #[test]
    fn checkout_new_name_creates_branch_at_current_commit() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path().join("repo")).unwrap();
        let refs = ReferenceSet::new(&repo);
        let tree_hashid = crate::object::Tree::empty().hashid().unwrap();
        let hashid = refs.commit(Author::new("a"), "m".into(), tree_hashid).unwrap();

        let state = refs.checkout("feature").unwrap();
        assert_eq!(state, HeadState::OnBranch("feature".into()));
        assert_eq!(refs.latest_commit_hashid().unwrap(), Some(hashid));
    }

    #[test]
    fn checkout_tag_detaches_head() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path().join("repo")).unwrap();
        let refs = ReferenceSet::new(&repo);
        let tree_hashid = crate::object::Tree::empty().hashid().unwrap();
        let hashid = refs.commit(Author::new("a"), "m".into(), tree_hashid).unwrap();

        let tag = Tag { commit_hashid: hashid.to_hex(), message: "release".into() };
        let encoded = crate::canonical::to_canonical_json(&tag).unwrap();
        write_atomic(&repo, &repo.tag_path("v1"), encoded.as_bytes()).unwrap();

        let state = refs.checkout("v1").unwrap();
        assert_eq!(state, HeadState::Detached(hashid));
    }

    #[test]
    fn empty_head_rejects_require_reference() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::at(dir.path().join("repo"));
        std::fs::create_dir_all(repo.blobs_path()).unwrap();
        std::fs::create_dir_all(repo.branches_path()).unwrap();
        std::fs::create_dir_all(repo.tags_path()).unwrap();
        std::fs::create_dir_all(repo.tmp_path()).unwrap();
        crate::stage::Stage::default().store(&repo).unwrap();
        ReferenceSet::init_empty_head(&repo).unwrap();

        let refs = ReferenceSet::new(&repo);
        assert!(matches!(refs.get_reference(), Err(Error::NoReference)));
    }
}
