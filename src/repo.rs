//! Repository orchestrator (C9): path helpers over a closed, deterministic
//! namespace under `<root>/.snapfs/`, plus the init/status/stage/commit/
//! checkout workflows that tie every other component together. Grounded on
//! the teacher's `Repo` (path-helper methods, `RepoLock`) and the reference
//! implementation's `repository.py` (`get_*_path(root, test)` signatures).

use std::fs::File;
use std::path::{Path, PathBuf};

use nix::fcntl::{Flock, FlockArg};

use crate::diff::{compare, Difference, TreeSide};
use crate::error::{Error, IoResultExt, Result};
use crate::object::{get_commit, put_tree, Author};
use crate::refs::{HeadState, ReferenceSet};
use crate::scan::scan_working_tree;
use crate::stage::Stage;

/// A repository handle: a root path and nothing else. All operations take
/// it explicitly; there is no global state (SPEC_FULL.md §9).
pub struct Repository {
    root: PathBuf,
}

impl Repository {
    /// Open a handle without checking whether it is initialized. Use
    /// [`Repository::init`] to create a fresh repository, or call
    /// [`Repository::is_initialized`] before relying on one opened this way.
    pub fn at(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn snapfs_path(&self) -> PathBuf {
        self.root.join(".snapfs")
    }

    pub fn blobs_path(&self) -> PathBuf {
        self.snapfs_path().join("blobs")
    }

    pub fn references_path(&self) -> PathBuf {
        self.snapfs_path().join("references")
    }

    pub fn branches_path(&self) -> PathBuf {
        self.references_path().join("branches")
    }

    pub fn tags_path(&self) -> PathBuf {
        self.references_path().join("tags")
    }

    pub fn branch_path(&self, name: &str) -> PathBuf {
        self.branches_path().join(name)
    }

    pub fn tag_path(&self, name: &str) -> PathBuf {
        self.tags_path().join(name)
    }

    pub fn head_path(&self) -> PathBuf {
        self.snapfs_path().join("HEAD")
    }

    pub fn stage_path(&self) -> PathBuf {
        self.snapfs_path().join("stage")
    }

    pub fn tmp_path(&self) -> PathBuf {
        self.snapfs_path().join("tmp")
    }

    pub fn lock_path(&self) -> PathBuf {
        self.snapfs_path().join(".lock")
    }

    /// `true` iff all five named paths exist with the expected kind.
    pub fn is_initialized(&self) -> bool {
        self.blobs_path().is_dir()
            && self.branches_path().is_dir()
            && self.tags_path().is_dir()
            && self.head_path().is_file()
            && self.stage_path().is_file()
    }

    /// Create the directory layout, an empty Stage, an empty HEAD, then
    /// check out `main`.
    pub fn init(root: impl Into<PathBuf>) -> Result<Self> {
        let repo = Self::at(root);
        if repo.is_initialized() {
            return Err(Error::AlreadyInitialized(repo.root.clone()));
        }

        std::fs::create_dir_all(repo.blobs_path()).with_path(&repo.blobs_path())?;
        std::fs::create_dir_all(repo.branches_path()).with_path(&repo.branches_path())?;
        std::fs::create_dir_all(repo.tags_path()).with_path(&repo.tags_path())?;
        std::fs::create_dir_all(repo.tmp_path()).with_path(&repo.tmp_path())?;

        Stage::default().store(&repo)?;
        ReferenceSet::init_empty_head(&repo)?;

        let refs = ReferenceSet::new(&repo);
        refs.checkout("main")?;

        Ok(repo)
    }

    /// Open an existing, initialized repository.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let repo = Self::at(root);
        if !repo.is_initialized() {
            return Err(Error::NotInitialized(repo.root.clone()));
        }
        Ok(repo)
    }

    fn refs(&self) -> ReferenceSet<'_> {
        ReferenceSet::new(self)
    }

    /// The latest commit's tree side, or `TreeSide::Empty` if HEAD is Empty.
    /// The empty tree is never actually written to the store on a fresh
    /// repository, so it is represented structurally here rather than as a
    /// `Stored` hash the comparator would have to look up.
    fn latest_tree_side(&self) -> Result<TreeSide<'static>> {
        match self.refs().latest_commit_hashid()? {
            Some(hashid) => Ok(TreeSide::Stored(get_commit(self, &hashid)?.tree_hashid)),
            None => Ok(TreeSide::Empty),
        }
    }

    /// `compare(path, scan_working_tree(path), tree_of(latest_commit))`.
    pub fn status(&self) -> Result<Vec<Difference>> {
        let working = scan_working_tree(&self.root)?;
        let old = self.latest_tree_side()?;
        compare(self, &old, &TreeSide::Working(&working), "")
    }

    /// Partition `status()` by `pattern` and persist the selection. No
    /// object-store writes happen here (§4.7): staged added/updated entries
    /// carry no blob hash yet.
    pub fn stage(&self, pattern: &str) -> Result<Stage> {
        let differences = self.status()?;
        let staged = Stage::from_differences(&differences, pattern);
        staged.store(self)?;
        Ok(staged)
    }

    pub fn load_stage(&self) -> Result<Stage> {
        Stage::load(self)
    }

    /// Re-derive the working tree, commit it, and clear the Stage.
    pub fn commit(&self, author: Author, message: impl Into<String>) -> Result<crate::hash::HashId> {
        let working = scan_working_tree(&self.root)?;
        let tree_hashid = put_tree(self, &working)?;
        let commit_hashid = self.refs().commit(author, message.into(), tree_hashid)?;
        Stage::default().store(self)?;
        Ok(commit_hashid)
    }

    /// Move HEAD to `name`, following the branch → tag → new-branch
    /// resolution order.
    pub fn checkout(&self, name: &str) -> Result<HeadState> {
        self.refs().checkout(name)
    }

    pub fn head_state(&self) -> Result<HeadState> {
        self.refs().head_state()
    }

    /// Acquire an advisory exclusive lock scoped to the repository. Not
    /// required by any core write path — "no concurrent writers" is a
    /// caller responsibility (§5), this is the opt-in helper for it.
    pub fn lock(&self) -> Result<RepoLock> {
        let lock_path = self.lock_path();
        let file = File::create(&lock_path).with_path(&lock_path)?;
        let flock =
            Flock::lock(file, FlockArg::LockExclusiveNonblock).map_err(|_| Error::LockContention)?;
        Ok(RepoLock { flock })
    }

    pub fn try_lock(&self) -> Result<Option<RepoLock>> {
        let lock_path = self.lock_path();
        let file = File::create(&lock_path).with_path(&lock_path)?;
        match Flock::lock(file, FlockArg::LockExclusiveNonblock) {
            Ok(flock) => Ok(Some(RepoLock { flock })),
            Err((_, nix::errno::Errno::EWOULDBLOCK)) => Ok(None),
            Err(_) => Err(Error::LockContention),
        }
    }
}

/// Guard that releases the repository's advisory lock when dropped.
pub struct RepoLock {
    #[allow(dead_code)]
    flock: Flock<File>,
}
