//! snapfs - content-addressed snapshot store for directory trees
//!
//! A minimal object database modeled after a DVCS: initialize a repository
//! inside a directory, detect changes against the last snapshot, stage a
//! subset of them, and commit into an immutable, deduplicated object store.
//! Repeated commits form a branch or tag lineage reachable from a movable
//! HEAD.
//!
//! # Core concepts
//!
//! - **Blob**: content-addressed file bytes.
//! - **Tree**: a mapping of names to child tree/blob hashes, canonically
//!   serialized and hashed.
//! - **Commit**: a tree plus author, message, and parent hashes.
//! - **Reference**: a named pointer (branch or tag) to a commit, or HEAD
//!   pointing at one of those, a raw commit hash, or nothing at all.
//!
//! # Example usage
//!
//! ```no_run
//! use snapfs::{Author, Repository};
//!
//! let repo = Repository::init("/path/to/repo").unwrap();
//! let differences = repo.status().unwrap();
//! repo.stage("*").unwrap();
//! repo.commit(Author::new("me"), "initial snapshot").unwrap();
//! ```

mod canonical;
mod diff;
mod error;
mod hash;
mod ignore;
pub mod object;
mod refs;
mod repo;
mod scan;
mod stage;

pub use diff::{DiffEntry, Difference, DifferenceKind};
pub use error::{Error, Result};
pub use hash::HashId;
pub use object::{Author, Commit, Tree};
pub use refs::HeadState;
pub use repo::{RepoLock, Repository};
pub use stage::{FileEntry, Stage};
