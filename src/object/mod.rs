//! Object store (C3): write/read blobs, trees, and commits by hash under
//! `blobs/`. Grounded on the teacher's `object/blob.rs` atomic-write pattern
//! (temp file in a repo-local tmp dir, write, fsync, rename, fsync parent,
//! dedup via path-exists check, read-only permissions on success).

pub mod commit;
pub mod tree;

pub use commit::{Author, Commit};
pub use tree::Tree;

use std::fs::{self, File, Permissions};
use std::io::{Read, Write};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use crate::canonical::to_canonical_json;
use crate::error::{Error, IoResultExt, Result};
use crate::hash::{hash_bytes, hash_file, HashId};
use crate::repo::Repository;
use crate::scan::WorkingTree;

fn object_path(repo: &Repository, hashid: &HashId) -> PathBuf {
    let (dir, rest) = hashid.to_path_components();
    repo.blobs_path().join(dir).join(rest)
}

/// Write raw bytes as a blob and return its hash. Idempotent: re-putting
/// identical content is a no-op beyond the existence check.
pub fn put_bytes_as_blob(repo: &Repository, data: &[u8]) -> Result<HashId> {
    let hashid = hash_bytes(data);
    write_object_atomic(repo, &hashid, data)?;
    Ok(hashid)
}

/// Same as [`put_bytes_as_blob`] but require non-empty input. Opt-in per
/// §9: `EmptyBlob` is not a mandatory guard on every write.
pub fn put_bytes_as_blob_checked(repo: &Repository, data: &[u8]) -> Result<HashId> {
    if data.is_empty() {
        return Err(Error::EmptyBlob);
    }
    put_bytes_as_blob(repo, data)
}

/// Stream `src`'s content into the store without buffering it fully.
pub fn put_file_as_blob(repo: &Repository, src: &Path) -> Result<HashId> {
    let hashid = hash_file(src)?;
    let path = object_path(repo, &hashid);
    if path.exists() {
        return Ok(hashid);
    }

    let dir = path.parent().expect("object path always has a parent");
    fs::create_dir_all(dir).with_path(dir)?;

    let tmp_path = repo.tmp_path().join(uuid::Uuid::new_v4().to_string());
    {
        let mut src_file = File::open(src).with_path(src)?;
        let mut tmp_file = File::create(&tmp_path).with_path(&tmp_path)?;
        std::io::copy(&mut src_file, &mut tmp_file).with_path(&tmp_path)?;
        tmp_file.sync_all().with_path(&tmp_path)?;
    }
    finalize_object(&tmp_path, &path)?;

    Ok(hashid)
}

fn write_object_atomic(repo: &Repository, hashid: &HashId, data: &[u8]) -> Result<()> {
    let path = object_path(repo, hashid);
    if path.exists() {
        return Ok(());
    }

    let dir = path.parent().expect("object path always has a parent");
    fs::create_dir_all(dir).with_path(dir)?;
    fs::create_dir_all(repo.tmp_path()).with_path(&repo.tmp_path())?;

    let tmp_path = repo.tmp_path().join(uuid::Uuid::new_v4().to_string());
    {
        let mut tmp_file = File::create(&tmp_path).with_path(&tmp_path)?;
        tmp_file.write_all(data).with_path(&tmp_path)?;
        tmp_file.sync_all().with_path(&tmp_path)?;
    }
    finalize_object(&tmp_path, &path)
}

/// Make the temp file read-only, rename it into place, and fsync the parent
/// directory so the rename is durable. Readers never observe partial writes.
fn finalize_object(tmp_path: &Path, final_path: &Path) -> Result<()> {
    fs::set_permissions(tmp_path, Permissions::from_mode(0o444)).with_path(tmp_path)?;
    fs::rename(tmp_path, final_path).with_path(final_path)?;

    let dir = final_path.parent().expect("object path always has a parent");
    let dir_file = File::open(dir).with_path(dir)?;
    dir_file.sync_all().with_path(dir)?;
    Ok(())
}

/// Read raw blob bytes, re-hashing them and checking the result against the
/// path-implied hash before handing them back (§4.3: a cheap integrity
/// check an on-disk reader must do explicitly).
pub fn get_blob_bytes(repo: &Repository, hashid: &HashId) -> Result<Vec<u8>> {
    let path = object_path(repo, hashid);
    let data = fs::read(&path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::ObjectNotFound(*hashid)
        } else {
            Error::Io { path: path.clone(), source: e }
        }
    })?;

    if hash_bytes(&data) != *hashid {
        return Err(Error::FormatError(format!(
            "object {hashid} failed its hash check on read"
        )));
    }

    Ok(data)
}

/// Recursively `put` each child tree and file, assemble the
/// `{directories, files}` mapping of child hashes, serialize canonically,
/// and `put_bytes_as_blob` it.
pub fn put_tree(repo: &Repository, working: &WorkingTree) -> Result<HashId> {
    let mut tree = Tree::empty();

    for (name, subtree) in &working.directories {
        tree.directories.insert(name.clone(), put_tree(repo, subtree)?);
    }
    for (name, path) in &working.files {
        tree.files.insert(name.clone(), put_file_as_blob(repo, path)?);
    }

    let encoded = to_canonical_json(&tree)?;
    put_bytes_as_blob(repo, encoded.as_bytes())
}

pub fn get_tree(repo: &Repository, hashid: &HashId) -> Result<Tree> {
    let data = get_blob_bytes(repo, hashid)?;
    let text = String::from_utf8(data).map_err(|e| Error::FormatError(e.to_string()))?;
    Ok(serde_json::from_str(&text)?)
}

pub fn put_commit(repo: &Repository, commit: &Commit) -> Result<HashId> {
    let encoded = to_canonical_json(commit)?;
    put_bytes_as_blob(repo, encoded.as_bytes())
}

pub fn get_commit(repo: &Repository, hashid: &HashId) -> Result<Commit> {
    let data = get_blob_bytes(repo, hashid)?;
    let text = String::from_utf8(data).map_err(|e| Error::FormatError(e.to_string()))?;
    Ok(serde_json::from_str(&text)?)
}

/// Read another object's bytes into a writer without buffering it fully.
pub fn get_blob_to<W: Write>(repo: &Repository, hashid: &HashId, writer: &mut W) -> Result<u64> {
    let path = object_path(repo, hashid);
    let mut file = File::open(&path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::ObjectNotFound(*hashid)
        } else {
            Error::Io { path: path.clone(), source: e }
        }
    })?;

    let mut buf = [0u8; 64 * 1024];
    let mut total = 0u64;
    loop {
        let n = file.read(&mut buf).with_path(&path)?;
        if n == 0 {
            break;
        }
        writer.write_all(&buf[..n]).with_path(&path)?;
        total += n as u64;
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_repo() -> (tempfile::TempDir, Repository) {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path().join("repo")).unwrap();
        (dir, repo)
    }

    #[test]
    fn write_and_read_blob_roundtrip() {
        // P1
        let (_dir, repo) = test_repo();
        let hashid = put_bytes_as_blob(&repo, b"hello, world!").unwrap();
        assert_eq!(get_blob_bytes(&repo, &hashid).unwrap(), b"hello, world!");
    }

    #[test]
    fn blob_dedup_is_idempotent() {
        // P2
        let (_dir, repo) = test_repo();
        let h1 = put_bytes_as_blob(&repo, b"dup").unwrap();
        let h2 = put_bytes_as_blob(&repo, b"dup").unwrap();
        assert_eq!(h1, h2);

        let path = object_path(&repo, &h1);
        let perms = fs::metadata(&path).unwrap().permissions();
        assert!(perms.readonly());
    }

    #[test]
    fn read_missing_blob_is_object_not_found() {
        let (_dir, repo) = test_repo();
        let result = get_blob_bytes(&repo, &HashId::ZERO);
        assert!(matches!(result, Err(Error::ObjectNotFound(_))));
    }

    #[test]
    fn put_file_as_blob_matches_put_bytes() {
        let (dir, repo) = test_repo();
        let src = dir.path().join("src.txt");
        fs::write(&src, b"streamed").unwrap();

        let from_file = put_file_as_blob(&repo, &src).unwrap();
        let from_bytes = put_bytes_as_blob(&repo, b"streamed").unwrap();
        assert_eq!(from_file, from_bytes);
    }

    #[test]
    fn put_and_get_empty_tree() {
        let (_dir, repo) = test_repo();
        let working = WorkingTree::default();
        let hashid = put_tree(&repo, &working).unwrap();
        let tree = get_tree(&repo, &hashid).unwrap();
        assert!(tree.is_empty());
        assert_eq!(hashid, Tree::empty().hashid().unwrap());
    }

    #[test]
    fn put_tree_recurses_and_dedupes_repeated_puts() {
        // P3
        let (dir, repo) = test_repo();
        let file_path = dir.path().join("a.txt");
        fs::write(&file_path, b"content").unwrap();

        let mut sub = WorkingTree::default();
        sub.files.insert("a.txt".into(), file_path);

        let mut working = WorkingTree::default();
        working.directories.insert("sub".into(), sub.clone());

        let h1 = put_tree(&repo, &working).unwrap();
        let h2 = put_tree(&repo, &working).unwrap();
        assert_eq!(h1, h2);

        let tree = get_tree(&repo, &h1).unwrap();
        let sub_hash = tree.directories["sub"];
        let sub_tree = get_tree(&repo, &sub_hash).unwrap();
        assert!(sub_tree.files.contains_key("a.txt"));
    }

    #[test]
    fn put_and_get_commit_roundtrip() {
        let (_dir, repo) = test_repo();
        let commit = Commit {
            author: Author::new("tester"),
            message: "first".into(),
            tree_hashid: Tree::empty().hashid().unwrap(),
            previous_commits_hashids: vec![],
        };
        let hashid = put_commit(&repo, &commit).unwrap();
        assert_eq!(get_commit(&repo, &hashid).unwrap(), commit);
    }
}
