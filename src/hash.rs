use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{IoResultExt, Result};

/// size in bytes of one read chunk while streaming a file through the hasher
const HASH_CHUNK_SIZE: usize = 4096;

/// content hash identifying a blob, tree, or commit object
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HashId([u8; 32]);

impl HashId {
    /// the all-zero hash; never produced by `hash_bytes`, useful as a sentinel
    pub const ZERO: HashId = HashId([0u8; 32]);

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = hex::decode(s)
            .map_err(|_| crate::Error::FormatError(format!("invalid hash hex: {s}")))?;
        if bytes.len() != 32 {
            return Err(crate::Error::FormatError(format!("invalid hash hex: {s}")));
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// split the hex digest into `(hash[0:2], hash[2:])`, the on-disk fan-out path
    pub fn to_path_components(&self) -> (String, String) {
        let hex = self.to_hex();
        (hex[..2].to_string(), hex[2..].to_string())
    }

    /// `hash[0:2]/hash[2:]`, as used under `blobs/`
    pub fn to_relpath(&self) -> String {
        let (dir, rest) = self.to_path_components();
        format!("{dir}/{rest}")
    }
}

impl TryFrom<String> for HashId {
    type Error = crate::Error;

    fn try_from(s: String) -> Result<Self> {
        HashId::from_hex(&s)
    }
}

impl From<HashId> for String {
    fn from(h: HashId) -> String {
        h.to_hex()
    }
}

impl fmt::Display for HashId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for HashId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HashId({})", self.to_hex())
    }
}

/// hash an in-memory buffer directly; already resident, so no chunking needed
pub fn hash_bytes(buf: &[u8]) -> HashId {
    HashId::from_bytes(Sha256::digest(buf).into())
}

/// hash a file's content, streaming it in fixed-size blocks rather than
/// reading the whole file into memory at once
pub fn hash_file(path: &Path) -> Result<HashId> {
    let mut file = File::open(path).with_path(path)?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; HASH_CHUNK_SIZE];
    loop {
        let n = file.read(&mut buf).with_path(path)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(HashId::from_bytes(hasher.finalize().into()))
}
