use std::path::PathBuf;

use crate::hash::HashId;

/// error type for snapfs operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("repository not initialized at {0}")]
    NotInitialized(PathBuf),

    #[error("repository already initialized at {0}")]
    AlreadyInitialized(PathBuf),

    #[error("object not found: {0}")]
    ObjectNotFound(HashId),

    #[error("no reference: HEAD is empty")]
    NoReference,

    #[error("invalid reference: {0}")]
    InvalidReference(String),

    #[error("invalid reference name: {0}")]
    InvalidRefName(String),

    #[error("attempted to store an empty blob")]
    EmptyBlob,

    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("format error: {0}")]
    FormatError(String),

    #[error("lock contention on repository")]
    LockContention,
}

pub type Result<T> = std::result::Result<T, Error>;

/// attach a filesystem path to a bare `io::Result` at the point the call is made
pub trait IoResultExt<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|source| Error::Io {
            path: path.into(),
            source,
        })
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::FormatError(e.to_string())
    }
}
