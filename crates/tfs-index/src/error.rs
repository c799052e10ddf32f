use std::path::PathBuf;

use tfs_types::ErrorKind;

/// Errors from tree snapshots.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// The snapshot root does not exist.
    #[error("not found: /{0}")]
    NotFound(String),

    /// I/O failure while walking.
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl IndexError {
    /// Map into the caller-visible taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Io { .. } => ErrorKind::Io,
        }
    }
}

/// Result alias for index operations.
pub type IndexResult<T> = Result<T, IndexError>;
