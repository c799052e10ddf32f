use std::path::PathBuf;

use tfs_types::ErrorKind;

/// Errors from path confinement.
#[derive(Debug, thiserror::Error)]
pub enum SandboxError {
    /// The path would resolve outside the sandbox root.
    #[error("path escapes sandbox root: {path:?}")]
    PathEscape { path: String },

    /// The path is syntactically unusable (NUL bytes, drive prefixes).
    #[error("invalid path {path:?}: {reason}")]
    InvalidPath { path: String, reason: String },

    /// A single name component is unusable.
    #[error("invalid name {name:?}: {reason}")]
    InvalidName { name: String, reason: String },

    /// The sandbox root itself is unusable.
    #[error("invalid sandbox root {path}: {reason}")]
    InvalidRoot { path: PathBuf, reason: String },

    /// I/O error while preparing or re-checking the root.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SandboxError {
    /// Map into the caller-visible taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::PathEscape { .. } => ErrorKind::PathEscape,
            Self::InvalidPath { .. } | Self::InvalidName { .. } | Self::InvalidRoot { .. } => {
                ErrorKind::InvalidInput
            }
            Self::Io(_) => ErrorKind::Io,
        }
    }
}

/// Result alias for sandbox operations.
pub type SandboxResult<T> = Result<T, SandboxError>;
