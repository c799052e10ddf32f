use thiserror::Error;
use tfs_types::{ErrorKind, FileKind};

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid tenant id {tenant:?}: {reason}")]
    InvalidTenant { tenant: String, reason: String },

    #[error("invalid path {path:?}: {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("{kind} files are not accepted: {name}")]
    Unsupported { name: String, kind: FileKind },

    #[error("payload of {size} bytes exceeds the limit of {limit}")]
    TooLarge { size: u64, limit: u64 },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("not a regular file: {0}")]
    NotAFile(String),

    #[error("not an editable text file: {0}")]
    NotText(String),

    #[error("sandbox error: {0}")]
    Sandbox(#[from] tfs_sandbox::SandboxError),

    #[error("store error: {0}")]
    Store(#[from] tfs_store::StoreError),

    #[error("index error: {0}")]
    Index(#[from] tfs_index::IndexError),

    #[error("{0}")]
    Ops(#[from] tfs_ops::OpsError),

    #[error("share error: {0}")]
    Share(#[from] tfs_share::ShareError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SdkError {
    /// Map into the caller-visible taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config(_)
            | Self::InvalidTenant { .. }
            | Self::InvalidPath { .. } => ErrorKind::InvalidInput,
            Self::Unsupported { .. } | Self::NotText(_) => ErrorKind::Unsupported,
            Self::TooLarge { .. } => ErrorKind::TooLarge,
            // A directory or link where a file was expected is reported
            // exactly like a missing file.
            Self::NotFound(_) | Self::NotAFile(_) => ErrorKind::NotFound,
            Self::Sandbox(e) => e.kind(),
            Self::Store(e) => e.kind(),
            Self::Index(e) => e.kind(),
            Self::Ops(e) => e.kind(),
            Self::Share(e) => e.kind(),
            Self::Io(e) if e.kind() == std::io::ErrorKind::NotFound => ErrorKind::NotFound,
            Self::Io(_) => ErrorKind::Io,
        }
    }
}

pub type SdkResult<T> = Result<T, SdkError>;
