use tfs_sandbox::SandboxError;
use tfs_types::ErrorKind;

/// Errors from file operations.
///
/// Paths in messages are virtual paths (`/docs/a.txt`), never host paths.
#[derive(Debug, thiserror::Error)]
pub enum OpsError {
    #[error(transparent)]
    Sandbox(#[from] SandboxError),

    #[error("not found: {path}")]
    NotFound { path: String },

    #[error("already exists: {path}")]
    AlreadyExists { path: String },

    #[error("refusing to delete the sandbox root")]
    RootDeletionForbidden,

    /// The destination cannot work for this source (e.g. a directory moved
    /// into its own subtree).
    #[error("invalid target {path}: {reason}")]
    InvalidTarget { path: String, reason: String },

    #[error("no free name for {name:?} after {attempts} attempts")]
    Exhausted { name: String, attempts: u32 },

    /// A recursive operation failed after changing part of the tree.
    #[error("{op} stopped after {completed} entries at {failed_at}: {source}")]
    Partial {
        op: &'static str,
        completed: u64,
        failed_at: String,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl OpsError {
    /// Map into the caller-visible taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Sandbox(e) => e.kind(),
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::AlreadyExists { .. } => ErrorKind::AlreadyExists,
            Self::RootDeletionForbidden => ErrorKind::RootDeletionForbidden,
            Self::InvalidTarget { .. } => ErrorKind::InvalidInput,
            Self::Exhausted { .. } => ErrorKind::Exhausted,
            Self::Partial { .. } => ErrorKind::Partial,
            Self::Io { .. } => ErrorKind::Io,
        }
    }

    /// Classify an I/O error raised at `path`.
    ///
    /// `NotFound` and `AlreadyExists` become their typed variants, which is
    /// how the loser of a race between two mutations is reported.
    pub(crate) fn from_io(path: impl Into<String>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound { path },
            std::io::ErrorKind::AlreadyExists => Self::AlreadyExists { path },
            _ => Self::Io { path, source },
        }
    }
}

/// Result alias for file operations.
pub type OpsResult<T> = Result<T, OpsError>;
