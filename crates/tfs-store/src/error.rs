use tfs_types::{ContentId, ErrorKind};

/// Errors from content store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The requested object was not found.
    #[error("object not found: {0}")]
    NotFound(ContentId),

    /// Stored bytes no longer hash to their identifier (data corruption).
    #[error("corrupt object {id}: stored bytes hash to {computed}")]
    Corrupt { id: ContentId, computed: ContentId },

    /// A string could not be parsed as a content identifier.
    #[error("invalid content id {input:?}: {reason}")]
    InvalidId { input: String, reason: String },

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Map into the caller-visible taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::InvalidId { .. } => ErrorKind::InvalidInput,
            Self::Corrupt { .. } | Self::Io(_) => ErrorKind::Io,
        }
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
