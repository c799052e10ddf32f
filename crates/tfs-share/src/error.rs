use tfs_crypto::MacError;
use tfs_types::ErrorKind;

/// Errors from issuing or redeeming share tokens.
#[derive(Debug, thiserror::Error)]
pub enum ShareError {
    /// The signature is valid but the deadline has passed.
    #[error("share token expired at {expired_at}")]
    Expired { expired_at: u64 },

    /// The token failed verification or could not be decoded.
    #[error("share token rejected: {0}")]
    Tampered(&'static str),

    /// The requested lifetime does not fit in a timestamp.
    #[error("invalid share token lifetime: {0}s")]
    InvalidTtl(u64),

    /// The signing key could not be built.
    #[error("share key: {0}")]
    Key(#[from] MacError),

    #[error("claims serialization: {0}")]
    Encode(#[from] serde_json::Error),
}

impl ShareError {
    /// Map into the caller-visible taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Expired { .. } => ErrorKind::Expired,
            Self::Tampered(_) => ErrorKind::Tampered,
            Self::InvalidTtl(_) | Self::Key(_) | Self::Encode(_) => ErrorKind::InvalidInput,
        }
    }
}

/// Result alias for share token operations.
pub type ShareResult<T> = Result<T, ShareError>;
