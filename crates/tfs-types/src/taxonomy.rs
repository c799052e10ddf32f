use std::fmt;

use serde::{Deserialize, Serialize};

/// Caller-visible error taxonomy.
///
/// Every crate's error type maps into one of these kinds through a `kind()`
/// method, so an outer layer (HTTP, CLI) can pick a response without
/// matching on each crate's variants. All kinds are local to the single
/// requested operation; none of them is fatal to the process.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// A path tried to leave its sandbox root. Never retried.
    PathEscape,
    /// The addressed file, directory or object does not exist.
    NotFound,
    /// The destination of a create/rename/move/copy is already taken.
    AlreadyExists,
    /// Deleting a sandbox root was requested.
    RootDeletionForbidden,
    /// A share token had a valid signature but its deadline passed.
    Expired,
    /// A share token failed signature verification or could not be decoded.
    Tampered,
    /// The content type or extension is not on the allow-list.
    Unsupported,
    /// Malformed input: bad names, digests, tenant ids, self-nesting moves.
    InvalidInput,
    /// A payload exceeded the configured size limit.
    TooLarge,
    /// A bounded retry loop ran out of attempts.
    Exhausted,
    /// A recursive operation stopped part of the way through.
    Partial,
    /// Any other I/O failure.
    Io,
}

impl ErrorKind {
    /// Whether the condition indicates a possible attack rather than a
    /// user mistake.
    pub fn is_security_event(&self) -> bool {
        matches!(self, Self::PathEscape | Self::Tampered)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::PathEscape => "path_escape",
            Self::NotFound => "not_found",
            Self::AlreadyExists => "already_exists",
            Self::RootDeletionForbidden => "root_deletion_forbidden",
            Self::Expired => "expired",
            Self::Tampered => "tampered",
            Self::Unsupported => "unsupported",
            Self::InvalidInput => "invalid_input",
            Self::TooLarge => "too_large",
            Self::Exhausted => "exhausted",
            Self::Partial => "partial",
            Self::Io => "io",
        };
        f.write_str(s)
    }
}
