use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tfs_types::{ContentId, Timestamp};

/// What a share token grants read access to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "t", rename_all = "lowercase")]
pub enum ShareTarget {
    /// A file in a tenant's tree, by virtual path. Re-resolved through the
    /// tenant sandbox on every redemption.
    Path { tenant: String, path: String },
    /// An object in the content store.
    Content { cid: ContentId },
}

impl fmt::Display for ShareTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path { tenant, path } => write!(f, "{tenant}:/{path}"),
            Self::Content { cid } => write!(f, "cid:{cid}"),
        }
    }
}

/// The signed contents of a share token. Times are UNIX seconds.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareClaims {
    #[serde(rename = "tgt")]
    pub target: ShareTarget,
    #[serde(rename = "iat")]
    pub issued_at: u64,
    #[serde(rename = "exp")]
    pub expires_at: u64,
}

impl ShareClaims {
    /// Valid at `now` when `now <= expires_at`.
    pub fn is_valid_at(&self, now: u64) -> bool {
        now <= self.expires_at
    }

    pub fn expires(&self) -> Option<Timestamp> {
        DateTime::<Utc>::from_timestamp(i64::try_from(self.expires_at).ok()?, 0)
    }
}

/// An issued, opaque, URL-safe token string.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShareToken(String);

impl ShareToken {
    pub(crate) fn new(s: String) -> Self {
        Self(s)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ShareToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ShareToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
