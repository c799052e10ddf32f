use std::time::Duration;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use tfs_crypto::{MacKey, MacTag};
use tfs_types::unix_now;
use tracing::{debug, warn};

use crate::claims::{ShareClaims, ShareTarget, ShareToken};
use crate::error::{ShareError, ShareResult};

/// Default token lifetime: 30 days.
pub const DEFAULT_TTL: Duration = Duration::from_secs(30 * 24 * 60 * 60);

const SEPARATOR: char = '.';

/// Issues and redeems share tokens under one server-held key.
#[derive(Clone, Debug)]
pub struct ShareTokenCodec {
    key: MacKey,
    default_ttl: Duration,
}

impl ShareTokenCodec {
    pub fn new(key: MacKey) -> Self {
        Self {
            key,
            default_ttl: DEFAULT_TTL,
        }
    }

    /// Build a codec from a configured secret. Empty secrets are rejected.
    pub fn from_secret(secret: &[u8]) -> ShareResult<Self> {
        Ok(Self::new(MacKey::derive_from_secret(secret)?))
    }

    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Issue a token for `target` valid for `ttl` from now.
    pub fn issue(&self, target: ShareTarget, ttl: Duration) -> ShareResult<ShareToken> {
        self.issue_at(target, ttl, unix_now())
    }

    /// Issue a token as if the current time were `now` (UNIX seconds).
    pub fn issue_at(&self, target: ShareTarget, ttl: Duration, now: u64) -> ShareResult<ShareToken> {
        let expires_at = now
            .checked_add(ttl.as_secs())
            .filter(|exp| i64::try_from(*exp).is_ok())
            .ok_or(ShareError::InvalidTtl(ttl.as_secs()))?;
        let claims = ShareClaims {
            target,
            issued_at: now,
            expires_at,
        };
        let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims)?);
        let tag = self.key.sign(payload.as_bytes());
        debug!(share = %claims.target, expires_at, "issued share token");
        Ok(ShareToken::new(format!(
            "{payload}{SEPARATOR}{}",
            URL_SAFE_NO_PAD.encode(tag.as_bytes())
        )))
    }

    /// Verify a token and return its claims.
    pub fn redeem(&self, token: &str) -> ShareResult<ShareClaims> {
        self.redeem_at(token, unix_now())
    }

    /// Verify a token as if the current time were `now` (UNIX seconds).
    ///
    /// The signature is checked first. A token with a bad signature is
    /// [`ShareError::Tampered`] regardless of its claimed expiry; only a
    /// correctly signed token can be [`ShareError::Expired`].
    pub fn redeem_at(&self, token: &str, now: u64) -> ShareResult<ShareClaims> {
        let claims = self.verify(token).map_err(|reason| {
            warn!(reason, "rejected tampered share token");
            ShareError::Tampered(reason)
        })?;
        if !claims.is_valid_at(now) {
            debug!(share = %claims.target, expires_at = claims.expires_at, "share token expired");
            return Err(ShareError::Expired {
                expired_at: claims.expires_at,
            });
        }
        Ok(claims)
    }

    fn verify(&self, token: &str) -> Result<ShareClaims, &'static str> {
        let (payload, tag) = token
            .split_once(SEPARATOR)
            .ok_or("missing signature separator")?;
        let tag_bytes = URL_SAFE_NO_PAD
            .decode(tag)
            .map_err(|_| "signature is not valid base64url")?;
        let tag = MacTag::from_slice(&tag_bytes).map_err(|_| "signature has the wrong length")?;
        self.key
            .verify(payload.as_bytes(), &tag)
            .map_err(|_| "signature mismatch")?;
        let json = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| "payload is not valid base64url")?;
        serde_json::from_slice(&json).map_err(|_| "payload is not valid claims")
    }
}
