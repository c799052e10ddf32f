//! Signed, expiring share tokens for TenantFS.
//!
//! A share token is a bearer capability: whoever holds an unexpired token can
//! read its target, independent of who issued it. Tokens cannot be revoked
//! before they expire.
//!
//! # Wire Format
//!
//! ```text
//! base64url(claims JSON) "." base64url(BLAKE3 keyed MAC of the first part)
//! ```
//!
//! Both parts use the URL-safe alphabet without padding, so a token can be
//! placed in a URL path segment as-is. The MAC is checked before anything is
//! parsed, and only a correctly signed token is checked for expiry; the two
//! failures are reported as distinct [`ShareError`] variants.

pub mod claims;
pub mod codec;
pub mod error;

pub use claims::{ShareClaims, ShareTarget, ShareToken};
pub use codec::{ShareTokenCodec, DEFAULT_TTL};
pub use error::{ShareError, ShareResult};
