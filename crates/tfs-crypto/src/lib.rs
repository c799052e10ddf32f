//! Cryptographic primitives for TenantFS.
//!
//! Provides incremental SHA-256 content digests and a BLAKE3
//! keyed MAC used to sign share tokens.
//!
//! All crypto operations wrap established libraries; there is no custom cryptography.

pub mod hasher;
pub mod mac;

pub use hasher::ContentHasher;
pub use mac::{MacError, MacKey, MacTag};
