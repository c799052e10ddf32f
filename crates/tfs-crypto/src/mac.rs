/// Context string for deriving MAC keys from operator-supplied secrets.
const KEY_CONTEXT: &str = "tenantfs 2024 share-token mac v1";

/// Secret key for the BLAKE3 keyed MAC (server-held, never serialized).
#[derive(Clone)]
pub struct MacKey([u8; 32]);

/// A 32-byte MAC tag.
///
/// Equality goes through `blake3::Hash`, whose `PartialEq` is constant-time,
/// so comparing a presented tag against a computed one leaks no timing
/// information about how many leading bytes matched.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct MacTag(blake3::Hash);

impl MacKey {
    /// Create from raw 32-byte key material.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Derive a key from an arbitrary-length secret (e.g. a config value).
    ///
    /// Returns an error for an empty secret.
    pub fn derive_from_secret(secret: &[u8]) -> Result<Self, MacError> {
        if secret.is_empty() {
            return Err(MacError::EmptySecret);
        }
        Ok(Self(blake3::derive_key(KEY_CONTEXT, secret)))
    }

    /// Compute the tag of a message.
    pub fn sign(&self, message: &[u8]) -> MacTag {
        MacTag(blake3::keyed_hash(&self.0, message))
    }

    /// Verify a tag on a message in constant time.
    pub fn verify(&self, message: &[u8], tag: &MacTag) -> Result<(), MacError> {
        if self.sign(message) == *tag {
            Ok(())
        } else {
            Err(MacError::InvalidTag)
        }
    }
}

impl MacTag {
    /// Length of a tag in bytes.
    pub const LEN: usize = 32;

    /// Create from raw bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(blake3::Hash::from(bytes))
    }

    /// Create from a byte slice, which must be exactly [`MacTag::LEN`] long.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, MacError> {
        let arr: [u8; 32] = bytes.try_into().map_err(|_| MacError::InvalidLength {
            expected: Self::LEN,
            actual: bytes.len(),
        })?;
        Ok(Self::from_bytes(arr))
    }

    /// Raw tag bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        self.0.as_bytes()
    }
}

impl std::fmt::Debug for MacKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MacKey(<redacted>)")
    }
}

impl std::fmt::Debug for MacTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MacTag({}...)", hex::encode(&self.as_bytes()[..8]))
    }
}

/// Errors from MAC operations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum MacError {
    #[error("invalid MAC tag")]
    InvalidTag,
    #[error("invalid tag length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
    #[error("MAC secret must not be empty")]
    EmptySecret,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::RngCore;

    fn random_key() -> MacKey {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        MacKey::from_bytes(bytes)
    }

    #[test]
    fn sign_and_verify() {
        let key = random_key();
        let tag = key.sign(b"message");
        assert!(key.verify(b"message", &tag).is_ok());
    }

    #[test]
    fn wrong_message_fails() {
        let key = random_key();
        let tag = key.sign(b"message");
        assert_eq!(key.verify(b"massage", &tag), Err(MacError::InvalidTag));
    }

    #[test]
    fn wrong_key_fails() {
        let k1 = random_key();
        let k2 = random_key();
        let tag = k1.sign(b"message");
        assert!(k2.verify(b"message", &tag).is_err());
    }

    #[test]
    fn derived_keys_are_deterministic() {
        let a = MacKey::derive_from_secret(b"hunter2").unwrap();
        let b = MacKey::derive_from_secret(b"hunter2").unwrap();
        assert_eq!(a.sign(b"x"), b.sign(b"x"));
        let c = MacKey::derive_from_secret(b"hunter3").unwrap();
        assert_ne!(a.sign(b"x"), c.sign(b"x"));
    }

    #[test]
    fn empty_secret_rejected() {
        assert_eq!(
            MacKey::derive_from_secret(b"").unwrap_err(),
            MacError::EmptySecret
        );
    }

    #[test]
    fn tag_slice_roundtrip() {
        let key = MacKey::from_bytes([9; 32]);
        let tag = key.sign(b"data");
        let parsed = MacTag::from_slice(tag.as_bytes()).unwrap();
        assert_eq!(tag, parsed);
        assert!(matches!(
            MacTag::from_slice(&[0u8; 31]),
            Err(MacError::InvalidLength { expected: 32, actual: 31 })
        ));
    }

    #[test]
    fn debug_redacts_key() {
        let key = MacKey::from_bytes([1; 32]);
        assert_eq!(format!("{key:?}"), "MacKey(<redacted>)");
    }
}
