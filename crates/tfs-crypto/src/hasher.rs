use sha2::{Digest, Sha256};
use tfs_types::ContentId;

/// Incremental SHA-256 hasher producing [`ContentId`]s.
///
/// Wraps `sha2::Sha256` so callers can digest a payload while it is being
/// copied to a staging file, instead of buffering the whole thing first.
#[derive(Clone, Default)]
pub struct ContentHasher {
    inner: Sha256,
    len: u64,
}

impl ContentHasher {
    /// Create an empty hasher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed more bytes.
    pub fn update(&mut self, data: &[u8]) {
        self.inner.update(data);
        self.len += data.len() as u64;
    }

    /// Finish and return the identifier.
    pub fn finalize(self) -> ContentId {
        let digest = self.inner.finalize();
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&digest);
        ContentId::from_digest(arr)
    }
}

impl std::fmt::Debug for ContentHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentHasher").field("len", &self.len).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn incremental_matches_one_shot() {
        let mut h = ContentHasher::new();
        h.update(b"hel");
        h.update(b"lo");
        assert_eq!(h.finalize(), ContentId::of(b"hello"));
    }

    #[test]
    fn chunking_does_not_change_the_digest() {
        let data = vec![7u8; 100_000];
        let mut h = ContentHasher::new();
        for chunk in data.chunks(8192) {
            h.update(chunk);
        }
        assert_eq!(h.finalize(), ContentId::of(&data));
    }

    #[test]
    fn empty_hasher() {
        let h = ContentHasher::new();
        assert_eq!(format!("{h:?}"), "ContentHasher { len: 0 }");
        assert_eq!(h.finalize(), ContentId::of(b""));
    }
}
