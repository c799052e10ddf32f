use std::io::{self, Read};

use tfs_crypto::ContentHasher;
use tfs_types::ContentId;
use tracing::warn;

/// Streams an object while digesting it, and fails at end of stream if the
/// bytes read do not hash to the expected id.
///
/// A consumer that reads to the end therefore never accepts corrupted data
/// silently. Bytes are handed out before the check completes, so callers
/// that must not act on unverified data should buffer first (see
/// [`ContentStore::get`](crate::ContentStore::get)).
pub struct VerifyingReader<R> {
    inner: R,
    expected: ContentId,
    hasher: Option<ContentHasher>,
}

impl<R: Read> VerifyingReader<R> {
    pub fn new(inner: R, expected: ContentId) -> Self {
        Self {
            inner,
            expected,
            hasher: Some(ContentHasher::new()),
        }
    }

    /// The id the stream must hash to.
    pub fn expected(&self) -> &ContentId {
        &self.expected
    }
}

impl<R: Read> Read for VerifyingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        if n > 0 {
            if let Some(hasher) = self.hasher.as_mut() {
                hasher.update(&buf[..n]);
            }
            return Ok(n);
        }
        if buf.is_empty() {
            return Ok(0);
        }
        let Some(hasher) = self.hasher.take() else {
            return Ok(0);
        };
        let computed = hasher.finalize();
        if computed != self.expected {
            warn!(cid = %self.expected, computed = %computed, "streamed object failed digest check");
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("object {} is corrupt (hashes to {computed})", self.expected),
            ));
        }
        Ok(0)
    }
}

impl<R> std::fmt::Debug for VerifyingReader<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VerifyingReader")
            .field("expected", &self.expected)
            .field("finished", &self.hasher.is_none())
            .finish_non_exhaustive()
    }
}
