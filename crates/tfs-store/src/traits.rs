use std::io::Read;

use tfs_types::ContentId;

use crate::error::StoreResult;
use crate::object::ObjectInfo;

/// Content-addressed object store.
///
/// All implementations must satisfy these invariants:
/// - Objects are immutable once written. The same bytes always produce the
///   same identifier.
/// - `put` is idempotent: storing bytes that are already present writes
///   nothing and returns the existing identifier.
/// - Readers never observe a partially written object.
/// - All I/O errors are propagated, never silently ignored.
pub trait ContentStore: Send + Sync {
    /// Store a payload and return its identifier.
    fn put(&self, data: &[u8]) -> StoreResult<ContentId>;

    /// Store everything a reader yields.
    ///
    /// Default implementation buffers the payload and calls `put()`. Backends
    /// may override to stream into a staging area instead.
    fn put_reader(&self, reader: &mut dyn Read) -> StoreResult<ObjectInfo> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        let id = self.put(&data)?;
        self.stat(&id)?.ok_or(crate::StoreError::NotFound(id))
    }

    /// Read an object's bytes. Missing objects are `StoreError::NotFound`.
    fn get(&self, id: &ContentId) -> StoreResult<Vec<u8>>;

    /// Metadata for an object, `None` if absent.
    fn stat(&self, id: &ContentId) -> StoreResult<Option<ObjectInfo>>;

    /// Check whether an object exists in the store.
    fn exists(&self, id: &ContentId) -> StoreResult<bool> {
        Ok(self.stat(id)?.is_some())
    }

    /// Delete an object by ID. Returns `true` if the object existed.
    ///
    /// There is no reference counting: callers delete an object only when
    /// they hold its sole logical reference.
    fn delete(&self, id: &ContentId) -> StoreResult<bool>;

    /// All objects, newest first.
    fn list(&self) -> StoreResult<Vec<ObjectInfo>>;
}
