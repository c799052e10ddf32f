use serde::{Deserialize, Serialize};
use tfs_types::{ContentId, Timestamp};

use crate::error::{StoreError, StoreResult};

/// Metadata of one stored object.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectInfo {
    /// Content identifier (SHA-256 of the bytes).
    pub id: ContentId,
    /// Payload size in bytes.
    pub size: u64,
    /// When the object was first published.
    pub modified: Timestamp,
}

/// Sort newest first; ties broken by identifier so output is deterministic.
pub fn sort_newest_first(objects: &mut [ObjectInfo]) {
    objects.sort_by(|a, b| b.modified.cmp(&a.modified).then(a.id.cmp(&b.id)));
}

/// Parse a caller-supplied identifier, mapping failures into [`StoreError`].
pub fn parse_content_id(input: &str) -> StoreResult<ContentId> {
    input.parse().map_err(|e: tfs_types::TypeError| StoreError::InvalidId {
        input: input.to_string(),
        reason: e.to_string(),
    })
}
