//! Directory tree snapshots for TenantFS.
//!
//! [`TreeIndex`] walks a confined directory and returns a [`DirectoryNode`]
//! tree: directories with their children sorted by name, files with size,
//! modification time and [`FileKind`](tfs_types::FileKind).
//!
//! A snapshot is a plain value. It is never cached and has no link back to
//! the filesystem, so it is stale as soon as it is returned. Concurrent
//! mutations during the walk may or may not be reflected.

pub mod error;
pub mod node;
pub mod tree;

pub use error::{IndexError, IndexResult};
pub use node::{DirEntry, DirectoryNode, FileEntry};
pub use tree::TreeIndex;
