//! Content-addressed object storage for TenantFS.
//!
//! Payloads are stored once per distinct SHA-256 digest in a flat namespace,
//! independent of any tenant's directory tree. Uploading identical bytes
//! twice is a no-op the second time.
//!
//! # Storage Backend
//!
//! Backends implement the [`ContentStore`] trait. [`FsContentStore`] keeps
//! one file per object under `objects/`, published atomically from a `tmp/`
//! staging area, and streams reads through a [`VerifyingReader`].
//!
//! # Design Rules
//!
//! 1. Objects are immutable once written (content-addressing guarantees this).
//! 2. Stage, digest, then publish: readers never observe a partial object.
//! 3. Concurrent `put`s of the same bytes publish at most one object.
//! 4. Reads re-verify the digest; corruption is reported, never served.
//! 5. All I/O errors are propagated, never silently ignored.

pub mod error;
pub mod fs;
pub mod object;
pub mod reader;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use fs::FsContentStore;
pub use object::ObjectInfo;
pub use reader::VerifyingReader;
pub use traits::ContentStore;
