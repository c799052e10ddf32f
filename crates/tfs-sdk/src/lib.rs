//! High-level SDK for TenantFS.
//!
//! [`Store`] is the entry point: it owns the immutable [`StoreConfig`], the
//! shared content store and the share-token key, and hands out a
//! [`TenantStore`] per tenant. Every `TenantStore` operation takes raw
//! virtual paths and resolves them through the tenant's sandbox itself, so
//! callers cannot skip the confinement check.
//!
//! # Layout
//!
//! ```text
//! <data_root>/tenants/<tenant>/...   one sandboxed tree per tenant
//! <data_root>/cas/objects/<sha256>   content-addressed objects (shared)
//! <data_root>/cas/tmp/               staging for in-flight writes
//! ```

pub mod config;
pub mod error;
pub mod record;
pub mod store;
pub mod tenant;

pub use config::{ConflictPolicy, StoreConfig};
pub use error::{SdkError, SdkResult};
pub use record::{Download, FileRecord, Locator, Page, PageRequest};
pub use store::Store;
pub use tenant::TenantStore;

// Re-export key types
pub use tfs_index::{DirEntry, DirectoryNode, FileEntry};
pub use tfs_share::{ShareClaims, ShareTarget, ShareToken, DEFAULT_TTL};
pub use tfs_store::{ContentStore, ObjectInfo};
pub use tfs_types::{ContentId, ErrorKind, FileKind};
