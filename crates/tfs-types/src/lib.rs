//! Foundation types for TenantFS.
//!
//! This crate provides the identifiers and classifications shared by every
//! other TenantFS crate.
//!
//! # Key Types
//!
//! - [`ContentId`] -- Content identifier (SHA-256 digest of an object's bytes)
//! - [`FileKind`] -- Closed extension → kind classification table
//! - [`ErrorKind`] -- The caller-visible error taxonomy every crate maps into
//! - [`Timestamp`] -- UTC wall-clock time used for metadata and tokens

pub mod content;
pub mod error;
pub mod kind;
pub mod taxonomy;
pub mod time;

pub use content::ContentId;
pub use error::TypeError;
pub use kind::{mime_for, FileKind};
pub use taxonomy::ErrorKind;
pub use time::{system_time_to_timestamp, unix_now, Timestamp};
