//! Directory mutations for TenantFS.
//!
//! [`FileOps`] creates, deletes, renames, moves and copies entries inside a
//! tenant sandbox. It accepts only [`ConfinedPath`](tfs_sandbox::ConfinedPath)s,
//! so every path has already been through sandbox resolution.
//!
//! Nothing is ever overwritten implicitly: an occupied destination is an
//! [`OpsError::AlreadyExists`]. Callers that want a fresh name ask
//! [`FileOps::unique_name`], which tries a bounded number of `name(n).ext`
//! candidates before giving up.

pub mod error;
pub mod naming;
pub mod ops;
mod walk;

pub use error::{OpsError, OpsResult};
pub use naming::{split_extension, MAX_NAME_ATTEMPTS};
pub use ops::FileOps;
