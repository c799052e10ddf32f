//! Path confinement for TenantFS.
//!
//! Every caller-supplied path goes through [`PathSandbox::resolve`] before it
//! touches the filesystem. Resolution is purely lexical: `.` and `..` are
//! collapsed on the string, any attempt to climb above the root is rejected
//! as [`SandboxError::PathEscape`], and the joined result is checked against
//! the root component by component (so `/data2` is never mistaken for a
//! child of `/data`).
//!
//! # Key Types
//!
//! - [`SandboxRoot`] -- the fixed, absolute directory a sandbox is bound to
//! - [`ConfinedPath`] -- a path proven to lie inside its root; only
//!   constructed by the sandbox
//! - [`PathSandbox`] -- resolver and pre-mutation re-checks
//!
//! Filename sanitization for user-supplied names lives in [`names`].

pub mod error;
pub mod names;
pub mod path;
pub mod sandbox;

pub use error::{SandboxError, SandboxResult};
pub use names::{sanitize_filename, validate_component, FALLBACK_NAME};
pub use path::{ConfinedPath, SandboxRoot};
pub use sandbox::PathSandbox;
