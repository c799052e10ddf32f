//! Name sanitization and validation for single path components.
//!
//! Two policies, used at different points:
//!
//! - [`sanitize_filename`] is lenient. It takes whatever a client sent as a
//!   file name, keeps the final component, drops characters outside the
//!   allowed set, and substitutes [`FALLBACK_NAME`] when nothing usable
//!   remains. It never fails.
//! - [`validate_component`] is strict. It accepts an existing name as-is
//!   but rejects anything that is not exactly one path component.

use crate::error::{SandboxError, SandboxResult};

/// Substituted for names that are empty after sanitization.
pub const FALLBACK_NAME: &str = "file";

/// Characters that are forbidden in a single component.
const FORBIDDEN_CHARS: &[char] = &['/', '\\', '\0'];

/// Reduce a client-supplied file name to a safe single component.
///
/// Keeps letters and digits of any script, `.`, `-`, `_` and space; strips
/// everything else, then trims surrounding whitespace. A result that is
/// empty or made only of dots becomes [`FALLBACK_NAME`].
///
/// # Examples
///
/// ```
/// use tfs_sandbox::sanitize_filename;
///
/// assert_eq!(sanitize_filename("report (final).pdf"), "report final.pdf");
/// assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
/// assert_eq!(sanitize_filename("???"), "file");
/// ```
pub fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or("");
    let kept: String = base
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, '.' | '-' | '_' | ' '))
        .collect();
    let trimmed = kept.trim();
    if trimmed.is_empty() || trimmed.chars().all(|c| c == '.') {
        FALLBACK_NAME.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Validate that `name` is exactly one usable path component.
pub fn validate_component(name: &str) -> SandboxResult<()> {
    if name.is_empty() {
        return Err(SandboxError::InvalidName {
            name: name.to_string(),
            reason: "name must not be empty".into(),
        });
    }

    for ch in FORBIDDEN_CHARS {
        if name.contains(*ch) {
            return Err(SandboxError::InvalidName {
                name: name.to_string(),
                reason: format!("contains forbidden character: {ch:?}"),
            });
        }
    }

    if name == "." || name == ".." {
        return Err(SandboxError::InvalidName {
            name: name.to_string(),
            reason: "must not be '.' or '..'".into(),
        });
    }

    Ok(())
}
