use std::fs;

use tfs_sandbox::ConfinedPath;

use crate::error::{OpsError, OpsResult};

/// Upper bound on `name(n).ext` candidates tried by
/// [`FileOps::unique_name`](crate::FileOps::unique_name).
pub const MAX_NAME_ATTEMPTS: u32 = 100;

/// Split `name` into stem and extension (including the dot).
///
/// A leading dot is part of the stem, so `.bashrc` has no extension.
pub fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(idx) if idx > 0 => name.split_at(idx),
        _ => (name, ""),
    }
}

/// First free path among `name`, `stem(1).ext` ... `stem(MAX).ext` in `dir`.
pub(crate) fn first_free(dir: &ConfinedPath, name: &str) -> OpsResult<ConfinedPath> {
    let candidate = dir.join(name)?;
    if !occupied(&candidate) {
        return Ok(candidate);
    }
    let (stem, ext) = split_extension(name);
    for n in 1..=MAX_NAME_ATTEMPTS {
        let candidate = dir.join(&format!("{stem}({n}){ext}"))?;
        if !occupied(&candidate) {
            return Ok(candidate);
        }
    }
    Err(OpsError::Exhausted {
        name: name.to_string(),
        attempts: MAX_NAME_ATTEMPTS,
    })
}

/// Whether anything (file, directory or dangling link) sits at `path`.
pub(crate) fn occupied(path: &ConfinedPath) -> bool {
    fs::symlink_metadata(path.as_path()).is_ok()
}
