use tracing::warn;

use crate::error::{SandboxError, SandboxResult};
use crate::path::{ConfinedPath, SandboxRoot};

/// Resolves caller-supplied virtual paths against a fixed root.
///
/// Resolution makes no filesystem calls, so a crafted `..` is rejected before
/// anything on disk is touched. Destructive operations additionally call
/// [`PathSandbox::recheck`] right before the irreversible step.
#[derive(Clone, Debug)]
pub struct PathSandbox {
    root: SandboxRoot,
}

impl PathSandbox {
    /// Create a sandbox bound to `root`.
    pub fn new(root: SandboxRoot) -> Self {
        Self { root }
    }

    /// The sandbox root.
    pub fn root(&self) -> &SandboxRoot {
        &self.root
    }

    /// Resolve a virtual path to a confined absolute path.
    ///
    /// Leading separators are stripped, so `/a/b` and `a/b` name the same
    /// entry. Both `/` and `\` separate components. `.` segments are dropped
    /// and `..` pops the previous segment; a `..` with nothing left to pop is
    /// a [`SandboxError::PathEscape`], as is a drive prefix such as `C:`.
    /// The empty string resolves to the root itself.
    pub fn resolve(&self, virtual_path: &str) -> SandboxResult<ConfinedPath> {
        resolve(&self.root, virtual_path)
    }

    /// Whether `path` is the sandbox root, compared on absolute paths.
    pub fn is_root(&self, path: &ConfinedPath) -> bool {
        path.as_path() == self.root.as_path()
    }

    /// Re-validate a confined path immediately before a destructive step.
    ///
    /// Repeats the component-wise containment check, then resolves the
    /// nearest existing ancestor through the filesystem and confirms that it
    /// still lies under the (canonical) root. This catches a directory that
    /// was swapped for a symlink after the original resolution, including
    /// one that a later `create_dir_all` would have descended through.
    pub fn recheck(&self, path: &ConfinedPath) -> SandboxResult<()> {
        if !self.root.contains(path.as_path()) {
            return Err(escape(path.virtual_path()));
        }
        if path.is_root() {
            return Ok(());
        }
        let real_root = self.root.as_path().canonicalize()?;
        let mut ancestor = path.as_path().parent();
        while let Some(dir) = ancestor {
            match dir.canonicalize() {
                Ok(real) if real.starts_with(&real_root) => return Ok(()),
                Ok(real) => {
                    warn!(
                        path = %path,
                        resolved = %real.display(),
                        "ancestor directory resolves outside sandbox root"
                    );
                    return Err(escape(path.virtual_path()));
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => ancestor = dir.parent(),
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }
}

/// Resolve `virtual_path` against `root`. See [`PathSandbox::resolve`].
pub fn resolve(root: &SandboxRoot, virtual_path: &str) -> SandboxResult<ConfinedPath> {
    if virtual_path.contains('\0') {
        return Err(SandboxError::InvalidPath {
            path: virtual_path.escape_debug().to_string(),
            reason: "contains a NUL byte".into(),
        });
    }

    let trimmed = virtual_path.trim_start_matches(is_separator);
    let mut segments: Vec<&str> = Vec::new();
    for (i, segment) in trimmed.split(is_separator).enumerate() {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.pop().is_none() {
                    warn!(path = virtual_path, "rejected path escaping sandbox root");
                    return Err(escape(virtual_path));
                }
            }
            s if i == 0 && is_drive_prefix(s) => {
                warn!(path = virtual_path, "rejected drive-qualified path");
                return Err(escape(virtual_path));
            }
            s => segments.push(s),
        }
    }

    let mut absolute = root.as_path().to_path_buf();
    for segment in &segments {
        absolute.push(segment);
    }
    if !root.contains(&absolute) {
        warn!(path = virtual_path, "resolved path left sandbox root");
        return Err(escape(virtual_path));
    }

    Ok(ConfinedPath::new(absolute, segments.join("/")))
}

/// `C:` style prefixes; on Windows they would make a join absolute.
fn is_drive_prefix(segment: &str) -> bool {
    let bytes = segment.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

fn escape(path: &str) -> SandboxError {
    SandboxError::PathEscape {
        path: path.to_string(),
    }
}

fn is_separator(c: char) -> bool {
    c == '/' || c == '\\'
}
