use std::fmt;
use std::path::{Component, Path, PathBuf};

use crate::error::{SandboxError, SandboxResult};
use crate::names::validate_component;

/// The fixed, absolute directory a sandbox is bound to.
///
/// Held by value and never mutated after construction; every
/// [`ConfinedPath`] produced against it is a descendant of (or equal to)
/// this directory.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SandboxRoot(PathBuf);

impl SandboxRoot {
    /// Bind to an absolute directory path.
    ///
    /// The path is normalized lexically (`.` dropped, `..` collapsed); it is
    /// not required to exist yet.
    pub fn new(path: impl Into<PathBuf>) -> SandboxResult<Self> {
        let path = path.into();
        if !path.is_absolute() {
            return Err(SandboxError::InvalidRoot {
                path,
                reason: "sandbox root must be absolute".into(),
            });
        }
        Ok(Self(normalize_absolute(&path)))
    }

    /// Create the directory if needed and bind to its canonical location.
    ///
    /// Canonicalizing once here means later component-wise comparisons are
    /// made against the real location even when the configured path runs
    /// through a symlink (e.g. `/tmp` on macOS).
    pub fn create(path: impl AsRef<Path>) -> SandboxResult<Self> {
        let path = path.as_ref();
        std::fs::create_dir_all(path)?;
        let canonical = path.canonicalize()?;
        if !canonical.is_dir() {
            return Err(SandboxError::InvalidRoot {
                path: canonical,
                reason: "sandbox root is not a directory".into(),
            });
        }
        Ok(Self(canonical))
    }

    /// The root directory.
    pub fn as_path(&self) -> &Path {
        &self.0
    }

    /// Component-wise containment test (`/data2` is not inside `/data`).
    pub fn contains(&self, path: &Path) -> bool {
        path.starts_with(&self.0)
    }

    /// The root itself as a confined path.
    pub fn confined_root(&self) -> ConfinedPath {
        ConfinedPath {
            absolute: self.0.clone(),
            relative: String::new(),
        }
    }
}

impl AsRef<Path> for SandboxRoot {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

/// An absolute path proven to lie inside its sandbox root.
///
/// Only [`PathSandbox`](crate::PathSandbox) and the methods below construct
/// one, so holding a `ConfinedPath` means resolution already happened.
/// Carries both the absolute filesystem path and the normalized virtual path
/// (slash-separated, relative to the root, empty for the root itself).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ConfinedPath {
    absolute: PathBuf,
    relative: String,
}

impl ConfinedPath {
    pub(crate) fn new(absolute: PathBuf, relative: String) -> Self {
        Self { absolute, relative }
    }

    /// The absolute filesystem path.
    pub fn as_path(&self) -> &Path {
        &self.absolute
    }

    /// The normalized virtual path relative to the sandbox root.
    pub fn virtual_path(&self) -> &str {
        &self.relative
    }

    /// Whether this is the sandbox root itself.
    pub fn is_root(&self) -> bool {
        self.relative.is_empty()
    }

    /// Final component, or `None` for the root.
    pub fn file_name(&self) -> Option<&str> {
        if self.is_root() {
            None
        } else {
            self.relative.rsplit('/').next()
        }
    }

    /// The containing directory, or `None` for the root.
    pub fn parent(&self) -> Option<ConfinedPath> {
        if self.is_root() {
            return None;
        }
        let absolute = self.absolute.parent()?.to_path_buf();
        let relative = match self.relative.rsplit_once('/') {
            Some((head, _)) => head.to_string(),
            None => String::new(),
        };
        Some(Self { absolute, relative })
    }

    /// Descend by exactly one validated component.
    pub fn join(&self, name: &str) -> SandboxResult<ConfinedPath> {
        validate_component(name)?;
        let relative = if self.relative.is_empty() {
            name.to_string()
        } else {
            format!("{}/{}", self.relative, name)
        };
        Ok(Self {
            absolute: self.absolute.join(name),
            relative,
        })
    }

    /// A sibling with a different final component.
    pub fn with_file_name(&self, name: &str) -> SandboxResult<ConfinedPath> {
        let parent = self.parent().ok_or_else(|| SandboxError::InvalidPath {
            path: self.relative.clone(),
            reason: "the sandbox root has no name".into(),
        })?;
        parent.join(name)
    }

    /// Whether `other` lies strictly below this path.
    pub fn is_ancestor_of(&self, other: &ConfinedPath) -> bool {
        other.absolute != self.absolute && other.absolute.starts_with(&self.absolute)
    }
}

impl AsRef<Path> for ConfinedPath {
    fn as_ref(&self) -> &Path {
        &self.absolute
    }
}

impl fmt::Display for ConfinedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.relative)
    }
}

/// Lexically normalize an absolute path without touching the filesystem.
fn normalize_absolute(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(p) => out.push(p.as_os_str()),
            Component::RootDir => out.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            Component::Normal(name) => out.push(name),
        }
    }
    out
}
