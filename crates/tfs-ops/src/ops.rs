use std::fs;
use std::io;
use std::path::Path;

use tfs_sandbox::{validate_component, ConfinedPath, PathSandbox};
use tracing::{debug, warn};

use crate::error::{OpsError, OpsResult};
use crate::naming;
use crate::walk::{self, Interrupted};

/// Create/delete/rename/move/copy inside one sandbox.
///
/// Mutations are not serialized against each other. Two operations racing
/// on the same source both go to the filesystem and the loser sees
/// [`OpsError::NotFound`]. Every destructive step re-validates its paths
/// through [`PathSandbox::recheck`] immediately before acting.
#[derive(Clone, Debug)]
pub struct FileOps {
    sandbox: PathSandbox,
}

impl FileOps {
    pub fn new(sandbox: PathSandbox) -> Self {
        Self { sandbox }
    }

    pub fn sandbox(&self) -> &PathSandbox {
        &self.sandbox
    }

    // -----------------------------------------------------------------------
    // Single-entry operations
    // -----------------------------------------------------------------------

    /// Create exactly one directory. The parent must already exist.
    pub fn make_directory(&self, path: &ConfinedPath) -> OpsResult<()> {
        if self.sandbox.is_root(path) || naming::occupied(path) {
            return Err(OpsError::AlreadyExists {
                path: path.to_string(),
            });
        }
        self.sandbox.recheck(path)?;
        fs::create_dir(path.as_path()).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => OpsError::NotFound {
                path: parent_display(path),
            },
            _ => OpsError::from_io(path.to_string(), e),
        })?;
        debug!(path = %path, "created directory");
        Ok(())
    }

    /// Delete a file, link or directory tree. Returns the number of entries
    /// removed.
    ///
    /// The sandbox root can never be deleted. A failure partway through a
    /// directory tree leaves the rest of the tree in place and is reported
    /// as [`OpsError::Partial`].
    pub fn delete(&self, path: &ConfinedPath) -> OpsResult<u64> {
        if self.sandbox.is_root(path) {
            warn!(path = %path, "refused to delete sandbox root");
            return Err(OpsError::RootDeletionForbidden);
        }
        let meta = self.lstat(path)?;

        self.sandbox.recheck(path)?;
        if self.sandbox.is_root(path) {
            return Err(OpsError::RootDeletionForbidden);
        }

        let removed = if meta.is_dir() {
            walk::remove_tree(path.as_path()).map_err(|i| self.interrupted("delete", i, path))?
        } else {
            fs::remove_file(path.as_path()).map_err(|e| OpsError::from_io(path.to_string(), e))?;
            1
        };
        debug!(path = %path, removed, "deleted");
        Ok(removed)
    }

    /// Rename `src` within its directory. Returns the new path.
    pub fn rename(&self, src: &ConfinedPath, new_name: &str) -> OpsResult<ConfinedPath> {
        validate_component(new_name)?;
        let dst = src.with_file_name(new_name)?;
        self.lstat(src)?;
        if naming::occupied(&dst) {
            return Err(OpsError::AlreadyExists {
                path: dst.to_string(),
            });
        }
        self.sandbox.recheck(src)?;
        self.sandbox.recheck(&dst)?;
        fs::rename(src.as_path(), dst.as_path())
            .map_err(|e| OpsError::from_io(src.to_string(), e))?;
        debug!(from = %src, to = %dst, "renamed");
        Ok(dst)
    }

    /// Move `src` to `dst`, creating missing parents of `dst`.
    ///
    /// Uses a single rename when both sides are on the same volume, and
    /// otherwise copies then deletes the source.
    pub fn move_to(&self, src: &ConfinedPath, dst: &ConfinedPath) -> OpsResult<()> {
        let meta = self.lstat(src)?;
        if self.sandbox.is_root(src) || src.is_ancestor_of(dst) {
            return Err(OpsError::InvalidTarget {
                path: dst.to_string(),
                reason: "cannot move a directory into itself".into(),
            });
        }
        if naming::occupied(dst) {
            return Err(OpsError::AlreadyExists {
                path: dst.to_string(),
            });
        }

        self.sandbox.recheck(src)?;
        self.sandbox.recheck(dst)?;
        let parent = self.ensure_parent(dst)?;

        let same_volume = same_volume(src.as_path(), &parent)
            .map_err(|e| OpsError::from_io(src.to_string(), e))?;
        if same_volume {
            fs::rename(src.as_path(), dst.as_path())
                .map_err(|e| OpsError::from_io(src.to_string(), e))?;
            debug!(from = %src, to = %dst, "moved");
            return Ok(());
        }

        self.move_across_volumes(src, dst, meta.is_dir())
    }

    /// Copy a file or directory tree to `dst`, creating missing parents.
    ///
    /// This is a plain filesystem copy: contents are duplicated, not shared
    /// with the content store. Returns the number of entries created.
    pub fn copy(&self, src: &ConfinedPath, dst: &ConfinedPath) -> OpsResult<u64> {
        let meta = self.lstat(src)?;
        if meta.is_dir() && (src == dst || src.is_ancestor_of(dst)) {
            return Err(OpsError::InvalidTarget {
                path: dst.to_string(),
                reason: "cannot copy a directory into itself".into(),
            });
        }
        if naming::occupied(dst) {
            return Err(OpsError::AlreadyExists {
                path: dst.to_string(),
            });
        }
        self.sandbox.recheck(src)?;
        self.sandbox.recheck(dst)?;
        self.ensure_parent(dst)?;

        let copied = walk::copy_tree(src.as_path(), dst.as_path())
            .map_err(|i| self.interrupted("copy", i, src))?;
        debug!(from = %src, to = %dst, copied, "copied");
        Ok(copied)
    }

    /// First free name in `dir` among `name`, `stem(1).ext`, ... up to
    /// [`MAX_NAME_ATTEMPTS`](crate::MAX_NAME_ATTEMPTS) suffixes.
    ///
    /// Fails with [`OpsError::Exhausted`] instead of looping further. The
    /// result is only a candidate; a concurrent writer may still take it.
    pub fn unique_name(&self, dir: &ConfinedPath, name: &str) -> OpsResult<ConfinedPath> {
        naming::first_free(dir, name)
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn lstat(&self, path: &ConfinedPath) -> OpsResult<fs::Metadata> {
        fs::symlink_metadata(path.as_path()).map_err(|e| OpsError::from_io(path.to_string(), e))
    }

    /// Create the parent directories of `path`. Returns the parent.
    fn ensure_parent(&self, path: &ConfinedPath) -> OpsResult<std::path::PathBuf> {
        let parent = path
            .as_path()
            .parent()
            .unwrap_or(self.sandbox.root().as_path())
            .to_path_buf();
        fs::create_dir_all(&parent).map_err(|e| OpsError::Io {
            path: parent_display(path),
            source: e,
        })?;
        Ok(parent)
    }

    /// Copy then delete, for a source and destination on different devices.
    fn move_across_volumes(
        &self,
        src: &ConfinedPath,
        dst: &ConfinedPath,
        is_dir: bool,
    ) -> OpsResult<()> {
        let copied = walk::copy_tree(src.as_path(), dst.as_path())
            .map_err(|i| self.interrupted("move", i, src))?;
        let removal = if is_dir {
            walk::remove_tree(src.as_path()).map_err(|i| Interrupted {
                completed: copied + i.completed,
                ..i
            })
        } else {
            fs::remove_file(src.as_path())
                .map(|()| 1)
                .map_err(|source| Interrupted {
                    completed: copied,
                    at: src.as_path().to_path_buf(),
                    source,
                })
        };
        let removed = removal.map_err(|i| self.interrupted("move", i, src))?;
        debug!(from = %src, to = %dst, copied, removed, "moved across volumes");
        Ok(())
    }

    fn interrupted(&self, op: &'static str, i: Interrupted, origin: &ConfinedPath) -> OpsError {
        let failed_at = self.virtual_display(&i.at);
        if i.completed == 0 {
            return OpsError::from_io(failed_at, i.source);
        }
        warn!(
            op,
            path = %origin,
            completed = i.completed,
            failed_at = %failed_at,
            error = %i.source,
            "recursive operation stopped partway"
        );
        OpsError::Partial {
            op,
            completed: i.completed,
            failed_at,
            source: i.source,
        }
    }

    fn virtual_display(&self, abs: &Path) -> String {
        match abs.strip_prefix(self.sandbox.root().as_path()) {
            Ok(rel) => format!("/{}", rel.to_string_lossy().replace('\\', "/")),
            Err(_) => abs.display().to_string(),
        }
    }
}

fn parent_display(path: &ConfinedPath) -> String {
    path.parent()
        .map(|p| p.to_string())
        .unwrap_or_else(|| "/".to_string())
}

#[cfg(unix)]
fn same_volume(src: &Path, dst_dir: &Path) -> io::Result<bool> {
    use std::os::unix::fs::MetadataExt;
    Ok(fs::symlink_metadata(src)?.dev() == fs::metadata(dst_dir)?.dev())
}

#[cfg(not(unix))]
fn same_volume(_src: &Path, _dst_dir: &Path) -> io::Result<bool> {
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MAX_NAME_ATTEMPTS;
    use tfs_sandbox::SandboxRoot;
    use tfs_types::ErrorKind;

    fn setup() -> (tempfile::TempDir, FileOps) {
        let dir = tempfile::tempdir().unwrap();
        let root = SandboxRoot::create(dir.path().join("store/u1")).unwrap();
        (dir, FileOps::new(PathSandbox::new(root)))
    }

    fn at(ops: &FileOps, p: &str) -> ConfinedPath {
        ops.sandbox().resolve(p).unwrap()
    }

    fn write(ops: &FileOps, p: &str, data: &[u8]) {
        let path = at(ops, p);
        fs::create_dir_all(path.as_path().parent().unwrap()).unwrap();
        fs::write(path.as_path(), data).unwrap();
    }

    fn entries(ops: &FileOps, p: &str) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(at(ops, p).as_path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    // -----------------------------------------------------------------------
    // make_directory
    // -----------------------------------------------------------------------

    #[test]
    fn mkdir_rename_scenario() {
        let (_dir, ops) = setup();
        ops.make_directory(&at(&ops, "a")).unwrap();
        let err = ops.make_directory(&at(&ops, "a")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyExists);

        let renamed = ops.rename(&at(&ops, "a"), "b").unwrap();
        assert_eq!(renamed.virtual_path(), "b");
        assert_eq!(entries(&ops, ""), ["b"]);
        assert!(at(&ops, "b").as_path().is_dir());
    }

    #[test]
    fn mkdir_is_not_recursive() {
        let (_dir, ops) = setup();
        let err = ops.make_directory(&at(&ops, "x/y")).unwrap_err();
        assert!(matches!(err, OpsError::NotFound { ref path } if path == "/x"));
        assert!(!at(&ops, "x").as_path().exists());
    }

    #[test]
    fn mkdir_over_file_or_root_fails() {
        let (_dir, ops) = setup();
        write(&ops, "f.txt", b"x");
        assert_eq!(
            ops.make_directory(&at(&ops, "f.txt")).unwrap_err().kind(),
            ErrorKind::AlreadyExists
        );
        assert_eq!(
            ops.make_directory(&at(&ops, "")).unwrap_err().kind(),
            ErrorKind::AlreadyExists
        );
    }

    // -----------------------------------------------------------------------
    // delete
    // -----------------------------------------------------------------------

    #[test]
    fn delete_root_is_forbidden() {
        let (_dir, ops) = setup();
        write(&ops, "keep.txt", b"x");
        for root in ["", "/", ".", "a/.."] {
            assert!(matches!(
                ops.delete(&at(&ops, root)),
                Err(OpsError::RootDeletionForbidden)
            ));
        }
        assert!(at(&ops, "keep.txt").as_path().exists());
    }

    #[test]
    fn delete_missing_is_not_found() {
        let (_dir, ops) = setup();
        assert_eq!(
            ops.delete(&at(&ops, "ghost")).unwrap_err().kind(),
            ErrorKind::NotFound
        );
    }

    #[test]
    fn delete_file_and_tree() {
        let (_dir, ops) = setup();
        write(&ops, "one.txt", b"1");
        write(&ops, "tree/a/b.txt", b"2");
        write(&ops, "tree/c.txt", b"3");
        assert_eq!(ops.delete(&at(&ops, "one.txt")).unwrap(), 1);
        assert_eq!(ops.delete(&at(&ops, "tree")).unwrap(), 4);
        assert!(entries(&ops, "").is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn delete_link_leaves_target() {
        let outside = tempfile::tempdir().unwrap();
        fs::write(outside.path().join("precious"), b"x").unwrap();
        let (_dir, ops) = setup();
        let link = at(&ops, "link");
        std::os::unix::fs::symlink(outside.path(), link.as_path()).unwrap();
        assert_eq!(ops.delete(&link).unwrap(), 1);
        assert!(outside.path().join("precious").exists());
    }

    #[test]
    fn partial_failures_are_aggregated() {
        let (_dir, ops) = setup();
        let origin = at(&ops, "tree");
        let err = ops.interrupted(
            "delete",
            Interrupted {
                completed: 3,
                at: at(&ops, "tree/locked/f").as_path().to_path_buf(),
                source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
            },
            &origin,
        );
        match err {
            OpsError::Partial {
                op,
                completed,
                ref failed_at,
                ..
            } => {
                assert_eq!(op, "delete");
                assert_eq!(completed, 3);
                assert_eq!(failed_at, "/tree/locked/f");
            }
            other => panic!("expected Partial, got {other:?}"),
        }

        let untouched = ops.interrupted(
            "delete",
            Interrupted {
                completed: 0,
                at: origin.as_path().to_path_buf(),
                source: io::Error::new(io::ErrorKind::NotFound, "gone"),
            },
            &origin,
        );
        assert_eq!(untouched.kind(), ErrorKind::NotFound);
    }

    // -----------------------------------------------------------------------
    // rename
    // -----------------------------------------------------------------------

    #[test]
    fn rename_conflicts_and_races() {
        let (_dir, ops) = setup();
        write(&ops, "d/a.txt", b"a");
        write(&ops, "d/b.txt", b"b");
        assert_eq!(
            ops.rename(&at(&ops, "d/a.txt"), "b.txt").unwrap_err().kind(),
            ErrorKind::AlreadyExists
        );
        ops.rename(&at(&ops, "d/a.txt"), "c.txt").unwrap();
        // The loser of a race on the same source sees NotFound.
        assert_eq!(
            ops.rename(&at(&ops, "d/a.txt"), "e.txt").unwrap_err().kind(),
            ErrorKind::NotFound
        );
        assert_eq!(entries(&ops, "d"), ["b.txt", "c.txt"]);
    }

    #[test]
    fn rename_rejects_path_like_names() {
        let (_dir, ops) = setup();
        write(&ops, "a.txt", b"a");
        for bad in ["../x", "x/y", "..", ""] {
            assert_eq!(
                ops.rename(&at(&ops, "a.txt"), bad).unwrap_err().kind(),
                ErrorKind::InvalidInput
            );
        }
        assert_eq!(
            ops.rename(&at(&ops, ""), "x").unwrap_err().kind(),
            ErrorKind::InvalidInput
        );
    }

    // -----------------------------------------------------------------------
    // move_to
    // -----------------------------------------------------------------------

    #[test]
    fn move_creates_parents() {
        let (_dir, ops) = setup();
        write(&ops, "src/f.txt", b"payload");
        ops.move_to(&at(&ops, "src"), &at(&ops, "deep/er/dst")).unwrap();
        assert!(!at(&ops, "src").as_path().exists());
        assert_eq!(
            fs::read(at(&ops, "deep/er/dst/f.txt").as_path()).unwrap(),
            b"payload"
        );
    }

    #[test]
    fn move_never_overwrites() {
        let (_dir, ops) = setup();
        write(&ops, "a.txt", b"a");
        write(&ops, "b.txt", b"b");
        assert_eq!(
            ops.move_to(&at(&ops, "a.txt"), &at(&ops, "b.txt"))
                .unwrap_err()
                .kind(),
            ErrorKind::AlreadyExists
        );
        assert_eq!(fs::read(at(&ops, "b.txt").as_path()).unwrap(), b"b");
    }

    #[test]
    fn move_into_own_subtree_is_rejected() {
        let (_dir, ops) = setup();
        write(&ops, "a/f.txt", b"x");
        let err = ops.move_to(&at(&ops, "a"), &at(&ops, "a/b/c")).unwrap_err();
        assert!(matches!(err, OpsError::InvalidTarget { .. }));
        let err = ops.move_to(&at(&ops, ""), &at(&ops, "x")).unwrap_err();
        assert!(matches!(err, OpsError::InvalidTarget { .. }));
    }

    #[test]
    fn move_missing_source() {
        let (_dir, ops) = setup();
        assert_eq!(
            ops.move_to(&at(&ops, "nope"), &at(&ops, "x")).unwrap_err().kind(),
            ErrorKind::NotFound
        );
    }

    #[test]
    fn cross_volume_fallback_moves_a_file() {
        let (_dir, ops) = setup();
        write(&ops, "a.txt", b"payload");
        let (src, dst) = (at(&ops, "a.txt"), at(&ops, "moved.txt"));
        ops.move_across_volumes(&src, &dst, false).unwrap();
        assert!(!src.as_path().exists());
        assert_eq!(fs::read(dst.as_path()).unwrap(), b"payload");
    }

    #[test]
    fn cross_volume_fallback_moves_a_tree() {
        let (_dir, ops) = setup();
        write(&ops, "tree/a.txt", b"a");
        write(&ops, "tree/sub/b.txt", b"b");
        let (src, dst) = (at(&ops, "tree"), at(&ops, "elsewhere"));
        ops.move_across_volumes(&src, &dst, true).unwrap();
        assert!(!src.as_path().exists());
        assert_eq!(fs::read(at(&ops, "elsewhere/sub/b.txt").as_path()).unwrap(), b"b");
        assert_eq!(entries(&ops, ""), ["elsewhere"]);
    }

    // -----------------------------------------------------------------------
    // copy
    // -----------------------------------------------------------------------

    #[cfg(unix)]
    #[test]
    fn copy_stopped_by_unreadable_entry_is_partial() {
        let (_dir, ops) = setup();
        write(&ops, "src/a.txt", b"a");
        // Opening a socket for reading fails, so the walk stops there.
        let _listener =
            std::os::unix::net::UnixListener::bind(at(&ops, "src/sock").as_path()).unwrap();

        let err = ops.copy(&at(&ops, "src"), &at(&ops, "dst")).unwrap_err();
        match err {
            OpsError::Partial {
                op,
                completed,
                ref failed_at,
                ..
            } => {
                assert_eq!(op, "copy");
                assert_eq!(completed, 2);
                assert_eq!(failed_at, "/src/sock");
            }
            ref other => panic!("expected Partial, got {other:?}"),
        }
        assert_eq!(err.kind(), ErrorKind::Partial);
        assert_eq!(fs::read(at(&ops, "dst/a.txt").as_path()).unwrap(), b"a");
    }

    #[test]
    fn copy_file_and_tree() {
        let (_dir, ops) = setup();
        write(&ops, "src/a.txt", b"a");
        write(&ops, "src/sub/b.txt", b"b");
        assert_eq!(ops.copy(&at(&ops, "src/a.txt"), &at(&ops, "out/a2.txt")).unwrap(), 1);
        assert_eq!(ops.copy(&at(&ops, "src"), &at(&ops, "clone")).unwrap(), 4);
        assert_eq!(fs::read(at(&ops, "clone/sub/b.txt").as_path()).unwrap(), b"b");
        assert_eq!(fs::read(at(&ops, "out/a2.txt").as_path()).unwrap(), b"a");
        assert!(at(&ops, "src/sub/b.txt").as_path().exists());
    }

    #[test]
    fn copy_conflicts() {
        let (_dir, ops) = setup();
        write(&ops, "d/a.txt", b"a");
        write(&ops, "b.txt", b"b");
        assert_eq!(
            ops.copy(&at(&ops, "d/a.txt"), &at(&ops, "b.txt")).unwrap_err().kind(),
            ErrorKind::AlreadyExists
        );
        assert!(matches!(
            ops.copy(&at(&ops, "d"), &at(&ops, "d/inner")),
            Err(OpsError::InvalidTarget { .. })
        ));
        assert_eq!(
            ops.copy(&at(&ops, "missing"), &at(&ops, "x")).unwrap_err().kind(),
            ErrorKind::NotFound
        );
    }

    // -----------------------------------------------------------------------
    // unique_name
    // -----------------------------------------------------------------------

    #[test]
    fn unique_name_suffixes() {
        let (_dir, ops) = setup();
        let root = at(&ops, "");
        assert_eq!(ops.unique_name(&root, "photo.jpg").unwrap().virtual_path(), "photo.jpg");
        write(&ops, "photo.jpg", b"1");
        assert_eq!(
            ops.unique_name(&root, "photo.jpg").unwrap().virtual_path(),
            "photo(1).jpg"
        );
        write(&ops, "photo(1).jpg", b"2");
        assert_eq!(
            ops.unique_name(&root, "photo.jpg").unwrap().virtual_path(),
            "photo(2).jpg"
        );
    }

    #[test]
    fn unique_name_is_bounded() {
        let (_dir, ops) = setup();
        write(&ops, "n", b"");
        for i in 1..=MAX_NAME_ATTEMPTS {
            write(&ops, &format!("n({i})"), b"");
        }
        let err = ops.unique_name(&at(&ops, ""), "n").unwrap_err();
        assert!(matches!(
            err,
            OpsError::Exhausted { attempts, .. } if attempts == MAX_NAME_ATTEMPTS
        ));
        assert_eq!(err.kind(), ErrorKind::Exhausted);
    }
}
