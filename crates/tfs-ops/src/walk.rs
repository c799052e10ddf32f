//! Recursive copy and removal with progress accounting.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// Where a recursive operation stopped, and how much it had done.
#[derive(Debug)]
pub(crate) struct Interrupted {
    pub completed: u64,
    pub at: PathBuf,
    pub source: io::Error,
}

/// Remove a directory and everything below it, children first.
///
/// Links are removed, never followed. Returns the number of entries removed.
pub(crate) fn remove_tree(dir: &Path) -> Result<u64, Interrupted> {
    let mut completed = 0;
    for item in WalkDir::new(dir).follow_links(false).contents_first(true) {
        let entry = item.map_err(|e| walk_failure(e, dir, completed))?;
        let path = entry.path();
        let removed = if entry.file_type().is_dir() {
            fs::remove_dir(path)
        } else {
            fs::remove_file(path)
        };
        removed.map_err(|source| Interrupted {
            completed,
            at: path.to_path_buf(),
            source,
        })?;
        completed += 1;
    }
    Ok(completed)
}

/// Copy `src` (file, link or directory tree) to `dst`, which must not exist.
///
/// Files keep their modification time and permissions. Links are recreated
/// as links. Returns the number of entries created.
pub(crate) fn copy_tree(src: &Path, dst: &Path) -> Result<u64, Interrupted> {
    let meta = fs::symlink_metadata(src).map_err(|source| Interrupted {
        completed: 0,
        at: src.to_path_buf(),
        source,
    })?;
    if meta.file_type().is_symlink() {
        copy_link(src, dst).map_err(|source| Interrupted {
            completed: 0,
            at: src.to_path_buf(),
            source,
        })?;
        return Ok(1);
    }

    let mut completed = 0;
    for item in WalkDir::new(src).follow_links(false).sort_by_file_name() {
        let entry = item.map_err(|e| walk_failure(e, src, completed))?;
        let Ok(rel) = entry.path().strip_prefix(src) else {
            continue;
        };
        // A file root yields one entry whose relative path is empty.
        let target = if rel.as_os_str().is_empty() {
            dst.to_path_buf()
        } else {
            dst.join(rel)
        };
        let file_type = entry.file_type();
        let created = if file_type.is_dir() {
            fs::create_dir(&target)
        } else if file_type.is_symlink() {
            copy_link(entry.path(), &target)
        } else {
            copy_file(entry.path(), &target)
        };
        created.map_err(|source| Interrupted {
            completed,
            at: entry.path().to_path_buf(),
            source,
        })?;
        completed += 1;
    }
    Ok(completed)
}

fn copy_file(src: &Path, dst: &Path) -> io::Result<()> {
    let mut reader = File::open(src)?;
    let meta = reader.metadata()?;
    let mut writer = File::options().write(true).create_new(true).open(dst)?;
    io::copy(&mut reader, &mut writer)?;
    if let Ok(mtime) = meta.modified() {
        writer.set_modified(mtime)?;
    }
    writer.set_permissions(meta.permissions())?;
    Ok(())
}

#[cfg(unix)]
fn copy_link(src: &Path, dst: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(fs::read_link(src)?, dst)
}

#[cfg(not(unix))]
fn copy_link(_src: &Path, _dst: &Path) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "copying symbolic links is not supported on this platform",
    ))
}

fn walk_failure(err: walkdir::Error, root: &Path, completed: u64) -> Interrupted {
    let at = err.path().unwrap_or(root).to_path_buf();
    let source = err
        .into_io_error()
        .unwrap_or_else(|| io::Error::new(io::ErrorKind::Other, "directory walk failed"));
    Interrupted {
        completed,
        at,
        source,
    }
}
