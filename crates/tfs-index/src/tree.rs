use std::fs::{self, Metadata};
use std::io;
use std::path::Path;

use tfs_sandbox::ConfinedPath;
use tfs_types::{system_time_to_timestamp, FileKind};
use tracing::debug;
use walkdir::WalkDir;

use crate::error::{IndexError, IndexResult};
use crate::node::{DirEntry, DirectoryNode, FileEntry};

/// Builds [`DirectoryNode`] snapshots of confined directories.
///
/// Entries are classified from `lstat`, not from their names. Symbolic links
/// are reported as file entries with `symlink` set and are never followed,
/// so a link cannot pull content from outside the sandbox into a listing.
///
/// Children are ordered by the byte-wise comparison of their names, which is
/// case-sensitive (`B` sorts before `a`) and matches the native directory
/// order of Linux filesystems.
#[derive(Debug, Clone, Copy, Default)]
pub struct TreeIndex;

impl TreeIndex {
    /// Snapshot the whole subtree under `root`.
    ///
    /// If `root` is a file, the snapshot is that single file entry.
    pub fn snapshot(root: &ConfinedPath) -> IndexResult<DirectoryNode> {
        walk(root, None)
    }

    /// Snapshot at most `depth` levels below `root`.
    ///
    /// Depth 1 is a plain directory listing. Non-empty directories at the
    /// bound are returned with `truncated` set and no children.
    pub fn snapshot_depth(root: &ConfinedPath, depth: usize) -> IndexResult<DirectoryNode> {
        walk(root, Some(depth))
    }
}

fn walk(root: &ConfinedPath, max_depth: Option<usize>) -> IndexResult<DirectoryNode> {
    let base = root.as_path();
    let meta = match fs::symlink_metadata(base) {
        Ok(meta) => meta,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(IndexError::NotFound(root.virtual_path().to_string()));
        }
        Err(e) => return Err(io_error(base, e)),
    };
    let root_name = root.file_name().unwrap_or_default().to_string();
    if !meta.is_dir() {
        let entry = file_entry(root_name, String::new(), &meta, base)?;
        return Ok(DirectoryNode::File(entry));
    }

    let mut top = dir_entry(root_name, String::new(), &meta, base)?;
    if max_depth == Some(0) {
        top.truncated = has_entries(base)?;
        return Ok(DirectoryNode::Directory(top));
    }

    // Open directories below `top`; `open[i]` sits at depth i + 1.
    let mut open: Vec<DirEntry> = Vec::new();
    let mut walker = WalkDir::new(base)
        .min_depth(1)
        .follow_links(false)
        .sort_by_file_name();
    if let Some(depth) = max_depth {
        walker = walker.max_depth(depth);
    }

    for item in walker {
        let entry = match item {
            Ok(entry) => entry,
            Err(err) => {
                if err.io_error().map(io::Error::kind) == Some(io::ErrorKind::NotFound) {
                    debug!(path = ?err.path(), "entry vanished during walk");
                    continue;
                }
                let path = err.path().unwrap_or(base).to_path_buf();
                let source = err
                    .into_io_error()
                    .unwrap_or_else(|| io::Error::new(io::ErrorKind::Other, "directory walk failed"));
                return Err(IndexError::Io { path, source });
            }
        };

        let depth = entry.depth();
        close_until(&mut top, &mut open, depth - 1);

        let meta = match entry.metadata() {
            Ok(meta) => meta,
            Err(err) => {
                let source = err
                    .into_io_error()
                    .unwrap_or_else(|| io::Error::new(io::ErrorKind::Other, "stat failed"));
                if source.kind() == io::ErrorKind::NotFound {
                    continue;
                }
                return Err(io_error(entry.path(), source));
            }
        };
        let name = entry.file_name().to_string_lossy().into_owned();
        let rel = relative_path(base, entry.path());

        if entry.file_type().is_dir() {
            let mut dir = dir_entry(name, rel, &meta, entry.path())?;
            if max_depth == Some(depth) {
                dir.truncated = has_entries(entry.path())?;
            }
            open.push(dir);
        } else {
            let file = file_entry(name, rel, &meta, entry.path())?;
            parent_of(&mut top, &mut open)
                .children
                .push(DirectoryNode::File(file));
        }
    }
    close_until(&mut top, &mut open, 0);

    debug!(root = %root, entries = top.children.len(), "snapshot complete");
    Ok(DirectoryNode::Directory(top))
}

/// Close open directories until `len` remain, attaching each to its parent.
fn close_until(top: &mut DirEntry, open: &mut Vec<DirEntry>, len: usize) {
    while open.len() > len {
        if let Some(done) = open.pop() {
            parent_of(top, open).children.push(DirectoryNode::Directory(done));
        }
    }
}

fn parent_of<'a>(top: &'a mut DirEntry, open: &'a mut [DirEntry]) -> &'a mut DirEntry {
    match open.last_mut() {
        Some(dir) => dir,
        None => top,
    }
}

fn dir_entry(name: String, path: String, meta: &Metadata, at: &Path) -> IndexResult<DirEntry> {
    Ok(DirEntry {
        name,
        path,
        modified: system_time_to_timestamp(meta.modified().map_err(|e| io_error(at, e))?),
        children: Vec::new(),
        truncated: false,
    })
}

fn file_entry(name: String, path: String, meta: &Metadata, at: &Path) -> IndexResult<FileEntry> {
    Ok(FileEntry {
        kind: FileKind::classify(&name),
        name,
        path,
        size: meta.len(),
        modified: system_time_to_timestamp(meta.modified().map_err(|e| io_error(at, e))?),
        symlink: meta.file_type().is_symlink(),
    })
}

fn has_entries(dir: &Path) -> IndexResult<bool> {
    let mut entries = fs::read_dir(dir).map_err(|e| io_error(dir, e))?;
    Ok(entries.next().is_some())
}

fn relative_path(base: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(base).unwrap_or(path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn io_error(path: &Path, source: io::Error) -> IndexError {
    IndexError::Io {
        path: path.to_path_buf(),
        source,
    }
}
