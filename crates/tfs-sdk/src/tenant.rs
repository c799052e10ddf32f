use std::fs::{self, File};
use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;

use tempfile::NamedTempFile;
use tfs_index::{DirectoryNode, TreeIndex};
use tfs_ops::{FileOps, OpsError};
use tfs_sandbox::{sanitize_filename, ConfinedPath, PathSandbox, SandboxRoot};
use tfs_share::{ShareTarget, ShareToken};
use tfs_types::{mime_for, system_time_to_timestamp, ContentId, FileKind};
use tracing::debug;

use crate::config::ConflictPolicy;
use crate::error::{SdkError, SdkResult};
use crate::record::{Download, FileRecord, Locator, Page, PageRequest};
use crate::store::Shared;

/// One tenant's view of the store.
///
/// All methods take virtual paths exactly as a client sent them. Resolution
/// through the tenant sandbox happens here, never in the caller.
#[derive(Debug, Clone)]
pub struct TenantStore {
    id: String,
    ops: FileOps,
    shared: Arc<Shared>,
}

impl TenantStore {
    pub(crate) fn new(id: String, root: SandboxRoot, shared: Arc<Shared>) -> Self {
        Self {
            id,
            ops: FileOps::new(PathSandbox::new(root)),
            shared,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn root(&self) -> &SandboxRoot {
        self.ops.sandbox().root()
    }

    fn resolve(&self, virtual_path: &str) -> SdkResult<ConfinedPath> {
        Ok(self.ops.sandbox().resolve(virtual_path)?)
    }

    /// Resolve, then sanitize the final component.
    fn resolve_sanitized(&self, virtual_path: &str) -> SdkResult<ConfinedPath> {
        let path = self.resolve(virtual_path)?;
        let Some(raw) = path.file_name() else {
            return Ok(path);
        };
        let clean = sanitize_filename(raw);
        if clean == raw {
            Ok(path)
        } else {
            Ok(path.with_file_name(&clean)?)
        }
    }

    // -----------------------------------------------------------------------
    // Uploads and downloads
    // -----------------------------------------------------------------------

    /// Store `bytes` at `dest` (`"dir/name.ext"`).
    ///
    /// The file name is sanitized and checked against the allow-list; the
    /// directory must already exist. An occupied name is handled per the
    /// configured [`ConflictPolicy`]. The file appears atomically.
    pub fn upload(&self, bytes: &[u8], dest: &str) -> SdkResult<FileRecord> {
        let target = self.resolve_sanitized(dest)?;
        let (Some(name), Some(dir)) = (target.file_name(), target.parent()) else {
            return Err(SdkError::InvalidPath {
                path: dest.to_string(),
                reason: "upload target must name a file".into(),
            });
        };
        let kind = FileKind::classify(name);
        if !self.shared.config.accepts(kind) {
            debug!(tenant = %self.id, name, %kind, "rejected upload by type");
            return Err(SdkError::Unsupported {
                name: name.to_string(),
                kind,
            });
        }
        self.shared.check_size(bytes.len() as u64)?;
        self.require_dir(&dir)?;

        let dest = match self.shared.config.on_conflict {
            ConflictPolicy::Reject => target.clone(),
            ConflictPolicy::Rename => self.ops.unique_name(&dir, name)?,
        };
        self.ops.sandbox().recheck(&dest)?;

        let mut staged = NamedTempFile::new_in(self.shared.content.staging_dir())?;
        staged.write_all(bytes)?;
        staged.as_file().sync_all()?;
        staged.persist_noclobber(dest.as_path()).map_err(|e| {
            if e.error.kind() == io::ErrorKind::AlreadyExists {
                SdkError::Ops(OpsError::AlreadyExists {
                    path: dest.to_string(),
                })
            } else {
                SdkError::Io(e.error)
            }
        })?;
        debug!(tenant = %self.id, path = %dest, size = bytes.len(), "uploaded file");
        self.record(&dest, Some(ContentId::of(bytes)))
    }

    /// Store bytes in the shared content store and return their digest.
    pub fn upload_content_addressed(&self, bytes: &[u8]) -> SdkResult<ContentId> {
        self.shared.put_content(bytes)
    }

    /// Open a tenant file or a content object for reading.
    pub fn download(&self, locator: &Locator) -> SdkResult<Download> {
        match locator {
            Locator::Path(p) => self.open_file(&self.resolve(p)?),
            Locator::Content(cid) => self.shared.download_content(cid),
        }
    }

    /// Open the target of a redeemed path token.
    pub(crate) fn open_shared(&self, virtual_path: &str) -> SdkResult<Download> {
        self.open_file(&self.resolve(virtual_path)?)
    }

    fn open_file(&self, path: &ConfinedPath) -> SdkResult<Download> {
        let meta = self.regular_file(path)?;
        self.ops.sandbox().recheck(path)?;
        let file = File::open(path.as_path())?;
        let name = path.file_name().unwrap_or_default();
        Ok(Download::new(
            name.to_string(),
            meta.len(),
            mime_for(name),
            Box::new(file),
        ))
    }

    // -----------------------------------------------------------------------
    // Listing
    // -----------------------------------------------------------------------

    /// Full snapshot of the subtree at `virtual_path`.
    pub fn list(&self, virtual_path: &str) -> SdkResult<DirectoryNode> {
        Ok(TreeIndex::snapshot(&self.resolve(virtual_path)?)?)
    }

    /// Snapshot limited to `depth` levels (1 = direct children only).
    pub fn list_depth(&self, virtual_path: &str, depth: usize) -> SdkResult<DirectoryNode> {
        Ok(TreeIndex::snapshot_depth(&self.resolve(virtual_path)?, depth)?)
    }

    /// Files of this tenant, newest first, optionally of one kind.
    pub fn recent_files(
        &self,
        filter: Option<FileKind>,
        page: PageRequest,
    ) -> SdkResult<Page<FileRecord>> {
        let tree = TreeIndex::snapshot(&self.resolve("")?)?;
        let mut records: Vec<FileRecord> = tree
            .files()
            .into_iter()
            .filter(|f| !f.symlink)
            .filter(|f| filter.map_or(true, |k| f.kind == k))
            .map(|f| FileRecord {
                path: f.path.clone(),
                name: f.name.clone(),
                size: f.size,
                modified: f.modified,
                kind: f.kind,
                mime: mime_for(&f.name).to_string(),
                digest: None,
            })
            .collect();
        records.sort_by(|a, b| {
            b.modified
                .cmp(&a.modified)
                .then_with(|| a.path.cmp(&b.path))
        });
        Ok(Page::paginate(records, page))
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    /// Create one directory; its parent must exist. Returns the new path.
    pub fn mkdir(&self, virtual_path: &str) -> SdkResult<String> {
        let path = self.resolve_sanitized(virtual_path)?;
        self.ops.make_directory(&path)?;
        Ok(path.virtual_path().to_string())
    }

    /// Delete a file or directory tree. Returns the number of entries removed.
    pub fn delete(&self, virtual_path: &str) -> SdkResult<u64> {
        Ok(self.ops.delete(&self.resolve(virtual_path)?)?)
    }

    /// Rename within the same directory. Returns the new path.
    pub fn rename(&self, virtual_path: &str, new_name: &str) -> SdkResult<String> {
        let src = self.resolve(virtual_path)?;
        let renamed = self.ops.rename(&src, &sanitize_filename(new_name))?;
        Ok(renamed.virtual_path().to_string())
    }

    /// Move to a new path, creating missing parent directories.
    pub fn move_to(&self, src: &str, dst: &str) -> SdkResult<()> {
        let src = self.resolve(src)?;
        let dst = self.resolve_sanitized(dst)?;
        Ok(self.ops.move_to(&src, &dst)?)
    }

    /// Copy a file or tree. Returns the number of entries created.
    pub fn copy(&self, src: &str, dst: &str) -> SdkResult<u64> {
        let src = self.resolve(src)?;
        let dst = self.resolve_sanitized(dst)?;
        Ok(self.ops.copy(&src, &dst)?)
    }

    // -----------------------------------------------------------------------
    // Sharing
    // -----------------------------------------------------------------------

    /// Issue a read token for a regular file. `None` uses the configured
    /// lifetime.
    pub fn issue_share_token(&self, virtual_path: &str, ttl: Option<Duration>) -> SdkResult<ShareToken> {
        let path = self.resolve(virtual_path)?;
        self.regular_file(&path)?;
        let target = ShareTarget::Path {
            tenant: self.id.clone(),
            path: path.virtual_path().to_string(),
        };
        Ok(self.shared.codec.issue(target, self.shared.ttl_or_default(ttl))?)
    }

    // -----------------------------------------------------------------------
    // Text editing
    // -----------------------------------------------------------------------

    /// Read a text file.
    pub fn read_text(&self, virtual_path: &str) -> SdkResult<String> {
        let path = self.resolve(virtual_path)?;
        self.require_text(&path)?;
        self.regular_file(&path)?;
        let bytes = fs::read(path.as_path())?;
        String::from_utf8(bytes).map_err(|_| SdkError::NotText(path.to_string()))
    }

    /// Atomically replace the contents of an existing text file.
    ///
    /// This is the one operation that overwrites: the caller names the file
    /// explicitly and it must already exist.
    pub fn write_text(&self, virtual_path: &str, content: &str) -> SdkResult<FileRecord> {
        let path = self.resolve(virtual_path)?;
        self.require_text(&path)?;
        let meta = self.regular_file(&path)?;
        self.shared.check_size(content.len() as u64)?;
        self.ops.sandbox().recheck(&path)?;

        let mut staged = NamedTempFile::new_in(self.shared.content.staging_dir())?;
        staged.write_all(content.as_bytes())?;
        staged.as_file().sync_all()?;
        staged.as_file().set_permissions(meta.permissions())?;
        staged.persist(path.as_path()).map_err(|e| SdkError::Io(e.error))?;
        debug!(tenant = %self.id, path = %path, size = content.len(), "rewrote text file");
        self.record(&path, Some(ContentId::of(content.as_bytes())))
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    /// `lstat` that must find a regular file (links are not followed).
    fn regular_file(&self, path: &ConfinedPath) -> SdkResult<fs::Metadata> {
        let meta = match fs::symlink_metadata(path.as_path()) {
            Ok(meta) => meta,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(SdkError::NotFound(path.to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        if !meta.is_file() {
            return Err(SdkError::NotAFile(path.to_string()));
        }
        Ok(meta)
    }

    fn require_dir(&self, dir: &ConfinedPath) -> SdkResult<()> {
        match fs::metadata(dir.as_path()) {
            Ok(meta) if meta.is_dir() => Ok(()),
            Ok(_) => Err(SdkError::InvalidPath {
                path: dir.to_string(),
                reason: "not a directory".into(),
            }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(SdkError::NotFound(dir.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn require_text(&self, path: &ConfinedPath) -> SdkResult<()> {
        let name = path.file_name().unwrap_or_default();
        if FileKind::classify(name) != FileKind::Text {
            return Err(SdkError::NotText(path.to_string()));
        }
        Ok(())
    }

    fn record(&self, path: &ConfinedPath, digest: Option<ContentId>) -> SdkResult<FileRecord> {
        let meta = fs::symlink_metadata(path.as_path())?;
        let name = path.file_name().unwrap_or_default().to_string();
        Ok(FileRecord {
            path: path.virtual_path().to_string(),
            kind: FileKind::classify(&name),
            mime: mime_for(&name).to_string(),
            size: meta.len(),
            modified: system_time_to_timestamp(meta.modified()?),
            name,
            digest,
        })
    }
}
