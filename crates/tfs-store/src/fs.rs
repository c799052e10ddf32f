use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tempfile::NamedTempFile;
use tfs_crypto::ContentHasher;
use tfs_types::{system_time_to_timestamp, ContentId};
use tracing::{debug, warn};

use crate::error::{StoreError, StoreResult};
use crate::object::{sort_newest_first, ObjectInfo};
use crate::reader::VerifyingReader;
use crate::traits::ContentStore;

const OBJECTS_DIR: &str = "objects";
const TMP_DIR: &str = "tmp";
const COPY_BUF: usize = 64 * 1024;

/// Filesystem-backed content store.
///
/// Layout under the store root:
///
/// ```text
/// objects/<64 hex chars>   one file per distinct payload
/// tmp/                     staging area for in-flight writes
/// ```
///
/// Writes stream into a uniquely named file in `tmp/`, are flushed to disk,
/// and are then published with a no-clobber rename. If another writer won
/// the race the staged file is discarded; the object already on disk is
/// byte-identical by construction.
#[derive(Debug, Clone)]
pub struct FsContentStore {
    root: PathBuf,
}

impl FsContentStore {
    /// Open (creating if needed) a store rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> StoreResult<Self> {
        let root = root.into();
        fs::create_dir_all(root.join(OBJECTS_DIR))?;
        fs::create_dir_all(root.join(TMP_DIR))?;
        debug!(root = %root.display(), "opened content store");
        Ok(Self { root })
    }

    /// The store root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// On-disk location of an object (whether or not it exists).
    pub fn object_path(&self, id: &ContentId) -> PathBuf {
        self.root.join(OBJECTS_DIR).join(id.to_hex())
    }

    /// The staging directory.
    ///
    /// Other writers on the same volume may stage files here before renaming
    /// them into place; [`sweep_partials`](Self::sweep_partials) reclaims
    /// whatever an interrupted writer leaves behind.
    pub fn staging_dir(&self) -> PathBuf {
        self.root.join(TMP_DIR)
    }

    /// Open an object for streaming reads. Returns the reader and the size.
    ///
    /// The reader digests what it yields and fails with
    /// `io::ErrorKind::InvalidData` at end of stream on a mismatch.
    pub fn open_object(&self, id: &ContentId) -> StoreResult<(VerifyingReader<fs::File>, u64)> {
        let file = fs::File::open(self.object_path(id)).map_err(|e| not_found_or(e, id))?;
        let size = file.metadata()?.len();
        Ok((VerifyingReader::new(file, *id), size))
    }

    /// Remove staged files left behind by interrupted writes.
    ///
    /// Only files older than `min_age` are removed so that writes still in
    /// flight keep their staging files. Returns the number removed.
    pub fn sweep_partials(&self, min_age: Duration) -> StoreResult<usize> {
        let now = SystemTime::now();
        let mut removed = 0;
        for entry in fs::read_dir(self.staging_dir())? {
            let entry = entry?;
            let meta = entry.metadata()?;
            if !meta.is_file() {
                continue;
            }
            let age = meta
                .modified()
                .ok()
                .and_then(|m| now.duration_since(m).ok())
                .unwrap_or_default();
            if age < min_age {
                continue;
            }
            match fs::remove_file(entry.path()) {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        if removed > 0 {
            warn!(removed, "swept partial writes from staging area");
        }
        Ok(removed)
    }

    /// Publish a staged file under `id`. Returns `false` if the object was
    /// already present.
    fn publish(&self, staged: NamedTempFile, id: &ContentId) -> StoreResult<bool> {
        let dest = self.object_path(id);
        match staged.persist_noclobber(&dest) {
            Ok(_) => {
                debug!(cid = %id, "published object");
                Ok(true)
            }
            Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => {
                // `e.file` drops here and the staged copy is deleted.
                debug!(cid = %id, "object already present, discarded staged copy");
                Ok(false)
            }
            Err(e) => Err(e.error.into()),
        }
    }

    fn info_from_metadata(id: ContentId, meta: &fs::Metadata) -> StoreResult<ObjectInfo> {
        Ok(ObjectInfo {
            id,
            size: meta.len(),
            modified: system_time_to_timestamp(meta.modified()?),
        })
    }
}

impl ContentStore for FsContentStore {
    fn put(&self, data: &[u8]) -> StoreResult<ContentId> {
        let id = ContentId::of(data);
        if self.object_path(&id).is_file() {
            debug!(cid = %id, "object already present");
            return Ok(id);
        }
        let mut staged = NamedTempFile::new_in(self.staging_dir())?;
        staged.write_all(data)?;
        staged.as_file().sync_all()?;
        self.publish(staged, &id)?;
        Ok(id)
    }

    fn put_reader(&self, reader: &mut dyn Read) -> StoreResult<ObjectInfo> {
        let mut staged = NamedTempFile::new_in(self.staging_dir())?;
        let mut hasher = ContentHasher::new();
        let mut buf = vec![0u8; COPY_BUF];
        loop {
            let n = match reader.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };
            hasher.update(&buf[..n]);
            staged.write_all(&buf[..n])?;
        }
        staged.as_file().sync_all()?;
        let id = hasher.finalize();
        self.publish(staged, &id)?;
        let meta = fs::metadata(self.object_path(&id))?;
        Self::info_from_metadata(id, &meta)
    }

    fn get(&self, id: &ContentId) -> StoreResult<Vec<u8>> {
        let data = fs::read(self.object_path(id)).map_err(|e| not_found_or(e, id))?;
        let computed = ContentId::of(&data);
        if computed != *id {
            warn!(cid = %id, computed = %computed, "stored object failed digest check");
            return Err(StoreError::Corrupt { id: *id, computed });
        }
        Ok(data)
    }

    fn stat(&self, id: &ContentId) -> StoreResult<Option<ObjectInfo>> {
        match fs::metadata(self.object_path(id)) {
            Ok(meta) => Ok(Some(Self::info_from_metadata(*id, &meta)?)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn delete(&self, id: &ContentId) -> StoreResult<bool> {
        match fs::remove_file(self.object_path(id)) {
            Ok(()) => {
                debug!(cid = %id, "deleted object");
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn list(&self) -> StoreResult<Vec<ObjectInfo>> {
        let mut out = Vec::new();
        for entry in fs::read_dir(self.root.join(OBJECTS_DIR))? {
            let entry = entry?;
            let name = entry.file_name();
            let Some(id) = name.to_str().and_then(|s| s.parse::<ContentId>().ok()) else {
                debug!(name = ?name, "skipping foreign entry in objects directory");
                continue;
            };
            let meta = match entry.metadata() {
                Ok(meta) => meta,
                // Deleted between read_dir and stat.
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };
            if meta.is_file() {
                out.push(Self::info_from_metadata(id, &meta)?);
            }
        }
        sort_newest_first(&mut out);
        Ok(out)
    }
}

fn not_found_or(e: io::Error, id: &ContentId) -> StoreError {
    if e.kind() == io::ErrorKind::NotFound {
        StoreError::NotFound(*id)
    } else {
        StoreError::Io(e)
    }
}
