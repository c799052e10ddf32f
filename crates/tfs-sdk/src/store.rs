use std::fs;
use std::io;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tfs_sandbox::{SandboxError, SandboxRoot};
use tfs_share::{ShareTarget, ShareToken, ShareTokenCodec};
use tfs_store::{ContentStore, FsContentStore};
use tfs_types::{unix_now, ContentId};
use tracing::{debug, info};

use crate::config::StoreConfig;
use crate::error::{SdkError, SdkResult};
use crate::record::Download;
use crate::tenant::TenantStore;

const TENANTS_DIR: &str = "tenants";
const CAS_DIR: &str = "cas";
const MAX_TENANT_ID_LEN: usize = 64;
const OCTET_STREAM: &str = "application/octet-stream";

/// State shared by the store and every tenant handle.
#[derive(Debug)]
pub(crate) struct Shared {
    pub(crate) config: Arc<StoreConfig>,
    pub(crate) content: FsContentStore,
    pub(crate) codec: ShareTokenCodec,
}

impl Shared {
    pub(crate) fn check_size(&self, size: u64) -> SdkResult<()> {
        let limit = self.config.max_upload_bytes;
        if size > limit {
            return Err(SdkError::TooLarge { size, limit });
        }
        Ok(())
    }

    pub(crate) fn put_content(&self, bytes: &[u8]) -> SdkResult<ContentId> {
        self.check_size(bytes.len() as u64)?;
        Ok(self.content.put(bytes)?)
    }

    pub(crate) fn download_content(&self, cid: &ContentId) -> SdkResult<Download> {
        let (reader, size) = self.content.open_object(cid)?;
        Ok(Download::new(cid.to_hex(), size, OCTET_STREAM, Box::new(reader)))
    }

    pub(crate) fn ttl_or_default(&self, ttl: Option<Duration>) -> Duration {
        ttl.unwrap_or_else(|| self.codec.default_ttl())
    }
}

/// Multi-tenant sandboxed content store.
///
/// Configuration is fixed at [`Store::open`] and shared read-only with every
/// [`TenantStore`] handed out by [`Store::tenant`]. The store is `Send +
/// Sync`; handles are cheap to create per request.
#[derive(Debug)]
pub struct Store {
    shared: Arc<Shared>,
    tenants: SandboxRoot,
}

impl Store {
    /// Validate `config`, create the data layout and open the store.
    pub fn open(config: StoreConfig) -> SdkResult<Self> {
        config.validate()?;
        let tenants = SandboxRoot::create(config.data_root.join(TENANTS_DIR))?;
        let content = FsContentStore::open(config.data_root.join(CAS_DIR))?;
        let codec = ShareTokenCodec::from_secret(config.share_secret.as_bytes())?
            .with_default_ttl(config.share_ttl());
        info!(data_root = %config.data_root.display(), "opened store");
        Ok(Self {
            shared: Arc::new(Shared {
                config: Arc::new(config),
                content,
                codec,
            }),
            tenants,
        })
    }

    pub fn config(&self) -> &StoreConfig {
        &self.shared.config
    }

    /// The shared content-addressed object store.
    pub fn content(&self) -> &FsContentStore {
        &self.shared.content
    }

    /// Handle for one tenant, creating its root directory on first use.
    ///
    /// Tenant ids are 1 to 64 characters from `[A-Za-z0-9_-]`.
    pub fn tenant(&self, id: &str) -> SdkResult<TenantStore> {
        validate_tenant_id(id)?;
        let dir = self.tenants.as_path().join(id);
        match fs::create_dir(&dir) {
            Ok(()) => info!(tenant = id, "provisioned tenant root"),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {}
            Err(e) => return Err(e.into()),
        }
        self.bind_tenant(id, &dir)
    }

    /// Handle for a tenant that already exists. Never creates anything.
    pub fn existing_tenant(&self, id: &str) -> SdkResult<TenantStore> {
        validate_tenant_id(id)?;
        let dir = self.tenants.as_path().join(id);
        match fs::symlink_metadata(&dir) {
            Ok(meta) if meta.is_dir() => self.bind_tenant(id, &dir),
            Ok(_) => Err(SdkError::NotFound(format!("tenant {id}"))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(SdkError::NotFound(format!("tenant {id}")))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn bind_tenant(&self, id: &str, dir: &Path) -> SdkResult<TenantStore> {
        let root = SandboxRoot::create(dir)?;
        if !self.tenants.contains(root.as_path()) {
            return Err(SandboxError::PathEscape {
                path: id.to_string(),
            }
            .into());
        }
        debug!(tenant = id, "opened tenant");
        Ok(TenantStore::new(id.to_string(), root, Arc::clone(&self.shared)))
    }

    /// Store bytes in the content store and return their digest.
    pub fn upload_content_addressed(&self, bytes: &[u8]) -> SdkResult<ContentId> {
        self.shared.put_content(bytes)
    }

    /// Stream a content object. The digest is checked as the stream is read;
    /// a corrupt object fails with `InvalidData` at end of stream.
    pub fn download_content(&self, cid: &ContentId) -> SdkResult<Download> {
        self.shared.download_content(cid)
    }

    /// Issue a share token for a content object. The object must exist.
    pub fn issue_content_token(&self, cid: ContentId, ttl: Option<Duration>) -> SdkResult<ShareToken> {
        if !self.shared.content.exists(&cid)? {
            return Err(SdkError::NotFound(format!("cid:{cid}")));
        }
        let ttl = self.shared.ttl_or_default(ttl);
        Ok(self.shared.codec.issue(ShareTarget::Content { cid }, ttl)?)
    }

    /// Redeem a share token and open its target.
    ///
    /// Fails with `Tampered` for a bad signature, `Expired` for a correctly
    /// signed token past its deadline, and `NotFound` when the target is
    /// gone (or, for path tokens, is no longer a regular file).
    pub fn redeem_share_token(&self, token: &str) -> SdkResult<Download> {
        self.redeem_share_token_at(token, unix_now())
    }

    /// [`redeem_share_token`](Self::redeem_share_token) at a given UNIX time.
    pub fn redeem_share_token_at(&self, token: &str, now: u64) -> SdkResult<Download> {
        let claims = self.shared.codec.redeem_at(token, now)?;
        match claims.target {
            ShareTarget::Path { tenant, path } => {
                self.existing_tenant(&tenant)?.open_shared(&path)
            }
            ShareTarget::Content { cid } => self.shared.download_content(&cid),
        }
    }
}

fn validate_tenant_id(id: &str) -> SdkResult<()> {
    let invalid = |reason: &str| SdkError::InvalidTenant {
        tenant: id.to_string(),
        reason: reason.to_string(),
    };
    if id.is_empty() || id.len() > MAX_TENANT_ID_LEN {
        return Err(invalid("must be 1 to 64 characters"));
    }
    if !id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(invalid("only letters, digits, '-' and '_' are allowed"));
    }
    Ok(())
}
