use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tfs_types::FileKind;

use crate::error::{SdkError, SdkResult};

/// What an upload does when its target name is taken.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictPolicy {
    /// Fail with `AlreadyExists`.
    #[default]
    Reject,
    /// Store under the first free `name(n).ext`.
    Rename,
}

/// Store configuration. Built once, validated, then shared read-only.
///
/// ```toml
/// data_root = "/var/lib/tenantfs"
/// share_secret = "change me"
/// share_ttl_secs = 2592000
/// max_upload_bytes = 104857600
/// allowed_kinds = ["image", "video"]
/// on_conflict = "rename"
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    pub data_root: PathBuf,
    pub share_secret: String,
    pub share_ttl_secs: u64,
    pub max_upload_bytes: u64,
    /// Kinds accepted for upload. `None` accepts everything except
    /// [`FileKind::Disallowed`].
    pub allowed_kinds: Option<Vec<FileKind>>,
    pub on_conflict: ConflictPolicy,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_root: PathBuf::from("data"),
            share_secret: String::new(),
            share_ttl_secs: Self::DEFAULT_SHARE_TTL_SECS,
            max_upload_bytes: Self::DEFAULT_MAX_UPLOAD_BYTES,
            allowed_kinds: None,
            on_conflict: ConflictPolicy::Reject,
        }
    }
}

impl StoreConfig {
    /// 30 days.
    pub const DEFAULT_SHARE_TTL_SECS: u64 = 30 * 24 * 60 * 60;
    /// 100 MiB.
    pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 100 * 1024 * 1024;

    pub fn new(data_root: impl Into<PathBuf>, share_secret: impl Into<String>) -> Self {
        Self {
            data_root: data_root.into(),
            share_secret: share_secret.into(),
            ..Self::default()
        }
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(s: &str) -> SdkResult<Self> {
        let config: Self = toml::from_str(s).map_err(|e| SdkError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a TOML file. A relative `data_root` is taken relative to the
    /// file's directory.
    pub fn load(path: impl AsRef<Path>) -> SdkResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            SdkError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        let mut config = Self::from_toml_str(&text)?;
        if config.data_root.is_relative() {
            if let Some(dir) = path.parent() {
                config.data_root = dir.join(&config.data_root);
            }
        }
        Ok(config)
    }

    pub fn validate(&self) -> SdkResult<()> {
        if self.share_secret.is_empty() {
            return Err(SdkError::Config("share_secret must not be empty".into()));
        }
        if self.share_ttl_secs == 0 {
            return Err(SdkError::Config("share_ttl_secs must be positive".into()));
        }
        if self.max_upload_bytes == 0 {
            return Err(SdkError::Config("max_upload_bytes must be positive".into()));
        }
        if let Some(kinds) = &self.allowed_kinds {
            if kinds.contains(&FileKind::Disallowed) {
                return Err(SdkError::Config(
                    "allowed_kinds cannot include \"disallowed\"".into(),
                ));
            }
        }
        Ok(())
    }

    pub fn share_ttl(&self) -> Duration {
        Duration::from_secs(self.share_ttl_secs)
    }

    /// Whether uploads of `kind` are accepted.
    pub fn accepts(&self, kind: FileKind) -> bool {
        match &self.allowed_kinds {
            Some(kinds) => kinds.contains(&kind),
            None => kind != FileKind::Disallowed,
        }
    }
}
