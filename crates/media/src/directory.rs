//! Blob store backed by a local directory.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use uuid::Uuid;

use crate::blob::{BlobStore, LocalFile, UploadedAsset};
use crate::{MediaError, Result};

/// Copies uploads into `root` under generated names and serves them from `base_url`.
///
/// Durations are not probed, so uploads report `None`.
#[derive(Debug, Clone)]
pub struct DirectoryBlobStore {
    root: PathBuf,
    base_url: String,
}

impl DirectoryBlobStore {
    /// Creates the store, creating `root` if needed.
    pub async fn open(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Result<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root)
            .await
            .map_err(|e| MediaError::Upload {
                file: root.display().to_string(),
                reason: format!("cannot create blob directory: {e}"),
            })?;
        Ok(Self {
            root,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn asset_path(&self, public_id: &str) -> Result<PathBuf> {
        let valid = !public_id.is_empty()
            && !public_id.starts_with('.')
            && public_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.');
        if !valid {
            return Err(MediaError::InvalidAssetId(public_id.to_string()));
        }
        Ok(self.root.join(public_id))
    }
}

#[async_trait]
impl BlobStore for DirectoryBlobStore {
    #[tracing::instrument(skip(self), fields(file = %file.path().display()))]
    async fn upload(&self, file: &LocalFile) -> Result<UploadedAsset> {
        let public_id = match file.extension() {
            Some(ext) if ext.chars().all(|c| c.is_ascii_alphanumeric()) => {
                format!("{}.{ext}", Uuid::new_v4())
            }
            _ => Uuid::new_v4().to_string(),
        };
        let target = self.asset_path(&public_id)?;

        tokio::fs::copy(file.path(), &target)
            .await
            .map_err(|e| MediaError::Upload {
                file: file.file_name(),
                reason: e.to_string(),
            })?;

        tracing::debug!(%public_id, "asset stored");
        Ok(UploadedAsset {
            url: format!("{}/{public_id}", self.base_url),
            public_id,
            duration: None,
        })
    }

    async fn delete(&self, public_id: &str) -> Result<()> {
        let path = self.asset_path(public_id)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(MediaError::Delete {
                public_id: public_id.to_string(),
                reason: e.to_string(),
            }),
        }
    }
}
