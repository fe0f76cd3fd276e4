//! In-memory blob store for tests and local runs.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;

use crate::blob::{BlobStore, LocalFile, UploadedAsset};
use crate::{MediaError, Result};

#[derive(Debug, Default)]
struct InMemoryBlobState {
    assets: HashMap<String, UploadedAsset>,
    next_id: u32,
    /// Uploads still allowed before every upload fails. `None` never fails.
    uploads_before_failure: Option<usize>,
    fail_on_delete: bool,
    video_duration: f64,
    deleted: Vec<String>,
}

/// In-memory blob store with failure injection.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBlobStore {
    state: Arc<RwLock<InMemoryBlobState>>,
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Duration reported for video uploads.
    pub fn with_video_duration(self, seconds: f64) -> Self {
        self.write(|s| s.video_duration = seconds);
        self
    }

    /// Makes every upload fail (or succeed again).
    pub fn set_fail_on_upload(&self, fail: bool) {
        self.write(|s| s.uploads_before_failure = fail.then_some(0));
    }

    /// Lets `successes` more uploads through, then fails every upload.
    pub fn fail_uploads_after(&self, successes: usize) {
        self.write(|s| s.uploads_before_failure = Some(successes));
    }

    pub fn set_fail_on_delete(&self, fail: bool) {
        self.write(|s| s.fail_on_delete = fail);
    }

    /// Returns the number of stored assets.
    pub fn asset_count(&self) -> usize {
        self.read(|s| s.assets.len())
    }

    /// Returns true if an asset exists with the given public id.
    pub fn has_asset(&self, public_id: &str) -> bool {
        self.read(|s| s.assets.contains_key(public_id))
    }

    /// Public ids deleted so far, in deletion order.
    pub fn deleted(&self) -> Vec<String> {
        self.read(|s| s.deleted.clone())
    }

    fn read<T>(&self, f: impl FnOnce(&InMemoryBlobState) -> T) -> T {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        f(&state)
    }

    fn write<T>(&self, f: impl FnOnce(&mut InMemoryBlobState) -> T) -> T {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut state)
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn upload(&self, file: &LocalFile) -> Result<UploadedAsset> {
        self.write(|state| {
            match &mut state.uploads_before_failure {
                Some(0) => {
                    return Err(MediaError::Upload {
                        file: file.file_name(),
                        reason: "blob store unavailable".to_string(),
                    });
                }
                Some(remaining) => *remaining -= 1,
                None => {}
            }

            state.next_id += 1;
            let public_id = format!("asset-{:04}", state.next_id);
            let asset = UploadedAsset {
                url: format!("memory://blobs/{public_id}"),
                public_id: public_id.clone(),
                duration: file.is_video().then_some(state.video_duration),
            };
            state.assets.insert(public_id, asset.clone());
            Ok(asset)
        })
    }

    async fn delete(&self, public_id: &str) -> Result<()> {
        self.write(|state| {
            if state.fail_on_delete {
                return Err(MediaError::Delete {
                    public_id: public_id.to_string(),
                    reason: "blob store unavailable".to_string(),
                });
            }
            state.assets.remove(public_id);
            state.deleted.push(public_id.to_string());
            Ok(())
        })
    }
}
