//! Multi-file uploads with compensating deletes.

use crate::Result;
use crate::blob::{BlobStore, LocalFile, UploadedAsset};

/// Uploads files one after another on behalf of a single domain write.
///
/// If an upload fails, every asset uploaded earlier in the batch is deleted
/// in reverse order before the error is returned. Callers that fail after
/// the uploads (e.g. the document insert hits a unique index) call
/// [`UploadBatch::abort`]; on success they call [`UploadBatch::commit`].
pub struct UploadBatch<'a, B: BlobStore + ?Sized> {
    blobs: &'a B,
    uploaded: Vec<UploadedAsset>,
}

impl<'a, B: BlobStore + ?Sized> UploadBatch<'a, B> {
    pub fn new(blobs: &'a B) -> Self {
        Self {
            blobs,
            uploaded: Vec::new(),
        }
    }

    /// Uploads one file, rolling back the batch on failure.
    #[tracing::instrument(skip(self), fields(file = %file.path().display()))]
    pub async fn upload(&mut self, file: &LocalFile) -> Result<UploadedAsset> {
        match self.blobs.upload(file).await {
            Ok(asset) => {
                metrics::counter!("media_uploads_total", "status" => "ok").increment(1);
                self.uploaded.push(asset.clone());
                Ok(asset)
            }
            Err(e) => {
                metrics::counter!("media_uploads_total", "status" => "failed").increment(1);
                tracing::warn!(error = %e, rollback = self.uploaded.len(), "upload failed");
                self.compensate().await;
                Err(e)
            }
        }
    }

    /// Uploads the file if one was supplied.
    pub async fn upload_optional(
        &mut self,
        file: Option<&LocalFile>,
    ) -> Result<Option<UploadedAsset>> {
        match file {
            Some(file) => self.upload(file).await.map(Some),
            None => Ok(None),
        }
    }

    /// Number of assets currently held by the batch.
    pub fn len(&self) -> usize {
        self.uploaded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.uploaded.is_empty()
    }

    /// Keeps every uploaded asset.
    pub fn commit(self) -> Vec<UploadedAsset> {
        self.uploaded
    }

    /// Deletes every uploaded asset.
    pub async fn abort(mut self) {
        self.compensate().await;
    }

    async fn compensate(&mut self) {
        while let Some(asset) = self.uploaded.pop() {
            match self.blobs.delete(&asset.public_id).await {
                Ok(()) => {
                    metrics::counter!("media_compensations_total", "status" => "ok")
                        .increment(1);
                    tracing::info!(public_id = %asset.public_id, "orphaned asset deleted");
                }
                Err(e) => {
                    metrics::counter!("media_compensations_total", "status" => "failed")
                        .increment(1);
                    tracing::error!(
                        public_id = %asset.public_id,
                        error = %e,
                        "failed to delete orphaned asset"
                    );
                }
            }
        }
    }
}

/// Deletes an asset that a successful write has just replaced.
///
/// Failure is logged, not returned: the new asset is already referenced.
pub async fn release<B: BlobStore + ?Sized>(blobs: &B, url: &str) {
    let Some(public_id) = blobs.public_id_of(url) else {
        return;
    };
    if let Err(e) = blobs.delete(&public_id).await {
        tracing::warn!(%public_id, error = %e, "failed to delete replaced asset");
    }
}
