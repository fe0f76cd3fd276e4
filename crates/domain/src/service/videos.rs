//! Publishing, watching and maintaining videos.

use std::sync::Arc;

use chrono::Utc;
use document_store::{Collection, Document, DocumentId, DocumentStore, DocumentStoreExt, Update};
use media::{BlobStore, LocalFile, UploadBatch, release};
use read_model::{Page, QueryEngine, VideoFeedQuery};

use crate::auth::authorize;
use crate::error::{DomainError, Result};
use crate::model::Video;
use crate::repository::Repository;
use crate::service::required;

/// Video and thumbnail are files already staged on this host.
#[derive(Debug, Clone, Default)]
pub struct PublishVideo {
    pub title: String,
    pub description: String,
    pub video_file: Option<LocalFile>,
    pub thumbnail: Option<LocalFile>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateVideo {
    pub title: String,
    pub description: String,
    /// Replaces the current thumbnail when present.
    pub thumbnail: Option<LocalFile>,
}

#[derive(Clone)]
pub struct VideoService<S: DocumentStore + Clone> {
    repo: Repository<S>,
    engine: QueryEngine<S>,
    blobs: Arc<dyn BlobStore>,
}

impl<S: DocumentStore + Clone> VideoService<S> {
    pub fn new(store: S, blobs: Arc<dyn BlobStore>) -> Self {
        Self {
            repo: Repository::new(store.clone()),
            engine: QueryEngine::new(store),
            blobs,
        }
    }

    pub async fn feed(&self, query: &VideoFeedQuery) -> Result<Page<Document>> {
        Ok(self.engine.video_feed(query).await?)
    }

    /// Uploads the video file, then the thumbnail, then stores the video.
    ///
    /// A failed thumbnail upload deletes the already uploaded video file; a
    /// failed insert deletes both.
    #[tracing::instrument(skip(self, request), fields(title = %request.title))]
    pub async fn publish(&self, owner: DocumentId, request: PublishVideo) -> Result<Video> {
        let title = required("title", &request.title)?;
        let description = required("description", &request.description)?;
        let (Some(video_file), Some(thumbnail_file)) =
            (request.video_file.as_ref(), request.thumbnail.as_ref())
        else {
            return Err(DomainError::invalid("video file and thumbnail are required"));
        };

        let mut batch = UploadBatch::new(self.blobs.as_ref());
        let video_asset = batch.upload(video_file).await?;
        let thumbnail_asset = batch.upload(thumbnail_file).await?;

        let now = Utc::now();
        let video = Video {
            id: DocumentId::new(),
            video_file: video_asset.url,
            thumbnail: thumbnail_asset.url,
            title,
            description,
            duration: video_asset.duration.unwrap_or_default(),
            views: 0,
            is_published: true,
            owner,
            created_at: now,
            updated_at: now,
        };

        match self.repo.insert(&video).await {
            Ok(video) => {
                batch.commit();
                tracing::info!(video = %video.id, "video published");
                Ok(video)
            }
            Err(e) => {
                batch.abort().await;
                Err(e)
            }
        }
    }

    /// Fetches a video, counting the view.
    ///
    /// The view count is incremented atomically; a signed-in viewer also gets
    /// the video moved to the front of their watch history, in a single write
    /// that leaves the rest of the user untouched.
    #[tracing::instrument(skip(self))]
    pub async fn watch(
        &self,
        video_id: DocumentId,
        viewer: Option<DocumentId>,
    ) -> Result<Document> {
        let store = self.repo.store();
        store
            .increment(Collection::Videos, video_id, "views", 1)
            .await?
            .ok_or_else(|| DomainError::not_found("video"))?;
        metrics::counter!("video_views_total").increment(1);

        if let Some(viewer) = viewer {
            let watched = Update::new().push_front("watchHistory", video_id.to_string());
            store.update_by_id(Collection::Users, viewer, &watched).await?;
        }

        Ok(self.engine.video_details(video_id, viewer).await?)
    }

    #[tracing::instrument(skip(self, request))]
    pub async fn update(
        &self,
        requester: DocumentId,
        video_id: DocumentId,
        request: UpdateVideo,
    ) -> Result<Video> {
        let video = self.repo.require::<Video>(video_id).await?;
        authorize(requester, &video)?;
        let update = Update::new()
            .set("title", required("title", &request.title)?)
            .set("description", required("description", &request.description)?);

        let Some(thumbnail_file) = request.thumbnail.as_ref() else {
            return self.repo.update(video_id, &update).await;
        };

        let mut batch = UploadBatch::new(self.blobs.as_ref());
        let asset = batch.upload(thumbnail_file).await?;
        let previous = video.thumbnail;
        let update = update.set("thumbnail", asset.url);
        match self.repo.update::<Video>(video_id, &update).await {
            Ok(video) => {
                batch.commit();
                release(self.blobs.as_ref(), &previous).await;
                Ok(video)
            }
            Err(e) => {
                batch.abort().await;
                Err(e)
            }
        }
    }

    /// Deletes the video document. Comments, likes and stored assets are kept.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, requester: DocumentId, video_id: DocumentId) -> Result<()> {
        let video = self.repo.require::<Video>(video_id).await?;
        authorize(requester, &video)?;
        self.repo.delete::<Video>(video_id).await?;
        tracing::info!(video = %video_id, "video deleted");
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub async fn toggle_publish(
        &self,
        requester: DocumentId,
        video_id: DocumentId,
    ) -> Result<Video> {
        let video = self.repo.require::<Video>(video_id).await?;
        authorize(requester, &video)?;
        let flip = Update::new().set("isPublished", !video.is_published);
        self.repo.update(video_id, &flip).await
    }
}
