use chrono::Utc;
use document_store::{Document, DocumentId, DocumentStore};
use read_model::{Page, PageRequest, QueryEngine};

use crate::auth::authorize;
use crate::error::Result;
use crate::model::{Comment, Video};
use crate::repository::Repository;
use crate::service::required;

#[derive(Clone)]
pub struct CommentService<S: DocumentStore + Clone> {
    repo: Repository<S>,
    engine: QueryEngine<S>,
}

impl<S: DocumentStore + Clone> CommentService<S> {
    pub fn new(store: S) -> Self {
        Self {
            repo: Repository::new(store.clone()),
            engine: QueryEngine::new(store),
        }
    }

    /// Comments on a video, newest first. A video without comments yields an empty page.
    pub async fn list(&self, video: DocumentId, page: PageRequest) -> Result<Page<Document>> {
        self.repo.ensure_exists::<Video>(video).await?;
        Ok(self.engine.video_comments(video, page).await?)
    }

    #[tracing::instrument(skip(self, content))]
    pub async fn add(
        &self,
        owner: DocumentId,
        video: DocumentId,
        content: &str,
    ) -> Result<Comment> {
        let content = required("content", content)?;
        self.repo.ensure_exists::<Video>(video).await?;

        let now = Utc::now();
        let comment = Comment {
            id: DocumentId::new(),
            content,
            video,
            owner,
            created_at: now,
            updated_at: now,
        };
        self.repo.insert(&comment).await
    }

    #[tracing::instrument(skip(self, content))]
    pub async fn update(
        &self,
        requester: DocumentId,
        comment_id: DocumentId,
        content: &str,
    ) -> Result<Comment> {
        let mut comment = self.repo.require::<Comment>(comment_id).await?;
        authorize(requester, &comment)?;
        comment.content = required("content", content)?;
        self.repo.save(&comment).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, requester: DocumentId, comment_id: DocumentId) -> Result<()> {
        let comment = self.repo.require::<Comment>(comment_id).await?;
        authorize(requester, &comment)?;
        self.repo.delete::<Comment>(comment_id).await?;
        Ok(())
    }
}
