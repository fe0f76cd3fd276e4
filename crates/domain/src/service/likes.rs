use document_store::{Document, DocumentId, DocumentStore, DocumentStoreExt, Filter};
use read_model::QueryEngine;

use crate::error::{DomainError, Result};
use crate::model::{Entity, Like, LikeTarget};
use crate::toggle::{ToggleOutcome, toggle};

#[derive(Clone)]
pub struct LikeService<S: DocumentStore + Clone> {
    store: S,
    engine: QueryEngine<S>,
}

impl<S: DocumentStore + Clone> LikeService<S> {
    pub fn new(store: S) -> Self {
        Self {
            engine: QueryEngine::new(store.clone()),
            store,
        }
    }

    /// Likes the target, or removes the like if `actor` already liked it.
    #[tracing::instrument(skip(self), fields(kind = %target.kind, target = %target.id))]
    pub async fn toggle(&self, actor: DocumentId, target: LikeTarget) -> Result<ToggleOutcome> {
        if !self.store.exists(target.kind.collection(), target.id).await? {
            return Err(DomainError::not_found(target.kind.as_str()));
        }

        let pair = Filter::new()
            .eq("likedBy", actor.to_string())
            .eq("target.kind", target.kind.as_str())
            .eq("target.id", target.id.to_string());
        let like = Document::from_entity(&Like::new(actor, target))?;
        let outcome = toggle(&self.store, Like::COLLECTION, &pair, like).await?;

        metrics::counter!(
            "likes_toggled_total",
            "kind" => target.kind.as_str(),
            "state" => outcome.as_str()
        )
        .increment(1);
        tracing::info!(%actor, state = outcome.as_str(), "like toggled");
        Ok(outcome)
    }

    /// Videos `user` liked, most recently liked first.
    pub async fn liked_videos(&self, user: DocumentId) -> Result<Vec<Document>> {
        Ok(self.engine.liked_videos(user).await?)
    }
}
