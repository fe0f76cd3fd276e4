use chrono::Utc;
use document_store::{Document, DocumentId, DocumentStore};
use read_model::QueryEngine;

use crate::auth::authorize;
use crate::error::Result;
use crate::model::{Tweet, User};
use crate::repository::Repository;
use crate::service::required;

#[derive(Clone)]
pub struct TweetService<S: DocumentStore + Clone> {
    repo: Repository<S>,
    engine: QueryEngine<S>,
}

impl<S: DocumentStore + Clone> TweetService<S> {
    pub fn new(store: S) -> Self {
        Self {
            repo: Repository::new(store.clone()),
            engine: QueryEngine::new(store),
        }
    }

    #[tracing::instrument(skip(self, content))]
    pub async fn create(&self, owner: DocumentId, content: &str) -> Result<Tweet> {
        let content = required("content", content)?;
        let now = Utc::now();
        let tweet = Tweet {
            id: DocumentId::new(),
            content,
            owner,
            created_at: now,
            updated_at: now,
        };
        self.repo.insert(&tweet).await
    }

    pub async fn user_tweets(&self, user: DocumentId) -> Result<Vec<Document>> {
        self.repo.ensure_exists::<User>(user).await?;
        Ok(self.engine.user_tweets(user).await?)
    }

    #[tracing::instrument(skip(self, content))]
    pub async fn update(
        &self,
        requester: DocumentId,
        tweet_id: DocumentId,
        content: &str,
    ) -> Result<Tweet> {
        let mut tweet = self.repo.require::<Tweet>(tweet_id).await?;
        authorize(requester, &tweet)?;
        tweet.content = required("content", content)?;
        self.repo.save(&tweet).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, requester: DocumentId, tweet_id: DocumentId) -> Result<()> {
        let tweet = self.repo.require::<Tweet>(tweet_id).await?;
        authorize(requester, &tweet)?;
        self.repo.delete::<Tweet>(tweet_id).await?;
        Ok(())
    }
}
