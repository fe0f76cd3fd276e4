use document_store::{Document, DocumentId, DocumentStore, Filter};
use read_model::QueryEngine;

use crate::error::{DomainError, Result};
use crate::model::{Entity, Subscription, User};
use crate::repository::Repository;
use crate::toggle::{ToggleOutcome, toggle};

#[derive(Clone)]
pub struct SubscriptionService<S: DocumentStore + Clone> {
    repo: Repository<S>,
    engine: QueryEngine<S>,
}

impl<S: DocumentStore + Clone> SubscriptionService<S> {
    pub fn new(store: S) -> Self {
        Self {
            repo: Repository::new(store.clone()),
            engine: QueryEngine::new(store),
        }
    }

    /// Subscribes `subscriber` to `channel`, or unsubscribes if already subscribed.
    #[tracing::instrument(skip(self))]
    pub async fn toggle(
        &self,
        subscriber: DocumentId,
        channel: DocumentId,
    ) -> Result<ToggleOutcome> {
        if subscriber == channel {
            return Err(DomainError::invalid("cannot subscribe to your own channel"));
        }
        if self.repo.load::<User>(channel).await?.is_none() {
            return Err(DomainError::not_found("channel"));
        }

        let pair = Filter::new()
            .eq("subscriber", subscriber.to_string())
            .eq("channel", channel.to_string());
        let edge = Document::from_entity(&Subscription::new(subscriber, channel))?;
        let outcome = toggle(self.repo.store(), Subscription::COLLECTION, &pair, edge).await?;

        metrics::counter!("subscriptions_toggled_total", "state" => outcome.as_str()).increment(1);
        tracing::info!(state = outcome.as_str(), "subscription toggled");
        Ok(outcome)
    }

    pub async fn channel_subscribers(&self, channel: DocumentId) -> Result<Vec<Document>> {
        Ok(self.engine.channel_subscribers(channel).await?)
    }

    pub async fn subscribed_channels(&self, subscriber: DocumentId) -> Result<Vec<Document>> {
        Ok(self.engine.subscribed_channels(subscriber).await?)
    }
}
