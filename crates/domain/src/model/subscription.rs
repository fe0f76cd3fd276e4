use chrono::{DateTime, Utc};
use document_store::{Collection, DocumentId};
use serde::{Deserialize, Serialize};

use super::Entity;

/// A follower edge: `subscriber` follows `channel`.
///
/// At most one exists per pair (`subscriptions_subscriber_channel_unique`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    #[serde(rename = "_id")]
    pub id: DocumentId,
    pub subscriber: DocumentId,
    pub channel: DocumentId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Subscription {
    pub fn new(subscriber: DocumentId, channel: DocumentId) -> Self {
        let now = Utc::now();
        Self {
            id: DocumentId::new(),
            subscriber,
            channel,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Entity for Subscription {
    const COLLECTION: Collection = Collection::Subscriptions;
    const NAME: &'static str = "subscription";

    fn id(&self) -> DocumentId {
        self.id
    }
}
