use chrono::{DateTime, Utc};
use document_store::{Collection, DocumentId};
use serde::{Deserialize, Serialize};

use super::Entity;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tweet {
    #[serde(rename = "_id")]
    pub id: DocumentId,
    pub content: String,
    pub owner: DocumentId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Tweet {
    const COLLECTION: Collection = Collection::Tweets;
    const NAME: &'static str = "tweet";

    fn id(&self) -> DocumentId {
        self.id
    }
}
