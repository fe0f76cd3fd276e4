use chrono::{DateTime, Utc};
use document_store::{Collection, DocumentId};
use serde::{Deserialize, Serialize};

use super::Entity;

/// A registered account and its channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: DocumentId,
    /// Always stored lower-cased.
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub avatar: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
    /// Argon2 PHC string.
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Watched videos, most recent first.
    #[serde(default)]
    pub watch_history: Vec<DocumentId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for User {
    const COLLECTION: Collection = Collection::Users;
    const NAME: &'static str = "user";

    fn id(&self) -> DocumentId {
        self.id
    }
}
