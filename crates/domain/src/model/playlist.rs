use chrono::{DateTime, Utc};
use document_store::{Collection, DocumentId};
use serde::{Deserialize, Serialize};

use super::Entity;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Playlist {
    #[serde(rename = "_id")]
    pub id: DocumentId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub owner: DocumentId,
    /// Ordered, without duplicates.
    #[serde(default)]
    pub videos: Vec<DocumentId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Playlist {
    pub fn contains(&self, video: DocumentId) -> bool {
        self.videos.contains(&video)
    }

    /// Appends a video. Returns false if it is already present.
    pub fn add_video(&mut self, video: DocumentId) -> bool {
        if self.contains(video) {
            return false;
        }
        self.videos.push(video);
        true
    }

    /// Removes a video. Returns false if it was not present.
    pub fn remove_video(&mut self, video: DocumentId) -> bool {
        let before = self.videos.len();
        self.videos.retain(|v| *v != video);
        self.videos.len() != before
    }
}

impl Entity for Playlist {
    const COLLECTION: Collection = Collection::Playlists;
    const NAME: &'static str = "playlist";

    fn id(&self) -> DocumentId {
        self.id
    }
}
