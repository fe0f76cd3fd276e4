use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use document_store::{Collection, DocumentId};
use serde::{Deserialize, Serialize};

use super::Entity;

/// What a like points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LikeKind {
    Video,
    Comment,
    Tweet,
}

impl LikeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LikeKind::Video => "video",
            LikeKind::Comment => "comment",
            LikeKind::Tweet => "tweet",
        }
    }

    /// The collection holding targets of this kind.
    pub fn collection(&self) -> Collection {
        match self {
            LikeKind::Video => Collection::Videos,
            LikeKind::Comment => Collection::Comments,
            LikeKind::Tweet => Collection::Tweets,
        }
    }
}

impl fmt::Display for LikeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LikeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "video" | "v" => Ok(LikeKind::Video),
            "comment" | "c" => Ok(LikeKind::Comment),
            "tweet" | "t" => Ok(LikeKind::Tweet),
            other => Err(format!("unknown like target: {other}")),
        }
    }
}

/// Tagged like target: exactly one kind and id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LikeTarget {
    pub kind: LikeKind,
    pub id: DocumentId,
}

impl LikeTarget {
    pub fn video(id: DocumentId) -> Self {
        Self {
            kind: LikeKind::Video,
            id,
        }
    }

    pub fn comment(id: DocumentId) -> Self {
        Self {
            kind: LikeKind::Comment,
            id,
        }
    }

    pub fn tweet(id: DocumentId) -> Self {
        Self {
            kind: LikeKind::Tweet,
            id,
        }
    }
}

/// A like by `liked_by` on `target`.
///
/// At most one exists per (likedBy, target.kind, target.id).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Like {
    #[serde(rename = "_id")]
    pub id: DocumentId,
    pub liked_by: DocumentId,
    pub target: LikeTarget,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Like {
    pub fn new(liked_by: DocumentId, target: LikeTarget) -> Self {
        let now = Utc::now();
        Self {
            id: DocumentId::new(),
            liked_by,
            target,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Entity for Like {
    const COLLECTION: Collection = Collection::Likes;
    const NAME: &'static str = "like";

    fn id(&self) -> DocumentId {
        self.id
    }
}
