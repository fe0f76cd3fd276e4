//! Persisted entities.

pub mod comment;
pub mod like;
pub mod playlist;
pub mod subscription;
pub mod tweet;
pub mod user;
pub mod video;

use document_store::{Collection, DocumentId};
use serde::Serialize;
use serde::de::DeserializeOwned;

pub use comment::Comment;
pub use like::{Like, LikeKind, LikeTarget};
pub use playlist::Playlist;
pub use subscription::Subscription;
pub use tweet::Tweet;
pub use user::User;
pub use video::Video;

/// An entity stored as one document in its own collection.
pub trait Entity: Serialize + DeserializeOwned + Send + Sync {
    /// The collection holding this entity.
    const COLLECTION: Collection;

    /// Name used in error messages ("video not found").
    const NAME: &'static str;

    fn id(&self) -> DocumentId;
}
