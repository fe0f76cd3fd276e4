//! Named query shapes over the pipeline primitives.
//!
//! Each view exposes a pure pipeline builder plus a [`QueryEngine`](crate::QueryEngine)
//! method that runs it and shapes the result.

pub mod channel;
pub mod comments;
pub mod playlists;
pub mod subscriptions;
pub mod tweets;
pub mod videos;

use document_store::Collection;

use crate::join::Lookup;
use crate::pipeline::Stage;
use crate::projection::Projection;

pub use channel::ChannelStats;
pub use videos::{FEED_SORT_KEYS, VideoFeedQuery};

/// Public fields of a user shown next to content they own.
pub const OWNER_SUMMARY_FIELDS: [&str; 3] = ["fullName", "username", "avatar"];

/// Joins a user reference and keeps only the owner summary fields.
pub fn owner_summary(local_field: &str, as_field: &str) -> Lookup {
    Lookup::reference(Collection::Users, local_field, as_field)
        .with_stage(Stage::Project(Projection::including(OWNER_SUMMARY_FIELDS)))
}
