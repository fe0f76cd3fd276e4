//! Per-entity services.
//!
//! Every mutating operation loads its target, passes it through
//! [`authorize`](crate::auth::authorize) and only then validates the payload.

pub mod comments;
pub mod dashboard;
pub mod likes;
pub mod playlists;
pub mod subscriptions;
pub mod tweets;
pub mod users;
pub mod videos;

use std::sync::Arc;

use document_store::DocumentStore;
use media::BlobStore;

use crate::error::{DomainError, Result};
use crate::session::SessionService;

pub use comments::CommentService;
pub use dashboard::DashboardService;
pub use likes::LikeService;
pub use playlists::PlaylistService;
pub use subscriptions::SubscriptionService;
pub use tweets::TweetService;
pub use users::UserService;
pub use videos::VideoService;

/// Every service over one store and one set of collaborators.
#[derive(Clone)]
pub struct Services<S: DocumentStore + Clone> {
    pub users: UserService<S>,
    pub videos: VideoService<S>,
    pub comments: CommentService<S>,
    pub likes: LikeService<S>,
    pub subscriptions: SubscriptionService<S>,
    pub playlists: PlaylistService<S>,
    pub tweets: TweetService<S>,
    pub dashboard: DashboardService<S>,
}

impl<S: DocumentStore + Clone> Services<S> {
    pub fn new(
        store: S,
        blobs: Arc<dyn BlobStore>,
        sessions: Arc<dyn SessionService>,
    ) -> Self {
        Self {
            users: UserService::new(store.clone(), blobs.clone(), sessions),
            videos: VideoService::new(store.clone(), blobs),
            comments: CommentService::new(store.clone()),
            likes: LikeService::new(store.clone()),
            subscriptions: SubscriptionService::new(store.clone()),
            playlists: PlaylistService::new(store.clone()),
            tweets: TweetService::new(store.clone()),
            dashboard: DashboardService::new(store),
        }
    }
}

/// Trims a required text field, rejecting blanks.
pub(crate) fn required(field: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::invalid(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}
