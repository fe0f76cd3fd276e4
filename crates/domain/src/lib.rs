//! Domain layer of the video platform.
//!
//! This crate provides:
//! - Typed entities stored one per document ([`model`])
//! - The ownership gate every mutation passes through ([`auth::authorize`])
//! - The present/absent toggle used by likes and subscriptions ([`toggle`])
//! - Password hashing and the session collaborator ([`credentials`], [`session`])
//! - Per-entity services composing the store, the read model and the blob store ([`service`])

pub mod auth;
pub mod credentials;
pub mod error;
pub mod model;
pub mod repository;
pub mod service;
pub mod session;
pub mod toggle;

pub use auth::{Owned, authorize};
pub use error::{DomainError, Result};
pub use model::{
    Comment, Entity, Like, LikeKind, LikeTarget, Playlist, Subscription, Tweet, User, Video,
};
pub use repository::Repository;
pub use service::Services;
pub use session::{JwtSessionService, SessionService, TokenPair};
pub use toggle::ToggleOutcome;
