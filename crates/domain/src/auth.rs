//! The authorization gate for mutations.

use document_store::DocumentId;

use crate::error::{DomainError, Result};
use crate::model::{Comment, Playlist, Tweet, Video};

/// A resource that belongs to exactly one user.
pub trait Owned {
    fn owner(&self) -> DocumentId;

    /// Name used in the refusal message.
    fn kind(&self) -> &'static str;
}

/// Allows the mutation only if `requester` owns `resource`.
///
/// Services call this right after loading the resource and before looking
/// at the payload, so a non-owner is refused whatever they sent.
pub fn authorize<R: Owned + ?Sized>(requester: DocumentId, resource: &R) -> Result<()> {
    if resource.owner() == requester {
        Ok(())
    } else {
        tracing::warn!(
            %requester,
            owner = %resource.owner(),
            kind = resource.kind(),
            "ownership check failed"
        );
        Err(DomainError::Forbidden(format!(
            "only the owner can modify this {}",
            resource.kind()
        )))
    }
}

impl Owned for Video {
    fn owner(&self) -> DocumentId {
        self.owner
    }

    fn kind(&self) -> &'static str {
        "video"
    }
}

impl Owned for Comment {
    fn owner(&self) -> DocumentId {
        self.owner
    }

    fn kind(&self) -> &'static str {
        "comment"
    }
}

impl Owned for Playlist {
    fn owner(&self) -> DocumentId {
        self.owner
    }

    fn kind(&self) -> &'static str {
        "playlist"
    }
}

impl Owned for Tweet {
    fn owner(&self) -> DocumentId {
        self.owner
    }

    fn kind(&self) -> &'static str {
        "tweet"
    }
}
