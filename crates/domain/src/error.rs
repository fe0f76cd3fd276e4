//! Domain error types.

use document_store::StoreError;
use media::MediaError;
use read_model::QueryError;
use thiserror::Error;

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// Malformed or missing input the caller can fix.
    #[error("{0}")]
    InvalidInput(String),

    /// Missing or invalid credentials or session.
    #[error("{0}")]
    Unauthorized(String),

    /// The requester does not own the resource.
    #[error("{0}")]
    Forbidden(String),

    /// A referenced entity does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// A uniqueness rule was violated.
    #[error("{0}")]
    Conflict(String),

    /// The blob store failed.
    #[error("Blob store error: {0}")]
    Dependency(#[from] MediaError),

    /// Unexpected store or serialization failure.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn invalid(message: impl Into<String>) -> Self {
        DomainError::InvalidInput(message.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        DomainError::NotFound(what.into())
    }
}

impl From<StoreError> for DomainError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::DuplicateKey { index, .. } => DomainError::Conflict(
                match index {
                    "users_username_unique" => "username is already taken",
                    "users_email_unique" => "email is already registered",
                    "likes_actor_target_unique" => "like already exists",
                    "subscriptions_subscriber_channel_unique" => "subscription already exists",
                    _ => "document already exists",
                }
                .to_string(),
            ),
            StoreError::NotFound { collection, .. } => DomainError::NotFound(
                collection.as_str().trim_end_matches('s').to_string(),
            ),
            StoreError::InvalidDocument(msg) => DomainError::Internal(msg),
            other => {
                tracing::error!(error = %other, "document store failure");
                DomainError::Internal(other.to_string())
            }
        }
    }
}

impl From<QueryError> for DomainError {
    fn from(e: QueryError) -> Self {
        match e {
            QueryError::Store(e) => e.into(),
            QueryError::InvalidInput(msg) => DomainError::InvalidInput(msg),
            QueryError::NotFound(what) => DomainError::NotFound(what),
            other => {
                tracing::error!(error = %other, "read model failure");
                DomainError::Internal(other.to_string())
            }
        }
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(e: serde_json::Error) -> Self {
        DomainError::Internal(format!("serialization: {e}"))
    }
}

/// Convenience type alias for domain results.
pub type Result<T> = std::result::Result<T, DomainError>;
