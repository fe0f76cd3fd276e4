use thiserror::Error;

use crate::{Collection, DocumentId};

/// Errors that can occur when interacting with the document store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A write would have produced two documents sharing a unique key.
    #[error("Duplicate key in {collection}: unique index {index} violated")]
    DuplicateKey {
        collection: Collection,
        index: &'static str,
    },

    /// The document addressed by a replace was not found.
    #[error("Document not found in {collection}: {id}")]
    NotFound { collection: Collection, id: DocumentId },

    /// The document is not a JSON object or carries a malformed reserved field.
    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for document store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
