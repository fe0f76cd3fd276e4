//! Query error types.

use thiserror::Error;

/// Errors that can occur while building or executing a read-model query.
#[derive(Debug, Error)]
pub enum QueryError {
    /// An error occurred in the document store.
    #[error("Document store error: {0}")]
    Store(#[from] document_store::StoreError),

    /// The caller supplied an unusable parameter (page, limit, sort key, ...).
    #[error("Invalid query input: {0}")]
    InvalidInput(String),

    /// The pipeline itself is malformed.
    #[error("Invalid pipeline: {0}")]
    InvalidPipeline(String),

    /// The root document of a single-entity view does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// Failed to deserialize a query result.
    #[error("Result deserialization error: {0}")]
    Deserialization(#[from] serde_json::Error),
}

/// Result type for read-model operations.
pub type Result<T> = std::result::Result<T, QueryError>;
