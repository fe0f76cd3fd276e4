//! Blob store error types.

use thiserror::Error;

/// Errors raised by a blob store.
#[derive(Debug, Error)]
pub enum MediaError {
    /// The local file could not be read or stored.
    #[error("Upload of '{file}' failed: {reason}")]
    Upload { file: String, reason: String },

    /// The asset could not be removed.
    #[error("Delete of asset '{public_id}' failed: {reason}")]
    Delete { public_id: String, reason: String },

    /// The asset identifier is not one this store issues.
    #[error("Invalid asset id: {0}")]
    InvalidAssetId(String),
}

/// Convenience type alias for blob store results.
pub type Result<T> = std::result::Result<T, MediaError>;
