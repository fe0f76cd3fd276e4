//! Media storage boundary.
//!
//! - [`BlobStore`] uploads local files and deletes assets by public id
//! - [`InMemoryBlobStore`] and [`DirectoryBlobStore`] implement it
//! - [`UploadBatch`] deletes already-uploaded assets when a later upload fails

pub mod batch;
pub mod blob;
pub mod directory;
pub mod error;
pub mod memory;

pub use batch::{UploadBatch, release};
pub use blob::{BlobStore, LocalFile, UploadedAsset};
pub use directory::DirectoryBlobStore;
pub use error::{MediaError, Result};
pub use memory::InMemoryBlobStore;
