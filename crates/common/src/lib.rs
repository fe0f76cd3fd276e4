//! Shared types used across the video platform crates.

pub mod types;

pub use types::DocumentId;
