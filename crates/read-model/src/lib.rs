//! Read model for the video platform.
//!
//! Queries are expressed as [`Pipeline`]s of plain-data stages and executed by
//! a [`QueryEngine`] against any [`document_store::DocumentStore`]:
//! - [`Lookup`] joins a reference field against another collection, optionally nested
//! - [`Projection`] shapes output fields; [`Redaction`] strips sensitive user fields
//! - [`PageRequest`], [`SortSpec`] and [`Page`] give deterministic windowing with totals
//! - [`Group`] computes counts and sums, zero-filled over empty input
//!
//! The [`views`] module holds the named queries used by the API.

pub mod aggregation;
pub mod engine;
pub mod error;
pub mod join;
pub mod pagination;
pub mod pipeline;
pub mod projection;
pub mod views;

pub use aggregation::{Accumulator, Group};
pub use engine::QueryEngine;
pub use error::{QueryError, Result};
pub use join::{Cardinality, Lookup};
pub use pagination::{Page, PageRequest, SortDirection, SortSpec};
pub use pipeline::{Pipeline, Stage};
pub use projection::{FieldSpec, Projection, Redaction};
pub use views::{ChannelStats, VideoFeedQuery};
