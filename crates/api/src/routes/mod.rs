//! HTTP handlers, one module per resource.

pub mod comments;
pub mod dashboard;
pub mod health;
pub mod likes;
pub mod metrics;
pub mod playlists;
pub mod subscriptions;
pub mod tweets;
pub mod users;
pub mod videos;

use document_store::DocumentId;
use read_model::PageRequest;
use serde::Deserialize;

use crate::error::ApiError;

/// Parses a path segment into an id, naming the parameter on failure.
pub(crate) fn parse_id(what: &str, raw: &str) -> Result<DocumentId, ApiError> {
    DocumentId::parse(raw).map_err(|_| ApiError::BadRequest(format!("invalid {what} id")))
}

/// `?page=&limit=` query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl PageParams {
    pub fn request(&self) -> Result<PageRequest, ApiError> {
        Ok(PageRequest::from_params(self.page, self.limit)?)
    }
}

/// Body of endpoints that only carry text.
#[derive(Debug, Deserialize)]
pub struct ContentBody {
    pub content: String,
}
