//! Request authentication.
//!
//! The access token is read from `Authorization: Bearer <token>` or, failing
//! that, from the `accessToken` cookie.

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::HeaderMap;
use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::request::Parts;
use document_store::{DocumentId, DocumentStore};

use crate::AppState;
use crate::error::ApiError;

pub const ACCESS_TOKEN_COOKIE: &str = "accessToken";
pub const REFRESH_TOKEN_COOKIE: &str = "refreshToken";

/// The signed-in user. Rejects the request with 401 otherwise.
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser(pub DocumentId);

/// The signed-in user if any. Missing or invalid tokens give `None`.
#[derive(Debug, Clone, Copy)]
pub struct Viewer(pub Option<DocumentId>);

impl<S> FromRequestParts<Arc<AppState<S>>> for CurrentUser
where
    S: DocumentStore + Clone + 'static,
{
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState<S>>,
    ) -> Result<Self, Self::Rejection> {
        let token = access_token(parts)
            .ok_or_else(|| ApiError::Unauthorized("unauthorized request".to_string()))?;
        let user = state.services.users.sessions().verify_access(&token)?;
        Ok(CurrentUser(user))
    }
}

impl<S> FromRequestParts<Arc<AppState<S>>> for Viewer
where
    S: DocumentStore + Clone + 'static,
{
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState<S>>,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = access_token(parts) else {
            return Ok(Viewer(None));
        };
        let user = state.services.users.sessions().verify_access(&token).ok();
        Ok(Viewer(user))
    }
}

fn access_token(parts: &Parts) -> Option<String> {
    let bearer = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());
    match bearer {
        Some(token) => Some(token.to_string()),
        None => cookie(&parts.headers, ACCESS_TOKEN_COOKIE),
    }
}

/// Reads a cookie value from the request headers.
pub fn cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
        .filter(|v| !v.is_empty())
}
