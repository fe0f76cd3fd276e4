//! Like endpoints under `/likes`.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::Router;
use document_store::{Document, DocumentStore};
use domain::{LikeKind, LikeTarget};
use serde::Serialize;

use crate::AppState;
use crate::auth::CurrentUser;
use crate::error::ApiError;
use crate::response::ApiResponse;
use crate::routes::parse_id;

pub fn router<S: DocumentStore + Clone + 'static>() -> Router<Arc<AppState<S>>> {
    Router::new()
        .route("/toggle/{kind}/{target_id}", post(toggle::<S>))
        .route("/videos", get(liked_videos::<S>))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeState {
    pub is_liked: bool,
}

/// POST /likes/toggle/{v|c|t}/{target_id}
#[tracing::instrument(skip(state))]
pub async fn toggle<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    CurrentUser(user): CurrentUser,
    Path((kind, target_id)): Path<(String, String)>,
) -> Result<ApiResponse<LikeState>, ApiError> {
    let kind: LikeKind = kind.parse().map_err(ApiError::BadRequest)?;
    let target = LikeTarget {
        kind,
        id: parse_id(kind.as_str(), &target_id)?,
    };
    let outcome = state.services.likes.toggle(user, target).await?;
    let message = if outcome.is_present() {
        format!("{kind} liked")
    } else {
        format!("{kind} unliked")
    };
    Ok(ApiResponse::ok(
        LikeState {
            is_liked: outcome.is_present(),
        },
        message,
    ))
}

/// GET /likes/videos
#[tracing::instrument(skip(state))]
pub async fn liked_videos<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    CurrentUser(user): CurrentUser,
) -> Result<ApiResponse<Vec<Document>>, ApiError> {
    let videos = state.services.likes.liked_videos(user).await?;
    Ok(ApiResponse::ok(videos, "liked videos fetched successfully"))
}
