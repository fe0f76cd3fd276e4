//! Comment endpoints under `/comments`.

use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::routing::{get, patch};
use axum::{Json, Router};
use document_store::{Document, DocumentStore};
use domain::Comment;
use read_model::Page;

use crate::AppState;
use crate::auth::CurrentUser;
use crate::error::ApiError;
use crate::response::ApiResponse;
use crate::routes::{ContentBody, PageParams, parse_id};

pub fn router<S: DocumentStore + Clone + 'static>() -> Router<Arc<AppState<S>>> {
    Router::new()
        .route("/{video_id}", get(list::<S>).post(add::<S>))
        .route(
            "/c/{comment_id}",
            patch(update::<S>).delete(delete::<S>),
        )
}

/// GET /comments/{video_id}?page=&limit=
#[tracing::instrument(skip(state))]
pub async fn list<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(video_id): Path<String>,
    params: Result<Query<PageParams>, QueryRejection>,
) -> Result<ApiResponse<Page<Document>>, ApiError> {
    let video_id = parse_id("video", &video_id)?;
    let Query(params) = params?;
    let page = state
        .services
        .comments
        .list(video_id, params.request()?)
        .await?;
    Ok(ApiResponse::ok(page, "comments fetched successfully"))
}

/// POST /comments/{video_id}
#[tracing::instrument(skip(state, payload))]
pub async fn add<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    CurrentUser(user): CurrentUser,
    Path(video_id): Path<String>,
    payload: Result<Json<ContentBody>, JsonRejection>,
) -> Result<ApiResponse<Comment>, ApiError> {
    let video_id = parse_id("video", &video_id)?;
    let Json(body) = payload?;
    let comment = state
        .services
        .comments
        .add(user, video_id, &body.content)
        .await?;
    Ok(ApiResponse::created(comment, "comment added successfully"))
}

/// PATCH /comments/c/{comment_id}
#[tracing::instrument(skip(state, payload))]
pub async fn update<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    CurrentUser(user): CurrentUser,
    Path(comment_id): Path<String>,
    payload: Result<Json<ContentBody>, JsonRejection>,
) -> Result<ApiResponse<Comment>, ApiError> {
    let comment_id = parse_id("comment", &comment_id)?;
    let content = payload.map(|Json(b)| b.content).unwrap_or_default();
    let comment = state
        .services
        .comments
        .update(user, comment_id, &content)
        .await?;
    Ok(ApiResponse::ok(comment, "comment updated successfully"))
}

/// DELETE /comments/c/{comment_id}
#[tracing::instrument(skip(state))]
pub async fn delete<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    CurrentUser(user): CurrentUser,
    Path(comment_id): Path<String>,
) -> Result<ApiResponse<serde_json::Value>, ApiError> {
    let comment_id = parse_id("comment", &comment_id)?;
    state.services.comments.delete(user, comment_id).await?;
    Ok(ApiResponse::ok(serde_json::json!({}), "comment deleted successfully"))
}
