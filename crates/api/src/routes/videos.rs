//! Video endpoints under `/videos`.

use std::sync::Arc;

use axum::Router;
use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Multipart, Path, Query, State};
use axum::routing::{get, patch};
use document_store::{Document, DocumentStore};
use domain::Video;
use domain::service::videos::{PublishVideo, UpdateVideo};
use read_model::{Page, PageRequest, SortDirection, VideoFeedQuery};
use serde::Deserialize;

use crate::AppState;
use crate::auth::{CurrentUser, Viewer};
use crate::error::ApiError;
use crate::response::ApiResponse;
use crate::routes::parse_id;
use crate::upload::UploadForm;

pub fn router<S: DocumentStore + Clone + 'static>() -> Router<Arc<AppState<S>>> {
    Router::new()
        .route("/", get(feed::<S>).post(publish::<S>))
        .route(
            "/{video_id}",
            get(watch::<S>).patch(update::<S>).delete(delete::<S>),
        )
        .route("/toggle/publish/{video_id}", patch(toggle_publish::<S>))
}

/// `GET /videos` query string.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub query: Option<String>,
    pub sort_by: Option<String>,
    pub sort_type: Option<String>,
    pub user_id: Option<String>,
}

impl FeedParams {
    fn into_query(self) -> Result<VideoFeedQuery, ApiError> {
        let sort_type = match self.sort_type.as_deref() {
            Some(raw) if !raw.trim().is_empty() => raw.parse::<SortDirection>()?,
            _ => SortDirection::default(),
        };
        let user_id = match self.user_id.as_deref() {
            Some(raw) if !raw.trim().is_empty() => Some(parse_id("user", raw)?),
            _ => None,
        };
        Ok(VideoFeedQuery {
            query: self.query,
            sort_by: self.sort_by,
            sort_type,
            user_id,
            page: PageRequest::from_params(self.page, self.limit)?,
        })
    }
}

/// GET /videos: published videos, searchable and sortable.
#[tracing::instrument(skip(state))]
pub async fn feed<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    params: Result<Query<FeedParams>, QueryRejection>,
) -> Result<ApiResponse<Page<Document>>, ApiError> {
    let Query(params) = params?;
    let page = state.services.videos.feed(&params.into_query()?).await?;
    Ok(ApiResponse::ok(page, "videos fetched successfully"))
}

/// POST /videos: multipart with `videoFile` and `thumbnail` files.
#[tracing::instrument(skip(state, payload))]
pub async fn publish<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    CurrentUser(user): CurrentUser,
    payload: Result<Multipart, MultipartRejection>,
) -> Result<ApiResponse<Video>, ApiError> {
    let form = UploadForm::read(payload?, &state.staging_dir).await?;
    let request = PublishVideo {
        title: form.text("title"),
        description: form.text("description"),
        video_file: form.file("videoFile"),
        thumbnail: form.file("thumbnail"),
    };
    let published = state.services.videos.publish(user, request).await;
    form.discard().await;
    Ok(ApiResponse::created(published?, "video published successfully"))
}

/// GET /videos/{video_id}: counts a view.
#[tracing::instrument(skip(state))]
pub async fn watch<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Viewer(viewer): Viewer,
    Path(video_id): Path<String>,
) -> Result<ApiResponse<Document>, ApiError> {
    let video_id = parse_id("video", &video_id)?;
    let video = state.services.videos.watch(video_id, viewer).await?;
    Ok(ApiResponse::ok(video, "video fetched successfully"))
}

/// PATCH /videos/{video_id}: multipart with an optional `thumbnail` file.
#[tracing::instrument(skip(state, payload))]
pub async fn update<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    CurrentUser(user): CurrentUser,
    Path(video_id): Path<String>,
    payload: Result<Multipart, MultipartRejection>,
) -> Result<ApiResponse<Video>, ApiError> {
    let video_id = parse_id("video", &video_id)?;
    // Ownership is checked before the body, so a bad body from a non-owner is still 403.
    let form = match payload {
        Ok(multipart) => UploadForm::read(multipart, &state.staging_dir)
            .await
            .unwrap_or_default(),
        Err(_) => UploadForm::default(),
    };
    let request = UpdateVideo {
        title: form.text("title"),
        description: form.text("description"),
        thumbnail: form.file("thumbnail"),
    };
    let updated = state.services.videos.update(user, video_id, request).await;
    form.discard().await;
    Ok(ApiResponse::ok(updated?, "video updated successfully"))
}

/// DELETE /videos/{video_id}
#[tracing::instrument(skip(state))]
pub async fn delete<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    CurrentUser(user): CurrentUser,
    Path(video_id): Path<String>,
) -> Result<ApiResponse<serde_json::Value>, ApiError> {
    let video_id = parse_id("video", &video_id)?;
    state.services.videos.delete(user, video_id).await?;
    Ok(ApiResponse::ok(serde_json::json!({}), "video deleted successfully"))
}

/// PATCH /videos/toggle/publish/{video_id}
#[tracing::instrument(skip(state))]
pub async fn toggle_publish<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    CurrentUser(user): CurrentUser,
    Path(video_id): Path<String>,
) -> Result<ApiResponse<Video>, ApiError> {
    let video_id = parse_id("video", &video_id)?;
    let video = state.services.videos.toggle_publish(user, video_id).await?;
    Ok(ApiResponse::ok(video, "publish status toggled"))
}
