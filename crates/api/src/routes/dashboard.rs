//! Channel dashboard of the signed-in user.

use std::sync::Arc;

use axum::Router;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::routing::get;
use document_store::{Document, DocumentStore};
use read_model::{ChannelStats, Page};

use crate::AppState;
use crate::auth::CurrentUser;
use crate::error::ApiError;
use crate::response::ApiResponse;
use crate::routes::PageParams;

pub fn router<S: DocumentStore + Clone + 'static>() -> Router<Arc<AppState<S>>> {
    Router::new()
        .route("/stats", get(stats::<S>))
        .route("/videos", get(videos::<S>))
}

/// GET /dashboard/stats
#[tracing::instrument(skip(state))]
pub async fn stats<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    CurrentUser(user): CurrentUser,
) -> Result<ApiResponse<ChannelStats>, ApiError> {
    let stats = state.services.dashboard.channel_stats(user).await?;
    Ok(ApiResponse::ok(stats, "channel stats fetched successfully"))
}

/// GET /dashboard/videos?page=&limit=
#[tracing::instrument(skip(state))]
pub async fn videos<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    CurrentUser(user): CurrentUser,
    params: Result<Query<PageParams>, QueryRejection>,
) -> Result<ApiResponse<Page<Document>>, ApiError> {
    let Query(params) = params?;
    let page = state
        .services
        .dashboard
        .channel_videos(user, params.request()?)
        .await?;
    Ok(ApiResponse::ok(page, "channel videos fetched successfully"))
}
