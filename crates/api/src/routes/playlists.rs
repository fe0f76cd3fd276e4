//! Playlist endpoints under `/playlist`.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use document_store::{Document, DocumentStore};
use domain::Playlist;
use domain::service::playlists::{CreatePlaylist, UpdatePlaylist};

use crate::AppState;
use crate::auth::CurrentUser;
use crate::error::ApiError;
use crate::response::ApiResponse;
use crate::routes::parse_id;

pub fn router<S: DocumentStore + Clone + 'static>() -> Router<Arc<AppState<S>>> {
    Router::new()
        .route("/", post(create::<S>))
        .route(
            "/{playlist_id}",
            get(get_playlist::<S>)
                .patch(update::<S>)
                .delete(delete::<S>),
        )
        .route("/add/{video_id}/{playlist_id}", patch(add_video::<S>))
        .route("/remove/{video_id}/{playlist_id}", patch(remove_video::<S>))
        .route("/user/{user_id}", get(user_playlists::<S>))
}

/// POST /playlist
#[tracing::instrument(skip(state, payload))]
pub async fn create<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    CurrentUser(user): CurrentUser,
    payload: Result<Json<CreatePlaylist>, JsonRejection>,
) -> Result<ApiResponse<Playlist>, ApiError> {
    let Json(request) = payload?;
    let playlist = state.services.playlists.create(user, request).await?;
    Ok(ApiResponse::created(playlist, "playlist created successfully"))
}

/// GET /playlist/{playlist_id}
#[tracing::instrument(skip(state))]
pub async fn get_playlist<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(playlist_id): Path<String>,
) -> Result<ApiResponse<Document>, ApiError> {
    let playlist_id = parse_id("playlist", &playlist_id)?;
    let playlist = state.services.playlists.get(playlist_id).await?;
    Ok(ApiResponse::ok(playlist, "playlist fetched successfully"))
}

/// GET /playlist/user/{user_id}
#[tracing::instrument(skip(state))]
pub async fn user_playlists<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(user_id): Path<String>,
) -> Result<ApiResponse<Vec<Document>>, ApiError> {
    let user = parse_id("user", &user_id)?;
    let playlists = state.services.playlists.user_playlists(user).await?;
    Ok(ApiResponse::ok(playlists, "user playlists fetched successfully"))
}

/// PATCH /playlist/add/{video_id}/{playlist_id}
#[tracing::instrument(skip(state))]
pub async fn add_video<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    CurrentUser(user): CurrentUser,
    Path((video_id, playlist_id)): Path<(String, String)>,
) -> Result<ApiResponse<Playlist>, ApiError> {
    let video = parse_id("video", &video_id)?;
    let playlist = parse_id("playlist", &playlist_id)?;
    let playlist = state
        .services
        .playlists
        .add_video(user, playlist, video)
        .await?;
    Ok(ApiResponse::ok(playlist, "video added to playlist"))
}

/// PATCH /playlist/remove/{video_id}/{playlist_id}
#[tracing::instrument(skip(state))]
pub async fn remove_video<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    CurrentUser(user): CurrentUser,
    Path((video_id, playlist_id)): Path<(String, String)>,
) -> Result<ApiResponse<Playlist>, ApiError> {
    let video = parse_id("video", &video_id)?;
    let playlist = parse_id("playlist", &playlist_id)?;
    let playlist = state
        .services
        .playlists
        .remove_video(user, playlist, video)
        .await?;
    Ok(ApiResponse::ok(playlist, "video removed from playlist"))
}

/// PATCH /playlist/{playlist_id}
#[tracing::instrument(skip(state, payload))]
pub async fn update<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    CurrentUser(user): CurrentUser,
    Path(playlist_id): Path<String>,
    payload: Result<Json<UpdatePlaylist>, JsonRejection>,
) -> Result<ApiResponse<Playlist>, ApiError> {
    let playlist_id = parse_id("playlist", &playlist_id)?;
    let request = payload.map(|Json(r)| r).unwrap_or_default();
    let playlist = state
        .services
        .playlists
        .update(user, playlist_id, request)
        .await?;
    Ok(ApiResponse::ok(playlist, "playlist updated successfully"))
}

/// DELETE /playlist/{playlist_id}
#[tracing::instrument(skip(state))]
pub async fn delete<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    CurrentUser(user): CurrentUser,
    Path(playlist_id): Path<String>,
) -> Result<ApiResponse<serde_json::Value>, ApiError> {
    let playlist_id = parse_id("playlist", &playlist_id)?;
    state.services.playlists.delete(user, playlist_id).await?;
    Ok(ApiResponse::ok(serde_json::json!({}), "playlist deleted successfully"))
}
