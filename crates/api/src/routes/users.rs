//! Account, session and channel endpoints under `/users`.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, Path, State};
use axum::http::HeaderMap;
use axum::http::header::SET_COOKIE;
use axum::response::{AppendHeaders, IntoResponse};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use document_store::{Document, DocumentStore};
use domain::{DomainError, TokenPair};
use domain::service::users::{
    ChangePassword, LoggedIn, LoginRequest, RegisterUser, UpdateAccount, UserProfile,
};
use serde::Deserialize;

use crate::AppState;
use crate::auth::{ACCESS_TOKEN_COOKIE, CurrentUser, REFRESH_TOKEN_COOKIE, Viewer, cookie};
use crate::error::ApiError;
use crate::response::ApiResponse;
use crate::upload::UploadForm;

pub fn router<S: DocumentStore + Clone + 'static>() -> Router<Arc<AppState<S>>> {
    Router::new()
        .route("/register", post(register::<S>))
        .route("/login", post(login::<S>))
        .route("/logout", post(logout::<S>))
        .route("/refresh-token", post(refresh_token::<S>))
        .route("/change-password", post(change_password::<S>))
        .route("/current-user", get(current_user::<S>))
        .route("/update-account", patch(update_account::<S>))
        .route("/avatar", patch(update_avatar::<S>))
        .route("/cover-image", patch(update_cover_image::<S>))
        .route("/c/{username}", get(channel_profile::<S>))
        .route("/history", get(watch_history::<S>))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: Option<String>,
}

fn session_cookies(tokens: &TokenPair) -> AppendHeaders<[(axum::http::HeaderName, String); 2]> {
    AppendHeaders([
        (
            SET_COOKIE,
            format!("{ACCESS_TOKEN_COOKIE}={}; HttpOnly; Secure; Path=/", tokens.access_token),
        ),
        (
            SET_COOKIE,
            format!("{REFRESH_TOKEN_COOKIE}={}; HttpOnly; Secure; Path=/", tokens.refresh_token),
        ),
    ])
}

fn cleared_cookies() -> AppendHeaders<[(axum::http::HeaderName, String); 2]> {
    AppendHeaders([
        (SET_COOKIE, format!("{ACCESS_TOKEN_COOKIE}=; HttpOnly; Secure; Path=/; Max-Age=0")),
        (SET_COOKIE, format!("{REFRESH_TOKEN_COOKIE}=; HttpOnly; Secure; Path=/; Max-Age=0")),
    ])
}

/// POST /users/register: multipart with `avatar` and optional `coverImage` files.
#[tracing::instrument(skip(state, payload))]
pub async fn register<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    payload: Result<Multipart, MultipartRejection>,
) -> Result<ApiResponse<UserProfile>, ApiError> {
    let form = UploadForm::read(payload?, &state.staging_dir).await?;
    let request = RegisterUser {
        full_name: form.text("fullName"),
        username: form.text("username"),
        email: form.text("email"),
        password: form.text("password"),
        avatar: form.file("avatar"),
        cover_image: form.file("coverImage"),
    };
    let registered = state.services.users.register(request).await;
    form.discard().await;
    Ok(ApiResponse::created(registered?, "user registered successfully"))
}

/// POST /users/login: also sets the session cookies.
#[tracing::instrument(skip(state, payload))]
pub async fn login<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = payload?;
    let logged_in: LoggedIn = state.services.users.login(request).await?;
    let cookies = session_cookies(&logged_in.tokens);
    Ok((cookies, ApiResponse::ok(logged_in, "user logged in successfully")))
}

/// POST /users/logout
#[tracing::instrument(skip(state))]
pub async fn logout<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    CurrentUser(user): CurrentUser,
) -> Result<impl IntoResponse, ApiError> {
    state.services.users.logout(user).await?;
    Ok((
        cleared_cookies(),
        ApiResponse::ok(serde_json::json!({}), "user logged out"),
    ))
}

/// POST /users/refresh-token: token from the body or the `refreshToken` cookie.
#[tracing::instrument(skip(state, headers, body))]
pub async fn refresh_token<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let from_body = if body.is_empty() {
        RefreshRequest::default()
    } else {
        serde_json::from_slice::<RefreshRequest>(&body)
            .map_err(|e| ApiError::BadRequest(format!("invalid request body: {e}")))?
    };
    let token = from_body
        .refresh_token
        .or_else(|| cookie(&headers, REFRESH_TOKEN_COOKIE))
        .ok_or_else(|| ApiError::Unauthorized("unauthorized request".to_string()))?;

    let tokens = state.services.users.refresh(&token).await?;
    Ok((
        session_cookies(&tokens),
        ApiResponse::ok(tokens, "access token refreshed"),
    ))
}

/// POST /users/change-password
#[tracing::instrument(skip(state, payload))]
pub async fn change_password<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    CurrentUser(user): CurrentUser,
    payload: Result<Json<ChangePassword>, JsonRejection>,
) -> Result<ApiResponse<serde_json::Value>, ApiError> {
    let Json(request) = payload?;
    state.services.users.change_password(user, request).await?;
    Ok(ApiResponse::ok(
        serde_json::json!({}),
        "password changed successfully",
    ))
}

/// GET /users/current-user
#[tracing::instrument(skip(state))]
pub async fn current_user<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    CurrentUser(user): CurrentUser,
) -> Result<ApiResponse<Document>, ApiError> {
    let profile = state.services.users.current_user(user).await?;
    Ok(ApiResponse::ok(profile, "current user fetched successfully"))
}

/// PATCH /users/update-account
#[tracing::instrument(skip(state, payload))]
pub async fn update_account<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    CurrentUser(user): CurrentUser,
    payload: Result<Json<UpdateAccount>, JsonRejection>,
) -> Result<ApiResponse<UserProfile>, ApiError> {
    let Json(request) = payload?;
    let profile = state.services.users.update_account(user, request).await?;
    Ok(ApiResponse::ok(profile, "account details updated successfully"))
}

/// PATCH /users/avatar: multipart with an `avatar` file.
#[tracing::instrument(skip(state, payload))]
pub async fn update_avatar<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    CurrentUser(user): CurrentUser,
    payload: Result<Multipart, MultipartRejection>,
) -> Result<ApiResponse<UserProfile>, ApiError> {
    let form = UploadForm::read(payload?, &state.staging_dir).await?;
    let updated = match form.file("avatar") {
        Some(file) => state.services.users.update_avatar(user, &file).await,
        None => Err(DomainError::invalid("avatar file is missing")),
    };
    form.discard().await;
    Ok(ApiResponse::ok(updated?, "avatar updated successfully"))
}

/// PATCH /users/cover-image: multipart with a `coverImage` file.
#[tracing::instrument(skip(state, payload))]
pub async fn update_cover_image<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    CurrentUser(user): CurrentUser,
    payload: Result<Multipart, MultipartRejection>,
) -> Result<ApiResponse<UserProfile>, ApiError> {
    let form = UploadForm::read(payload?, &state.staging_dir).await?;
    let updated = match form.file("coverImage") {
        Some(file) => state.services.users.update_cover_image(user, &file).await,
        None => Err(DomainError::invalid("cover image file is missing")),
    };
    form.discard().await;
    Ok(ApiResponse::ok(updated?, "cover image updated successfully"))
}

/// GET /users/c/{username}
#[tracing::instrument(skip(state))]
pub async fn channel_profile<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Viewer(viewer): Viewer,
    Path(username): Path<String>,
) -> Result<ApiResponse<Document>, ApiError> {
    let channel = state
        .services
        .users
        .channel_profile(&username, viewer)
        .await?;
    Ok(ApiResponse::ok(channel, "user channel fetched successfully"))
}

/// GET /users/history
#[tracing::instrument(skip(state))]
pub async fn watch_history<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    CurrentUser(user): CurrentUser,
) -> Result<ApiResponse<Vec<Document>>, ApiError> {
    let history = state.services.users.watch_history(user).await?;
    Ok(ApiResponse::ok(history, "watch history fetched successfully"))
}
