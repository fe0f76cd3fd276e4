//! Tweet endpoints under `/tweets`.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use document_store::{Document, DocumentStore};
use domain::Tweet;

use crate::AppState;
use crate::auth::CurrentUser;
use crate::error::ApiError;
use crate::response::ApiResponse;
use crate::routes::{ContentBody, parse_id};

pub fn router<S: DocumentStore + Clone + 'static>() -> Router<Arc<AppState<S>>> {
    Router::new()
        .route("/", post(create::<S>))
        .route("/user/{user_id}", get(user_tweets::<S>))
        .route("/{tweet_id}", patch(update::<S>).delete(delete::<S>))
}

/// POST /tweets
#[tracing::instrument(skip(state, payload))]
pub async fn create<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    CurrentUser(user): CurrentUser,
    payload: Result<Json<ContentBody>, JsonRejection>,
) -> Result<ApiResponse<Tweet>, ApiError> {
    let Json(body) = payload?;
    let tweet = state.services.tweets.create(user, &body.content).await?;
    Ok(ApiResponse::created(tweet, "tweet created successfully"))
}

/// GET /tweets/user/{user_id}
#[tracing::instrument(skip(state))]
pub async fn user_tweets<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(user_id): Path<String>,
) -> Result<ApiResponse<Vec<Document>>, ApiError> {
    let user = parse_id("user", &user_id)?;
    let tweets = state.services.tweets.user_tweets(user).await?;
    Ok(ApiResponse::ok(tweets, "tweets fetched successfully"))
}

/// PATCH /tweets/{tweet_id}
#[tracing::instrument(skip(state, payload))]
pub async fn update<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    CurrentUser(user): CurrentUser,
    Path(tweet_id): Path<String>,
    payload: Result<Json<ContentBody>, JsonRejection>,
) -> Result<ApiResponse<Tweet>, ApiError> {
    let tweet_id = parse_id("tweet", &tweet_id)?;
    let content = payload.map(|Json(b)| b.content).unwrap_or_default();
    let tweet = state
        .services
        .tweets
        .update(user, tweet_id, &content)
        .await?;
    Ok(ApiResponse::ok(tweet, "tweet updated successfully"))
}

/// DELETE /tweets/{tweet_id}
#[tracing::instrument(skip(state))]
pub async fn delete<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    CurrentUser(user): CurrentUser,
    Path(tweet_id): Path<String>,
) -> Result<ApiResponse<serde_json::Value>, ApiError> {
    let tweet_id = parse_id("tweet", &tweet_id)?;
    state.services.tweets.delete(user, tweet_id).await?;
    Ok(ApiResponse::ok(serde_json::json!({}), "tweet deleted successfully"))
}
