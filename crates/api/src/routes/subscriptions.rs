//! Subscription endpoints under `/subscriptions`.

use std::sync::Arc;

use axum::Router;
use axum::extract::{Path, State};
use axum::routing::get;
use document_store::{Document, DocumentStore};
use serde::Serialize;

use crate::AppState;
use crate::auth::CurrentUser;
use crate::error::ApiError;
use crate::response::ApiResponse;
use crate::routes::parse_id;

pub fn router<S: DocumentStore + Clone + 'static>() -> Router<Arc<AppState<S>>> {
    Router::new()
        .route(
            "/c/{channel_id}",
            get(channel_subscribers::<S>).post(toggle::<S>),
        )
        .route("/u/{subscriber_id}", get(subscribed_channels::<S>))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionState {
    pub subscribed: bool,
}

/// POST /subscriptions/c/{channel_id}
#[tracing::instrument(skip(state))]
pub async fn toggle<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    CurrentUser(user): CurrentUser,
    Path(channel_id): Path<String>,
) -> Result<ApiResponse<SubscriptionState>, ApiError> {
    let channel = parse_id("channel", &channel_id)?;
    let outcome = state.services.subscriptions.toggle(user, channel).await?;
    let message = if outcome.is_present() {
        "subscribed successfully"
    } else {
        "unsubscribed successfully"
    };
    Ok(ApiResponse::ok(
        SubscriptionState {
            subscribed: outcome.is_present(),
        },
        message,
    ))
}

/// GET /subscriptions/c/{channel_id}
#[tracing::instrument(skip(state))]
pub async fn channel_subscribers<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(channel_id): Path<String>,
) -> Result<ApiResponse<Vec<Document>>, ApiError> {
    let channel = parse_id("channel", &channel_id)?;
    let subscribers = state
        .services
        .subscriptions
        .channel_subscribers(channel)
        .await?;
    Ok(ApiResponse::ok(subscribers, "subscribers fetched successfully"))
}

/// GET /subscriptions/u/{subscriber_id}
#[tracing::instrument(skip(state))]
pub async fn subscribed_channels<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(subscriber_id): Path<String>,
) -> Result<ApiResponse<Vec<Document>>, ApiError> {
    let subscriber = parse_id("subscriber", &subscriber_id)?;
    let channels = state
        .services
        .subscriptions
        .subscribed_channels(subscriber)
        .await?;
    Ok(ApiResponse::ok(channels, "subscribed channels fetched successfully"))
}
