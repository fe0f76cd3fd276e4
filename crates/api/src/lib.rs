//! HTTP API server with observability for the video platform.
//!
//! Provides REST endpoints under `/api/v1` for users, videos, comments,
//! likes, subscriptions, playlists, tweets and the channel dashboard, with
//! structured logging (tracing) and Prometheus metrics.

pub mod auth;
pub mod config;
pub mod error;
pub mod response;
pub mod routes;
pub mod upload;

use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use document_store::DocumentStore;
use domain::{JwtSessionService, Services, SessionService};
use media::BlobStore;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use config::Config;

/// Default cap on a request body, which bounds a single upload.
pub const DEFAULT_UPLOAD_LIMIT: usize = 100 * 1024 * 1024;

/// Shared application state accessible from all handlers.
pub struct AppState<S: DocumentStore + Clone> {
    pub services: Services<S>,
    /// Where multipart file parts are written before they are uploaded.
    pub staging_dir: PathBuf,
    pub upload_limit: usize,
}

impl<S: DocumentStore + Clone> AppState<S> {
    pub fn new(store: S, blobs: Arc<dyn BlobStore>, sessions: Arc<dyn SessionService>) -> Self {
        Self {
            services: Services::new(store, blobs, sessions),
            staging_dir: std::env::temp_dir().join("video-platform-uploads"),
            upload_limit: DEFAULT_UPLOAD_LIMIT,
        }
    }

    pub fn with_uploads(mut self, staging_dir: impl Into<PathBuf>, upload_limit: usize) -> Self {
        self.staging_dir = staging_dir.into();
        self.upload_limit = upload_limit;
        self
    }
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: DocumentStore + Clone + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
    cors: CorsLayer,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    let api = Router::new()
        .route("/healthcheck", get(routes::health::healthcheck))
        .nest("/users", routes::users::router::<S>())
        .nest("/videos", routes::videos::router::<S>())
        .nest("/comments", routes::comments::router::<S>())
        .nest("/likes", routes::likes::router::<S>())
        .nest("/subscriptions", routes::subscriptions::router::<S>())
        .nest("/playlist", routes::playlists::router::<S>())
        .nest("/tweets", routes::tweets::router::<S>())
        .nest("/dashboard", routes::dashboard::router::<S>());
    let upload_limit = state.upload_limit;

    Router::new()
        .route("/health", get(routes::health::check))
        .nest("/api/v1", api)
        .layer(DefaultBodyLimit::max(upload_limit))
        .with_state(state)
        .merge(metrics_router)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Creates the application state with JWT sessions and upload staging from `config`.
pub fn create_state<S: DocumentStore + Clone + 'static>(
    store: S,
    blobs: Arc<dyn BlobStore>,
    config: &Config,
) -> Arc<AppState<S>> {
    let sessions =
        JwtSessionService::new(&config.access_token_secret, &config.refresh_token_secret)
            .with_ttls(config.access_token_ttl, config.refresh_token_ttl);
    let state = AppState::new(store, blobs, Arc::new(sessions))
        .with_uploads(&config.upload_dir, config.max_upload_bytes);
    Arc::new(state)
}

/// Serves uploaded assets from `config.media_dir` under `/media`.
pub fn with_media(app: Router, config: &Config) -> Router {
    app.nest_service("/media", ServeDir::new(&config.media_dir))
}
