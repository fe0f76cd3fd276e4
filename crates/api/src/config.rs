//! Application configuration loaded from environment variables.

use std::path::PathBuf;

use axum::http::HeaderValue;
use chrono::Duration;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default: `"0.0.0.0"`)
/// - `PORT`: listen port (default: `8000`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `DATABASE_URL`: Postgres connection string; unset runs on the in-memory store
/// - `CORS_ORIGIN`: allowed origin, `*` for any (default: `"*"`)
/// - `MEDIA_DIR`: where uploaded assets are kept (default: `"./public/media"`)
/// - `MEDIA_BASE_URL`: public prefix of asset URLs (default: `"http://localhost:8000/media"`)
/// - `UPLOAD_DIR`: staging directory for multipart uploads (default: `"./public/temp"`)
/// - `MAX_UPLOAD_BYTES`: request body cap for uploads (default: 100 MiB)
/// - `ACCESS_TOKEN_SECRET` / `REFRESH_TOKEN_SECRET`: JWT signing secrets
/// - `ACCESS_TOKEN_TTL_SECS` / `REFRESH_TOKEN_TTL_SECS`: session lifetimes (1 and 10 days)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub database_url: Option<String>,
    pub cors_origin: String,
    pub media_dir: PathBuf,
    pub media_base_url: String,
    pub upload_dir: PathBuf,
    pub max_upload_bytes: usize,
    pub access_token_secret: String,
    pub refresh_token_secret: String,
    pub access_token_ttl: Duration,
    pub refresh_token_ttl: Duration,
}

const DEV_ACCESS_TOKEN_SECRET: &str = "dev-access-token-secret";
const DEV_REFRESH_TOKEN_SECRET: &str = "dev-refresh-token-secret";

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("HOST").unwrap_or(defaults.host),
            port: parsed("PORT").unwrap_or(defaults.port),
            log_level: std::env::var("RUST_LOG").unwrap_or(defaults.log_level),
            database_url: std::env::var("DATABASE_URL")
                .ok()
                .filter(|url| !url.trim().is_empty()),
            cors_origin: std::env::var("CORS_ORIGIN").unwrap_or(defaults.cors_origin),
            media_dir: std::env::var("MEDIA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.media_dir),
            media_base_url: std::env::var("MEDIA_BASE_URL").unwrap_or(defaults.media_base_url),
            upload_dir: std::env::var("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.upload_dir),
            max_upload_bytes: parsed("MAX_UPLOAD_BYTES").unwrap_or(defaults.max_upload_bytes),
            access_token_secret: secret("ACCESS_TOKEN_SECRET")
                .unwrap_or(defaults.access_token_secret),
            refresh_token_secret: secret("REFRESH_TOKEN_SECRET")
                .unwrap_or(defaults.refresh_token_secret),
            access_token_ttl: parsed("ACCESS_TOKEN_TTL_SECS")
                .map(Duration::seconds)
                .unwrap_or(defaults.access_token_ttl),
            refresh_token_ttl: parsed("REFRESH_TOKEN_TTL_SECS")
                .map(Duration::seconds)
                .unwrap_or(defaults.refresh_token_ttl),
        }
    }

    /// True when either signing secret is the built-in development value.
    pub fn uses_dev_secrets(&self) -> bool {
        self.access_token_secret == DEV_ACCESS_TOKEN_SECRET
            || self.refresh_token_secret == DEV_REFRESH_TOKEN_SECRET
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// CORS policy for `cors_origin`. An unparsable origin falls back to any.
    pub fn cors_layer(&self) -> CorsLayer {
        let origin = match self.cors_origin.trim() {
            "*" | "" => AllowOrigin::any(),
            origin => match HeaderValue::from_str(origin) {
                Ok(value) => AllowOrigin::exact(value),
                Err(_) => {
                    tracing::warn!(%origin, "invalid CORS_ORIGIN, allowing any origin");
                    AllowOrigin::any()
                }
            },
        };
        CorsLayer::new()
            .allow_origin(origin)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

fn parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

fn secret(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            log_level: "info".to_string(),
            database_url: None,
            cors_origin: "*".to_string(),
            media_dir: PathBuf::from("./public/media"),
            media_base_url: "http://localhost:8000/media".to_string(),
            upload_dir: PathBuf::from("./public/temp"),
            max_upload_bytes: crate::DEFAULT_UPLOAD_LIMIT,
            access_token_secret: DEV_ACCESS_TOKEN_SECRET.to_string(),
            refresh_token_secret: DEV_REFRESH_TOKEN_SECRET.to_string(),
            access_token_ttl: Duration::days(1),
            refresh_token_ttl: Duration::days(10),
        }
    }
}
