//! Health check endpoint.

use axum::Json;
use serde::Serialize;

use crate::response::ApiResponse;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// GET /health: returns system health status.
pub async fn check() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// GET /api/v1/healthcheck: the same, in the response envelope.
pub async fn healthcheck() -> ApiResponse<HealthResponse> {
    ApiResponse::ok(HealthResponse { status: "ok" }, "health check passed")
}
