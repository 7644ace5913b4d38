//! Health check endpoint.

use axum::Json;
use serde::Serialize;

#[derive(Serialize)]
pub struct HealthResponse {
    pub ok: bool,
}

/// GET /api/health: liveness check.
pub async fn check() -> Json<HealthResponse> {
    Json(HealthResponse { ok: true })
}
