//! Admin dashboard endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use shop::DashboardStats;
use store::Store;

use crate::error::ApiError;
use crate::extract::AdminUser;
use crate::state::AppState;

/// GET /api/dashboard/stats
#[tracing::instrument(skip(state))]
pub async fn stats<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    _admin: AdminUser,
) -> Result<Json<DashboardStats>, ApiError> {
    Ok(Json(state.dashboard.stats().await?))
}
