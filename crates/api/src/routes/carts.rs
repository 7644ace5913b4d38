//! Shopping cart endpoints. Carts are anonymous; no token is required.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::CartId;
use domain::Cart;
use shop::CartInput;
use store::Store;

use super::parse_id;
use crate::error::ApiError;
use crate::state::AppState;

/// POST /api/shop/cart
#[tracing::instrument(skip(state, payload))]
pub async fn create<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    payload: Result<Json<CartInput>, JsonRejection>,
) -> Result<(StatusCode, Json<Cart>), ApiError> {
    let Json(input) = payload?;
    let cart = state.carts.create(input).await?;
    Ok((StatusCode::CREATED, Json(cart)))
}

/// GET /api/shop/cart/{id}
#[tracing::instrument(skip(state))]
pub async fn get<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<Cart>, ApiError> {
    let id: CartId = parse_id(&id, "id")?;
    Ok(Json(state.carts.get(id).await?))
}

/// PUT /api/shop/cart/{id}: replace every line of the cart.
#[tracing::instrument(skip(state, payload))]
pub async fn replace_items<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    payload: Result<Json<CartInput>, JsonRejection>,
) -> Result<Json<Cart>, ApiError> {
    let id: CartId = parse_id(&id, "id")?;
    let Json(input) = payload?;
    Ok(Json(state.carts.replace_items(id, input).await?))
}

/// DELETE /api/shop/cart/{id}
#[tracing::instrument(skip(state))]
pub async fn delete<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id: CartId = parse_id(&id, "id")?;
    state.carts.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
