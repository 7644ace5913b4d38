//! Order placement and administration endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use common::{OrderId, Page};
use domain::Order;
use shop::{CreateOrderInput, UpdateStatusInput};
use store::Store;

use super::{PageParams, parse_id};
use crate::error::ApiError;
use crate::extract::{AdminUser, AuthUser};
use crate::state::AppState;

/// POST /api/shop/orders: turn a cart into an order owned by the caller.
#[tracing::instrument(skip(state, payload))]
pub async fn create<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    user: AuthUser,
    payload: Result<Json<CreateOrderInput>, JsonRejection>,
) -> Result<(StatusCode, Json<Order>), ApiError> {
    let Json(input) = payload?;
    let order = state.orders.create_from_cart(user.id(), input).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// GET /api/shop/orders
#[tracing::instrument(skip(state))]
pub async fn list_all<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    _admin: AdminUser,
    Query(params): Query<PageParams>,
) -> Result<Json<Page<Order>>, ApiError> {
    Ok(Json(state.orders.list_all(params.request()).await?))
}

/// GET /api/shop/orders/me
#[tracing::instrument(skip(state))]
pub async fn list_mine<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    user: AuthUser,
    Query(params): Query<PageParams>,
) -> Result<Json<Page<Order>>, ApiError> {
    let page = state
        .orders
        .list_for_owner(user.id(), params.request())
        .await?;
    Ok(Json(page))
}

/// GET /api/shop/orders/{id}
#[tracing::instrument(skip(state))]
pub async fn get<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> Result<Json<Order>, ApiError> {
    let id: OrderId = parse_id(&id, "id")?;
    Ok(Json(state.orders.get(id).await?))
}

/// PATCH /api/shop/orders/{id}/status
#[tracing::instrument(skip(state, payload))]
pub async fn set_status<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    _admin: AdminUser,
    Path(id): Path<String>,
    payload: Result<Json<UpdateStatusInput>, JsonRejection>,
) -> Result<Json<Order>, ApiError> {
    let id: OrderId = parse_id(&id, "id")?;
    let Json(input) = payload?;
    Ok(Json(state.orders.set_status(id, input).await?))
}
