//! Category and product endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use common::{CategoryId, Page, ProductId};
use domain::{Category, Product};
use serde::Deserialize;
use shop::{CategoryInput, ProductInput};
use store::Store;

use super::{PageParams, parse_id};
use crate::error::ApiError;
use crate::extract::AdminUser;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct CategoryListParams {
    /// Present (with any value) to get every category as a plain array.
    pub all: Option<String>,
    #[serde(flatten)]
    pub page: PageParams,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
    #[serde(flatten)]
    pub page: PageParams,
}

// -- Categories --

/// POST /api/shop/categories
#[tracing::instrument(skip(state, payload))]
pub async fn create_category<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    _admin: AdminUser,
    payload: Result<Json<CategoryInput>, JsonRejection>,
) -> Result<(StatusCode, Json<Category>), ApiError> {
    let Json(input) = payload?;
    let category = state.catalog.create_category(input).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

/// PUT /api/shop/categories/{id}
#[tracing::instrument(skip(state, payload))]
pub async fn update_category<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    _admin: AdminUser,
    Path(id): Path<String>,
    payload: Result<Json<CategoryInput>, JsonRejection>,
) -> Result<Json<Category>, ApiError> {
    let id: CategoryId = parse_id(&id, "id")?;
    let Json(input) = payload?;
    Ok(Json(state.catalog.update_category(id, input).await?))
}

/// DELETE /api/shop/categories/{id}
#[tracing::instrument(skip(state))]
pub async fn delete_category<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id: CategoryId = parse_id(&id, "id")?;
    state.catalog.delete_category(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/shop/categories
///
/// `?all` returns every category as an array; otherwise one page.
#[tracing::instrument(skip(state))]
pub async fn list_categories<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Query(params): Query<CategoryListParams>,
) -> Result<Response, ApiError> {
    if params.all.is_some() {
        let categories = state.catalog.all_categories().await?;
        return Ok(Json(categories).into_response());
    }
    let page = state.catalog.list_categories(params.page.request()).await?;
    Ok(Json(page).into_response())
}

// -- Products --

/// POST /api/shop/products
#[tracing::instrument(skip(state, payload))]
pub async fn create_product<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    _admin: AdminUser,
    payload: Result<Json<ProductInput>, JsonRejection>,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    let Json(input) = payload?;
    let product = state.catalog.create_product(input).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// PUT /api/shop/products/{id}
#[tracing::instrument(skip(state, payload))]
pub async fn update_product<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    _admin: AdminUser,
    Path(id): Path<String>,
    payload: Result<Json<ProductInput>, JsonRejection>,
) -> Result<Json<Product>, ApiError> {
    let id: ProductId = parse_id(&id, "id")?;
    let Json(input) = payload?;
    Ok(Json(state.catalog.update_product(id, input).await?))
}

/// DELETE /api/shop/products/{id}
#[tracing::instrument(skip(state))]
pub async fn delete_product<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id: ProductId = parse_id(&id, "id")?;
    state.catalog.delete_product(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/shop/products/{id}
#[tracing::instrument(skip(state))]
pub async fn get_product<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<Product>, ApiError> {
    let id: ProductId = parse_id(&id, "id")?;
    Ok(Json(state.catalog.get_product(id).await?))
}

/// GET /api/shop/products
#[tracing::instrument(skip(state))]
pub async fn list_products<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Query(params): Query<PageParams>,
) -> Result<Json<Page<Product>>, ApiError> {
    Ok(Json(state.catalog.list_products(params.request()).await?))
}

/// GET /api/shop/products/category/{categoryId}
#[tracing::instrument(skip(state))]
pub async fn list_products_by_category<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(category_id): Path<String>,
    Query(params): Query<PageParams>,
) -> Result<Json<Page<Product>>, ApiError> {
    let category_id: CategoryId = parse_id(&category_id, "categoryId")?;
    let page = state
        .catalog
        .list_products_by_category(category_id, params.request())
        .await?;
    Ok(Json(page))
}

/// GET /api/shop/products/search?q=
#[tracing::instrument(skip(state))]
pub async fn search_products<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Page<Product>>, ApiError> {
    let term = params.q.as_deref().unwrap_or_default();
    let page = state
        .catalog
        .search_products(term, params.page.request())
        .await?;
    Ok(Json(page))
}
