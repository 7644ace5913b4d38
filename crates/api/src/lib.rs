//! HTTP API server with observability for the shop backend.
//!
//! Serves the catalog, carts, orders, accounts, dashboard and upload
//! endpoints under `/api`, with structured logging (tracing) and Prometheus
//! metrics at `/metrics`.

pub mod config;
pub mod error;
pub mod extract;
pub mod routes;
pub mod state;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, patch, post, put};
use metrics_exporter_prometheus::PrometheusHandle;
use store::Store;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use state::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: Store>(state: Arc<AppState<S>>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::render))
        .with_state(metrics_handle);

    Router::new()
        .nest("/api", api_routes::<S>())
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

fn api_routes<S: Store>() -> Router<Arc<AppState<S>>> {
    use routes::{auth, carts, catalog, dashboard, health, orders, uploads};

    Router::new()
        .route("/health", get(health::check))
        // Accounts
        .route("/auth/register", post(auth::register::<S>))
        .route("/auth/signin", post(auth::sign_in::<S>))
        .route("/auth/reset-password", post(auth::reset_password::<S>))
        .route("/auth/change-password", post(auth::change_password::<S>))
        // Catalog
        .route(
            "/shop/categories",
            post(catalog::create_category::<S>).get(catalog::list_categories::<S>),
        )
        .route(
            "/shop/categories/{id}",
            put(catalog::update_category::<S>).delete(catalog::delete_category::<S>),
        )
        .route(
            "/shop/products",
            post(catalog::create_product::<S>).get(catalog::list_products::<S>),
        )
        .route("/shop/products/search", get(catalog::search_products::<S>))
        .route(
            "/shop/products/category/{category_id}",
            get(catalog::list_products_by_category::<S>),
        )
        .route(
            "/shop/products/{id}",
            get(catalog::get_product::<S>)
                .put(catalog::update_product::<S>)
                .delete(catalog::delete_product::<S>),
        )
        // Carts
        .route("/shop/cart", post(carts::create::<S>))
        .route(
            "/shop/cart/{id}",
            get(carts::get::<S>)
                .put(carts::replace_items::<S>)
                .delete(carts::delete::<S>),
        )
        // Orders
        .route(
            "/shop/orders",
            post(orders::create::<S>).get(orders::list_all::<S>),
        )
        .route("/shop/orders/me", get(orders::list_mine::<S>))
        .route("/shop/orders/{id}", get(orders::get::<S>))
        .route("/shop/orders/{id}/status", patch(orders::set_status::<S>))
        // Admin
        .route("/dashboard/stats", get(dashboard::stats::<S>))
        .route("/uploads/sign", post(uploads::sign::<S>))
}
