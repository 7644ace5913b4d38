//! Shared application state.

use std::sync::Arc;

use shop::{
    AccountService, CartService, CatalogService, DashboardService, OrderService, TokenIssuer,
    UploadService,
};
use store::Store;

/// Services shared by all handlers, built over one store handle.
pub struct AppState<S: Store> {
    pub catalog: CatalogService<S>,
    pub carts: CartService<S>,
    pub orders: OrderService<S>,
    pub accounts: AccountService<S>,
    pub dashboard: DashboardService<S>,
    pub uploads: UploadService,
    pub tokens: Arc<TokenIssuer>,
}

impl<S: Store> AppState<S> {
    pub fn new(store: S, tokens: Arc<TokenIssuer>, uploads: UploadService) -> Self {
        Self {
            catalog: CatalogService::new(store.clone()),
            carts: CartService::new(store.clone()),
            orders: OrderService::new(store.clone()),
            accounts: AccountService::new(store.clone(), tokens.clone()),
            dashboard: DashboardService::new(store),
            uploads,
            tokens,
        }
    }
}
