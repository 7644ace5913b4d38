//! Admin dashboard summary.

use common::PageRequest;
use domain::Order;
use serde::Serialize;
use store::{CatalogStore, OrderStore};

use crate::error::Result;

const RECENT_ORDERS: u32 = 10;

/// Catalog and order counts plus the most recent orders.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_products: u64,
    pub visible_products: u64,
    pub categories_count: u64,
    pub orders_count: u64,
    #[serde(rename = "last10Orders")]
    pub last_orders: Vec<Order>,
}

#[derive(Clone)]
pub struct DashboardService<S> {
    store: S,
}

impl<S: CatalogStore + OrderStore> DashboardService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    #[tracing::instrument(skip(self))]
    pub async fn stats(&self) -> Result<DashboardStats> {
        let (total_products, visible_products, categories_count, orders_count, recent) =
            tokio::try_join!(
                self.store.count_products(false),
                self.store.count_products(true),
                self.store.count_categories(),
                self.store.count_orders(),
                self.store.list_orders(None, PageRequest::new(1, RECENT_ORDERS)),
            )?;

        Ok(DashboardStats {
            total_products,
            visible_products,
            categories_count,
            orders_count,
            last_orders: recent.data,
        })
    }
}
