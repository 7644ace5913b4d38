use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{CartId, CategoryId, OrderId, Page, PageRequest, ProductId, UserId};
use domain::{
    Cart, CartItem, Category, Money, Order, OrderItem, OrderStatus, Product, Quantity, User,
};
use tokio::sync::RwLock;

use crate::{
    ProductQuery, Result, StoreError,
    store::{CartStore, CatalogStore, OrderStore, UserStore},
};

/// In-memory store implementation for testing and local development.
///
/// Lines keep only the IDs of the products they reference and resolve them
/// on every read, so deleting a product or category behaves like the
/// `ON DELETE SET NULL` foreign keys of the PostgreSQL schema.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<State>>,
}

#[derive(Default)]
struct State {
    users: HashMap<UserId, User>,
    categories: HashMap<CategoryId, Category>,
    products: HashMap<ProductId, Product>,
    carts: HashMap<CartId, CartRecord>,
    orders: HashMap<OrderId, OrderRecord>,
}

struct CartRecord {
    id: CartId,
    lines: Vec<(Option<ProductId>, Quantity)>,
    total_amount: Money,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

struct OrderRecord {
    id: OrderId,
    user_id: Option<UserId>,
    lines: Vec<(Option<ProductId>, Quantity, Money)>,
    total_amount: Money,
    status: OrderStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl CartRecord {
    fn from_cart(cart: &Cart) -> Self {
        Self {
            id: cart.id(),
            lines: cart
                .items()
                .iter()
                .map(|item| (item.product_id(), item.quantity))
                .collect(),
            total_amount: cart.total_amount(),
            created_at: cart.created_at(),
            updated_at: cart.updated_at(),
        }
    }
}

impl OrderRecord {
    fn from_order(order: &Order) -> Self {
        Self {
            id: order.id(),
            user_id: order.user_id(),
            lines: order
                .items()
                .iter()
                .map(|item| (item.product_id(), item.quantity, item.unit_price))
                .collect(),
            total_amount: order.total_amount(),
            status: order.status(),
            created_at: order.created_at(),
            updated_at: order.updated_at(),
        }
    }
}

impl State {
    fn resolve_product(&self, id: Option<ProductId>) -> Option<Product> {
        let mut product = self.products.get(&id?)?.clone();
        product.category = product
            .category_id()
            .and_then(|id| self.categories.get(&id).cloned());
        Some(product)
    }

    fn resolve_cart(&self, record: &CartRecord) -> Cart {
        let items = record
            .lines
            .iter()
            .map(|(product_id, quantity)| {
                CartItem::new(self.resolve_product(*product_id), *quantity)
            })
            .collect();
        Cart::restore(
            record.id,
            items,
            record.total_amount,
            record.created_at,
            record.updated_at,
        )
    }

    fn resolve_order(&self, record: &OrderRecord) -> Order {
        let items = record
            .lines
            .iter()
            .map(|(product_id, quantity, unit_price)| {
                OrderItem::new(self.resolve_product(*product_id), *quantity, *unit_price)
            })
            .collect();
        Order::restore(
            record.id,
            record.user_id.filter(|id| self.users.contains_key(id)),
            items,
            record.total_amount,
            record.status,
            record.created_at,
            record.updated_at,
        )
    }

    fn sorted_categories(&self) -> Vec<Category> {
        let mut categories: Vec<_> = self.categories.values().cloned().collect();
        categories.sort_by(|a, b| a.sort_id.cmp(&b.sort_id).then(a.id.cmp(&b.id)));
        categories
    }
}

fn page_of<T>(items: Vec<T>, page: PageRequest) -> Page<T> {
    let total = items.len() as u64;
    let data = items
        .into_iter()
        .skip(page.offset() as usize)
        .take(page.limit() as usize)
        .collect();
    Page::new(data, page, total)
}

fn matches_query(product: &Product, query: &ProductQuery) -> bool {
    if let Some(category) = query.category
        && product.category_id() != Some(category)
    {
        return false;
    }
    if let Some(term) = query.search_term() {
        let in_name = product.name.to_lowercase().contains(&term);
        let in_description = product
            .description
            .as_ref()
            .is_some_and(|d| d.to_lowercase().contains(&term));
        if !in_name && !in_description {
            return false;
        }
    }
    true
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored carts.
    pub async fn cart_count(&self) -> usize {
        self.state.read().await.carts.len()
    }

    /// Removes a user, orphaning their orders.
    pub async fn delete_user(&self, id: UserId) -> bool {
        self.state.write().await.users.remove(&id).is_some()
    }
}

#[async_trait]
impl CatalogStore for InMemoryStore {
    async fn insert_category(&self, category: &Category) -> Result<()> {
        let mut state = self.state.write().await;
        state.categories.insert(category.id, category.clone());
        Ok(())
    }

    async fn update_category(&self, category: &Category) -> Result<bool> {
        let mut state = self.state.write().await;
        match state.categories.get_mut(&category.id) {
            Some(existing) => {
                *existing = category.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_category(&self, id: CategoryId) -> Result<bool> {
        let mut state = self.state.write().await;
        Ok(state.categories.remove(&id).is_some())
    }

    async fn find_category(&self, id: CategoryId) -> Result<Option<Category>> {
        let state = self.state.read().await;
        Ok(state.categories.get(&id).cloned())
    }

    async fn all_categories(&self) -> Result<Vec<Category>> {
        let state = self.state.read().await;
        Ok(state.sorted_categories())
    }

    async fn list_categories(&self, page: PageRequest) -> Result<Page<Category>> {
        let state = self.state.read().await;
        Ok(page_of(state.sorted_categories(), page))
    }

    async fn count_categories(&self) -> Result<u64> {
        let state = self.state.read().await;
        Ok(state.categories.len() as u64)
    }

    async fn insert_product(&self, product: &Product) -> Result<()> {
        let mut state = self.state.write().await;
        state.products.insert(product.id, product.clone());
        Ok(())
    }

    async fn update_product(&self, product: &Product) -> Result<bool> {
        let mut state = self.state.write().await;
        match state.products.get_mut(&product.id) {
            Some(existing) => {
                *existing = product.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_product(&self, id: ProductId) -> Result<bool> {
        let mut state = self.state.write().await;
        Ok(state.products.remove(&id).is_some())
    }

    async fn find_product(&self, id: ProductId) -> Result<Option<Product>> {
        let state = self.state.read().await;
        Ok(state.resolve_product(Some(id)))
    }

    async fn list_products(
        &self,
        query: &ProductQuery,
        page: PageRequest,
    ) -> Result<Page<Product>> {
        let state = self.state.read().await;
        let mut products: Vec<_> = state
            .products
            .keys()
            .filter_map(|id| state.resolve_product(Some(*id)))
            .filter(|p| matches_query(p, query))
            .collect();
        products.sort_by(|a, b| {
            a.sort_id
                .cmp(&b.sort_id)
                .then(a.created_at.cmp(&b.created_at))
                .then(a.id.cmp(&b.id))
        });
        Ok(page_of(products, page))
    }

    async fn count_products(&self, visible_only: bool) -> Result<u64> {
        let state = self.state.read().await;
        let count = state
            .products
            .values()
            .filter(|p| !visible_only || p.visible)
            .count();
        Ok(count as u64)
    }
}

#[async_trait]
impl CartStore for InMemoryStore {
    async fn insert_cart(&self, cart: &Cart) -> Result<()> {
        let mut state = self.state.write().await;
        state.carts.insert(cart.id(), CartRecord::from_cart(cart));
        Ok(())
    }

    async fn find_cart(&self, id: CartId) -> Result<Option<Cart>> {
        let state = self.state.read().await;
        Ok(state.carts.get(&id).map(|record| state.resolve_cart(record)))
    }

    async fn save_cart(&self, cart: &Cart) -> Result<bool> {
        let mut state = self.state.write().await;
        match state.carts.get_mut(&cart.id()) {
            Some(existing) => {
                *existing = CartRecord::from_cart(cart);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_cart(&self, id: CartId) -> Result<bool> {
        let mut state = self.state.write().await;
        Ok(state.carts.remove(&id).is_some())
    }
}

#[async_trait]
impl OrderStore for InMemoryStore {
    async fn place_order(&self, cart_id: CartId, owner: UserId) -> Result<Option<Order>> {
        let mut state = self.state.write().await;

        let Some(record) = state.carts.get(&cart_id) else {
            return Ok(None);
        };
        let cart = state.resolve_cart(record);
        let order = Order::from_cart(&cart, owner)?;

        state.carts.remove(&cart_id);
        state.orders.insert(order.id(), OrderRecord::from_order(&order));

        Ok(Some(order))
    }

    async fn find_order(&self, id: OrderId) -> Result<Option<Order>> {
        let state = self.state.read().await;
        Ok(state.orders.get(&id).map(|record| state.resolve_order(record)))
    }

    async fn save_order_status(&self, order: &Order) -> Result<bool> {
        let mut state = self.state.write().await;
        match state.orders.get_mut(&order.id()) {
            Some(existing) => {
                existing.status = order.status();
                existing.updated_at = order.updated_at();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list_orders(&self, owner: Option<UserId>, page: PageRequest) -> Result<Page<Order>> {
        let state = self.state.read().await;
        let mut records: Vec<_> = state
            .orders
            .values()
            .filter(|r| owner.is_none() || r.user_id == owner)
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        let orders = records.into_iter().map(|r| state.resolve_order(r)).collect();
        Ok(page_of(orders, page))
    }

    async fn count_orders(&self) -> Result<u64> {
        let state = self.state.read().await;
        Ok(state.orders.len() as u64)
    }
}

#[async_trait]
impl UserStore for InMemoryStore {
    async fn insert_user(&self, user: &User) -> Result<()> {
        let mut state = self.state.write().await;
        if state.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::Conflict(format!(
                "email {} is already registered",
                user.email
            )));
        }
        state.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn find_user(&self, id: UserId) -> Result<Option<User>> {
        let state = self.state.read().await;
        Ok(state.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let state = self.state.read().await;
        Ok(state.users.values().find(|u| u.email == email).cloned())
    }

    async fn update_password(&self, user: &User) -> Result<bool> {
        let mut state = self.state.write().await;
        match state.users.get_mut(&user.id) {
            Some(existing) => {
                existing.password_hash = user.password_hash.clone();
                existing.updated_at = user.updated_at;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
