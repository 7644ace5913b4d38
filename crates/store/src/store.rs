use async_trait::async_trait;
use common::{CartId, CategoryId, OrderId, Page, PageRequest, ProductId, UserId};
use domain::{Cart, Category, Order, Product, User};

use crate::{ProductQuery, Result};

/// Categories and products.
///
/// Products are returned with their category resolved. Deleting a category
/// leaves its products in place without a category.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Inserts a new category.
    async fn insert_category(&self, category: &Category) -> Result<()>;

    /// Overwrites an existing category. Returns false if it does not exist.
    async fn update_category(&self, category: &Category) -> Result<bool>;

    /// Deletes a category. Returns false if it does not exist.
    async fn delete_category(&self, id: CategoryId) -> Result<bool>;

    /// Finds a category by ID.
    async fn find_category(&self, id: CategoryId) -> Result<Option<Category>>;

    /// Returns every category ordered by `sort_id` ascending.
    async fn all_categories(&self) -> Result<Vec<Category>>;

    /// Returns one page of categories ordered by `sort_id` ascending.
    async fn list_categories(&self, page: PageRequest) -> Result<Page<Category>>;

    /// Counts all categories.
    async fn count_categories(&self) -> Result<u64>;

    /// Inserts a new product. Only the category's ID is persisted.
    async fn insert_product(&self, product: &Product) -> Result<()>;

    /// Overwrites an existing product. Returns false if it does not exist.
    async fn update_product(&self, product: &Product) -> Result<bool>;

    /// Deletes a product. Returns false if it does not exist.
    ///
    /// Cart and order lines pointing at it keep existing with no product.
    async fn delete_product(&self, id: ProductId) -> Result<bool>;

    /// Finds a product by ID.
    async fn find_product(&self, id: ProductId) -> Result<Option<Product>>;

    /// Returns one page of products matching `query`, ordered by `sort_id`.
    async fn list_products(
        &self,
        query: &ProductQuery,
        page: PageRequest,
    ) -> Result<Page<Product>>;

    /// Counts products, optionally only the visible ones.
    async fn count_products(&self, visible_only: bool) -> Result<u64>;
}

/// Cart persistence.
///
/// A cart and its lines are always written together.
#[async_trait]
pub trait CartStore: Send + Sync {
    /// Inserts a new cart with its lines.
    async fn insert_cart(&self, cart: &Cart) -> Result<()>;

    /// Finds a cart by ID, with products resolved.
    async fn find_cart(&self, id: CartId) -> Result<Option<Cart>>;

    /// Replaces the stored header and every line of an existing cart.
    ///
    /// Returns false (and writes nothing) if the cart does not exist.
    async fn save_cart(&self, cart: &Cart) -> Result<bool>;

    /// Deletes a cart and its lines. Returns false if it does not exist.
    async fn delete_cart(&self, id: CartId) -> Result<bool>;
}

/// Order persistence.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Converts a cart into a pending order owned by `owner`.
    ///
    /// Loading the cart, inserting the order with its snapshotted lines and
    /// deleting the cart happen atomically. Returns `None` if the cart does
    /// not exist.
    async fn place_order(&self, cart_id: CartId, owner: UserId) -> Result<Option<Order>>;

    /// Finds an order by ID, with products resolved.
    async fn find_order(&self, id: OrderId) -> Result<Option<Order>>;

    /// Persists the status and `updated_at` of an existing order.
    ///
    /// Lines and total are never rewritten. Returns false if the order does
    /// not exist.
    async fn save_order_status(&self, order: &Order) -> Result<bool>;

    /// Returns one page of orders, newest first, optionally for one owner.
    async fn list_orders(&self, owner: Option<UserId>, page: PageRequest) -> Result<Page<Order>>;

    /// Counts all orders.
    async fn count_orders(&self) -> Result<u64>;
}

/// User accounts.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Inserts a new user.
    ///
    /// Fails with [`StoreError::Conflict`](crate::StoreError::Conflict) if the
    /// email is already registered.
    async fn insert_user(&self, user: &User) -> Result<()>;

    /// Finds a user by ID.
    async fn find_user(&self, id: UserId) -> Result<Option<User>>;

    /// Finds a user by exact email.
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Persists a new password hash. Returns false if the user does not exist.
    async fn update_password(&self, user: &User) -> Result<bool>;
}

/// Everything the services need from persistence.
pub trait Store: CatalogStore + CartStore + OrderStore + UserStore + Clone + 'static {}

// Blanket implementation for every type implementing all four stores
impl<T> Store for T where T: CatalogStore + CartStore + OrderStore + UserStore + Clone + 'static {}
