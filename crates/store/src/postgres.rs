use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{CartId, CategoryId, OrderId, Page, PageRequest, ProductId, UserId};
use domain::{
    Cart, CartItem, Category, Money, Order, OrderItem, OrderStatus, Product, Quantity, User,
};
use rust_decimal::Decimal;
use sqlx::{PgExecutor, PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::{
    ProductQuery, Result, StoreError,
    query::escape_like,
    store::{CartStore, CatalogStore, OrderStore, UserStore},
};

const PRODUCT_COLUMNS: &str = r#"
    p.id AS product_id, p.name AS product_name, p.price, p.discounted_price, p.description,
    p.sort_id AS product_sort_id, p.visible AS product_visible, p.is_in_stock,
    p.image_url AS product_image_url, p.created_at AS product_created_at,
    c.id AS category_id, c.name AS category_name, c.visible AS category_visible,
    c.sort_id AS category_sort_id, c.image_url AS category_image_url
"#;

const USER_COLUMNS: &str = "id, email, name, location, phone_number, password_hash, age, \
                            is_admin, created_at, updated_at";

const UNIQUE_EMAIL: &str = "users_email_key";

/// PostgreSQL-backed store implementation.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new PostgreSQL store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    fn row_to_category(row: &PgRow) -> Result<Category> {
        Ok(Category {
            id: CategoryId::from_uuid(row.try_get::<Uuid, _>("id")?),
            name: row.try_get("name")?,
            visible: row.try_get("visible")?,
            sort_id: row.try_get("sort_id")?,
            image_url: row.try_get("image_url")?,
        })
    }

    /// Reads the joined product and category columns, `None` if the product is gone.
    fn row_to_product(row: &PgRow) -> Result<Option<Product>> {
        let Some(id) = row.try_get::<Option<Uuid>, _>("product_id")? else {
            return Ok(None);
        };

        let category = match row.try_get::<Option<Uuid>, _>("category_id")? {
            Some(category_id) => Some(Category {
                id: CategoryId::from_uuid(category_id),
                name: row.try_get("category_name")?,
                visible: row.try_get("category_visible")?,
                sort_id: row.try_get("category_sort_id")?,
                image_url: row.try_get("category_image_url")?,
            }),
            None => None,
        };

        Ok(Some(Product {
            id: ProductId::from_uuid(id),
            name: row.try_get("product_name")?,
            price: Money::new(row.try_get::<Decimal, _>("price")?),
            discounted_price: row
                .try_get::<Option<Decimal>, _>("discounted_price")?
                .map(Money::new),
            description: row.try_get("description")?,
            category,
            sort_id: row.try_get("product_sort_id")?,
            visible: row.try_get("product_visible")?,
            is_in_stock: row.try_get("is_in_stock")?,
            image_url: row.try_get("product_image_url")?,
            created_at: row.try_get::<DateTime<Utc>, _>("product_created_at")?,
        }))
    }

    fn row_to_user(row: &PgRow) -> Result<User> {
        Ok(User {
            id: UserId::from_uuid(row.try_get::<Uuid, _>("id")?),
            email: row.try_get("email")?,
            name: row.try_get("name")?,
            location: row.try_get("location")?,
            phone_number: row.try_get("phone_number")?,
            password_hash: row.try_get("password_hash")?,
            age: row.try_get("age")?,
            is_admin: row.try_get("is_admin")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn quantity(row: &PgRow) -> Result<Quantity> {
        let raw: i32 = row.try_get("quantity")?;
        Quantity::new(i64::from(raw)).map_err(|e| StoreError::Corrupt(e.to_string()))
    }

    async fn fetch_cart_items<'e, E>(executor: E, cart_id: CartId) -> Result<Vec<CartItem>>
    where
        E: PgExecutor<'e>,
    {
        let sql = format!(
            r#"
            SELECT ci.quantity, {PRODUCT_COLUMNS}
            FROM cart_items ci
            LEFT JOIN products p ON p.id = ci.product_id
            LEFT JOIN categories c ON c.id = p.category_id
            WHERE ci.cart_id = $1
            ORDER BY ci.position ASC
            "#
        );
        let rows = sqlx::query(&sql)
            .bind(cart_id.as_uuid())
            .fetch_all(executor)
            .await?;

        rows.iter()
            .map(|row| -> Result<CartItem> {
                Ok(CartItem::new(Self::row_to_product(row)?, Self::quantity(row)?))
            })
            .collect()
    }

    /// Loads the lines of several orders at once, grouped by order.
    async fn fetch_order_items(
        &self,
        order_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, Vec<OrderItem>>> {
        let sql = format!(
            r#"
            SELECT oi.order_id, oi.quantity, oi.unit_price, {PRODUCT_COLUMNS}
            FROM order_items oi
            LEFT JOIN products p ON p.id = oi.product_id
            LEFT JOIN categories c ON c.id = p.category_id
            WHERE oi.order_id = ANY($1)
            ORDER BY oi.order_id, oi.position ASC
            "#
        );
        let rows = sqlx::query(&sql)
            .bind(order_ids)
            .fetch_all(&self.pool)
            .await?;

        let mut grouped: HashMap<Uuid, Vec<OrderItem>> = HashMap::new();
        for row in &rows {
            let item = OrderItem::new(
                Self::row_to_product(row)?,
                Self::quantity(row)?,
                Money::new(row.try_get::<Decimal, _>("unit_price")?),
            );
            grouped
                .entry(row.try_get::<Uuid, _>("order_id")?)
                .or_default()
                .push(item);
        }
        Ok(grouped)
    }

    fn row_to_order(row: &PgRow, items: Vec<OrderItem>) -> Result<Order> {
        let status: String = row.try_get("status")?;
        let status = status
            .parse::<OrderStatus>()
            .map_err(|e| StoreError::Corrupt(e.to_string()))?;

        Ok(Order::restore(
            OrderId::from_uuid(row.try_get::<Uuid, _>("id")?),
            row.try_get::<Option<Uuid>, _>("user_id")?
                .map(UserId::from_uuid),
            items,
            Money::new(row.try_get::<Decimal, _>("total_amount")?),
            status,
            row.try_get("created_at")?,
            row.try_get("updated_at")?,
        ))
    }

    async fn rows_to_orders(&self, rows: Vec<PgRow>) -> Result<Vec<Order>> {
        let ids = rows
            .iter()
            .map(|row| row.try_get::<Uuid, _>("id"))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let mut items = self.fetch_order_items(&ids).await?;

        rows.iter()
            .zip(ids)
            .map(|(row, id)| Self::row_to_order(row, items.remove(&id).unwrap_or_default()))
            .collect()
    }

    /// Builds the `WHERE` clause of a product listing. Parameters start at `$1`.
    fn product_filter(query: &ProductQuery) -> (String, Option<Uuid>, Option<String>) {
        let mut sql = String::from(" WHERE 1=1");
        let mut param_count = 0;

        let category = query.category.map(|c| c.as_uuid());
        if category.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND p.category_id = ${param_count}"));
        }

        let pattern = query
            .search_term()
            .map(|term| format!("%{}%", escape_like(&term)));
        if pattern.is_some() {
            param_count += 1;
            sql.push_str(&format!(
                r" AND (LOWER(p.name) LIKE ${param_count} ESCAPE '\'"
            ));
            sql.push_str(&format!(
                r" OR LOWER(p.description) LIKE ${param_count} ESCAPE '\')"
            ));
        }

        (sql, category, pattern)
    }
}

#[async_trait]
impl CatalogStore for PostgresStore {
    async fn insert_category(&self, category: &Category) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO categories (id, name, visible, sort_id, image_url)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(category.id.as_uuid())
        .bind(&category.name)
        .bind(category.visible)
        .bind(category.sort_id)
        .bind(&category.image_url)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_category(&self, category: &Category) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE categories SET name = $2, visible = $3, sort_id = $4, image_url = $5
            WHERE id = $1
            "#,
        )
        .bind(category.id.as_uuid())
        .bind(&category.name)
        .bind(category.visible)
        .bind(category.sort_id)
        .bind(&category.image_url)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_category(&self, id: CategoryId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_category(&self, id: CategoryId) -> Result<Option<Category>> {
        let row = sqlx::query(
            "SELECT id, name, visible, sort_id, image_url FROM categories WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(Self::row_to_category).transpose()
    }

    async fn all_categories(&self) -> Result<Vec<Category>> {
        let rows = sqlx::query(
            "SELECT id, name, visible, sort_id, image_url FROM categories ORDER BY sort_id ASC, id ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(Self::row_to_category).collect()
    }

    async fn list_categories(&self, page: PageRequest) -> Result<Page<Category>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, visible, sort_id, image_url
            FROM categories
            ORDER BY sort_id ASC, id ASC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(i64::from(page.limit()))
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await?;
        let categories = rows
            .iter()
            .map(Self::row_to_category)
            .collect::<Result<Vec<_>>>()?;

        let total = self.count_categories().await?;
        Ok(Page::new(categories, page, total))
    }

    async fn count_categories(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM categories")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as u64)
    }

    async fn insert_product(&self, product: &Product) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO products (id, name, price, discounted_price, description, category_id,
                                  sort_id, visible, is_in_stock, image_url, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(product.id.as_uuid())
        .bind(&product.name)
        .bind(product.price.amount())
        .bind(product.discounted_price.map(|p| p.amount()))
        .bind(&product.description)
        .bind(product.category_id().map(|c| c.as_uuid()))
        .bind(product.sort_id)
        .bind(product.visible)
        .bind(product.is_in_stock)
        .bind(&product.image_url)
        .bind(product.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_product(&self, product: &Product) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE products
            SET name = $2, price = $3, discounted_price = $4, description = $5, category_id = $6,
                sort_id = $7, visible = $8, is_in_stock = $9, image_url = $10
            WHERE id = $1
            "#,
        )
        .bind(product.id.as_uuid())
        .bind(&product.name)
        .bind(product.price.amount())
        .bind(product.discounted_price.map(|p| p.amount()))
        .bind(&product.description)
        .bind(product.category_id().map(|c| c.as_uuid()))
        .bind(product.sort_id)
        .bind(product.visible)
        .bind(product.is_in_stock)
        .bind(&product.image_url)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_product(&self, id: ProductId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_product(&self, id: ProductId) -> Result<Option<Product>> {
        let sql = format!(
            r#"
            SELECT {PRODUCT_COLUMNS}
            FROM products p
            LEFT JOIN categories c ON c.id = p.category_id
            WHERE p.id = $1
            "#
        );
        let row = sqlx::query(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(row) => Self::row_to_product(&row),
            None => Ok(None),
        }
    }

    async fn list_products(
        &self,
        query: &ProductQuery,
        page: PageRequest,
    ) -> Result<Page<Product>> {
        let (filter, category, pattern) = Self::product_filter(query);
        let param_count = usize::from(category.is_some()) + usize::from(pattern.is_some());

        let sql = format!(
            r#"
            SELECT {PRODUCT_COLUMNS}
            FROM products p
            LEFT JOIN categories c ON c.id = p.category_id
            {filter}
            ORDER BY p.sort_id ASC, p.created_at ASC, p.id ASC
            LIMIT ${} OFFSET ${}
            "#,
            param_count + 1,
            param_count + 2,
        );
        let mut rows_query = sqlx::query(&sql);
        if let Some(category) = category {
            rows_query = rows_query.bind(category);
        }
        if let Some(ref pattern) = pattern {
            rows_query = rows_query.bind(pattern);
        }
        let rows = rows_query
            .bind(i64::from(page.limit()))
            .bind(page.offset() as i64)
            .fetch_all(&self.pool)
            .await?;

        let mut products = Vec::with_capacity(rows.len());
        for row in &rows {
            if let Some(product) = Self::row_to_product(row)? {
                products.push(product);
            }
        }

        let count_sql = format!("SELECT COUNT(*) FROM products p{filter}");
        let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
        if let Some(category) = category {
            count_query = count_query.bind(category);
        }
        if let Some(ref pattern) = pattern {
            count_query = count_query.bind(pattern);
        }
        let total = count_query.fetch_one(&self.pool).await?;

        Ok(Page::new(products, page, total as u64))
    }

    async fn count_products(&self, visible_only: bool) -> Result<u64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM products WHERE $1 = FALSE OR visible = TRUE",
        )
        .bind(visible_only)
        .fetch_one(&self.pool)
        .await?;
        Ok(count as u64)
    }
}

#[async_trait]
impl CartStore for PostgresStore {
    async fn insert_cart(&self, cart: &Cart) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO carts (id, total_amount, created_at, updated_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(cart.id().as_uuid())
        .bind(cart.total_amount().amount())
        .bind(cart.created_at())
        .bind(cart.updated_at())
        .execute(&mut *tx)
        .await?;

        insert_cart_items(&mut tx, cart).await?;

        tx.commit().await?;
        Ok(())
    }

    async fn find_cart(&self, id: CartId) -> Result<Option<Cart>> {
        let row = sqlx::query(
            "SELECT id, total_amount, created_at, updated_at FROM carts WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let items = Self::fetch_cart_items(&self.pool, id).await?;
        Ok(Some(row_to_cart(&row, items)?))
    }

    async fn save_cart(&self, cart: &Cart) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "UPDATE carts SET total_amount = $2, updated_at = $3 WHERE id = $1",
        )
        .bind(cart.id().as_uuid())
        .bind(cart.total_amount().amount())
        .bind(cart.updated_at())
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            // Dropping the transaction rolls it back
            return Ok(false);
        }

        sqlx::query("DELETE FROM cart_items WHERE cart_id = $1")
            .bind(cart.id().as_uuid())
            .execute(&mut *tx)
            .await?;
        insert_cart_items(&mut tx, cart).await?;

        tx.commit().await?;
        Ok(true)
    }

    async fn delete_cart(&self, id: CartId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM carts WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

async fn insert_cart_items(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    cart: &Cart,
) -> Result<()> {
    for (position, item) in cart.items().iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO cart_items (cart_id, position, product_id, quantity)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(cart.id().as_uuid())
        .bind(position as i32)
        .bind(item.product_id().map(|p| p.as_uuid()))
        .bind(item.quantity.get() as i32)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

fn row_to_cart(row: &PgRow, items: Vec<CartItem>) -> Result<Cart> {
    Ok(Cart::restore(
        CartId::from_uuid(row.try_get::<Uuid, _>("id")?),
        items,
        Money::new(row.try_get::<Decimal, _>("total_amount")?),
        row.try_get("created_at")?,
        row.try_get("updated_at")?,
    ))
}

#[async_trait]
impl OrderStore for PostgresStore {
    async fn place_order(&self, cart_id: CartId, owner: UserId) -> Result<Option<Order>> {
        let mut tx = self.pool.begin().await?;

        // Row lock so a concurrent conversion of the same cart waits and then misses it
        let row = sqlx::query(
            "SELECT id, total_amount, created_at, updated_at FROM carts WHERE id = $1 FOR UPDATE",
        )
        .bind(cart_id.as_uuid())
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let items = Self::fetch_cart_items(&mut *tx, cart_id).await?;
        let cart = row_to_cart(&row, items)?;
        let order = Order::from_cart(&cart, owner)?;

        sqlx::query(
            r#"
            INSERT INTO orders (id, user_id, total_amount, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(order.id().as_uuid())
        .bind(owner.as_uuid())
        .bind(order.total_amount().amount())
        .bind(order.status().as_str())
        .bind(order.created_at())
        .bind(order.updated_at())
        .execute(&mut *tx)
        .await?;

        for (position, item) in order.items().iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO order_items (order_id, position, product_id, quantity, unit_price)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(order.id().as_uuid())
            .bind(position as i32)
            .bind(item.product_id().map(|p| p.as_uuid()))
            .bind(item.quantity.get() as i32)
            .bind(item.unit_price.amount())
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query("DELETE FROM carts WHERE id = $1")
            .bind(cart_id.as_uuid())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(order))
    }

    async fn find_order(&self, id: OrderId) -> Result<Option<Order>> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, total_amount, status, created_at, updated_at
            FROM orders
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(self.rows_to_orders(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn save_order_status(&self, order: &Order) -> Result<bool> {
        let result = sqlx::query("UPDATE orders SET status = $2, updated_at = $3 WHERE id = $1")
            .bind(order.id().as_uuid())
            .bind(order.status().as_str())
            .bind(order.updated_at())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_orders(&self, owner: Option<UserId>, page: PageRequest) -> Result<Page<Order>> {
        let owner = owner.map(|o| o.as_uuid());

        let rows = sqlx::query(
            r#"
            SELECT id, user_id, total_amount, status, created_at, updated_at
            FROM orders
            WHERE $1::uuid IS NULL OR user_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(owner)
        .bind(i64::from(page.limit()))
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await?;
        let orders = self.rows_to_orders(rows).await?;

        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE $1::uuid IS NULL OR user_id = $1")
                .bind(owner)
                .fetch_one(&self.pool)
                .await?;

        Ok(Page::new(orders, page, total as u64))
    }

    async fn count_orders(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as u64)
    }
}

#[async_trait]
impl UserStore for PostgresStore {
    async fn insert_user(&self, user: &User) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, email, name, location, phone_number, password_hash, age,
                               is_admin, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(user.id.as_uuid())
        .bind(&user.email)
        .bind(&user.name)
        .bind(&user.location)
        .bind(&user.phone_number)
        .bind(&user.password_hash)
        .bind(user.age)
        .bind(user.is_admin)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.constraint() == Some(UNIQUE_EMAIL)
            {
                return StoreError::Conflict(format!(
                    "email {} is already registered",
                    user.email
                ));
            }
            StoreError::Database(e)
        })?;
        Ok(())
    }

    async fn find_user(&self, id: UserId) -> Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let row = sqlx::query(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(Self::row_to_user).transpose()
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        let row = sqlx::query(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(Self::row_to_user).transpose()
    }

    async fn update_password(&self, user: &User) -> Result<bool> {
        let result =
            sqlx::query("UPDATE users SET password_hash = $2, updated_at = $3 WHERE id = $1")
                .bind(user.id.as_uuid())
                .bind(&user.password_hash)
                .bind(user.updated_at)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }
}
