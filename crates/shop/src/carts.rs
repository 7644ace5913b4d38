//! Shopping carts.

use common::{CartId, ProductId};
use domain::{Cart, CartItem, DomainError, Quantity};
use serde::Deserialize;
use store::{CartStore, CatalogStore};

use crate::error::{Result, ShopError};
use crate::validation::ValidationErrors;

/// One requested cart line.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemInput {
    pub product_id: Option<String>,
    pub quantity: Option<i64>,
}

/// The full set of lines a cart should hold.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CartInput {
    pub items: Option<Vec<CartItemInput>>,
}

impl CartInput {
    pub fn new(items: Vec<CartItemInput>) -> Self {
        Self { items: Some(items) }
    }

    fn check(self) -> std::result::Result<Vec<(ProductId, Quantity)>, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let items = errors.required("items", self.items).unwrap_or_default();
        if items.is_empty() && errors.is_empty() {
            errors.add("items", "must contain at least 1 item");
        }

        let mut lines = Vec::with_capacity(items.len());
        for (i, item) in items.into_iter().enumerate() {
            let product_field = format!("items[{i}].productId");
            let quantity_field = format!("items[{i}].quantity");

            let product = errors
                .required(&product_field, item.product_id)
                .and_then(|raw| errors.id::<ProductId>(&product_field, raw.trim()));
            let quantity = errors
                .required(&quantity_field, item.quantity)
                .and_then(|q| errors.quantity(&quantity_field, q));

            if let (Some(product), Some(quantity)) = (product, quantity) {
                lines.push((product, quantity));
            }
        }
        errors.finish(lines)
    }
}

/// Reports a cart total that cannot be stored against the lines.
fn total_error(e: DomainError) -> ShopError {
    ValidationErrors::single("items", e.to_string()).into()
}

/// Service for shopping carts.
#[derive(Clone)]
pub struct CartService<S> {
    store: S,
}

impl<S: CatalogStore + CartStore> CartService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Creates a cart from the requested lines.
    ///
    /// Product IDs that do not resolve are kept as lines without a product.
    #[tracing::instrument(skip(self))]
    pub async fn create(&self, input: CartInput) -> Result<Cart> {
        let lines = input.check()?;
        let items = self.resolve(lines).await?;

        let cart = Cart::new(items).map_err(total_error)?;
        self.store.insert_cart(&cart).await?;

        metrics::counter!("carts_created_total").increment(1);
        tracing::info!(
            cart_id = %cart.id(),
            items = cart.item_count(),
            total = %cart.total_amount(),
            "cart created"
        );
        Ok(cart)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get(&self, id: CartId) -> Result<Cart> {
        self.store
            .find_cart(id)
            .await?
            .ok_or_else(|| ShopError::not_found("Cart"))
    }

    /// Discards every line of the cart and rebuilds it from `input`.
    #[tracing::instrument(skip(self))]
    pub async fn replace_items(&self, id: CartId, input: CartInput) -> Result<Cart> {
        let lines = input.check()?;
        let mut cart = self.get(id).await?;

        let items = self.resolve(lines).await?;
        cart.replace_items(items).map_err(total_error)?;
        if !self.store.save_cart(&cart).await? {
            return Err(ShopError::not_found("Cart"));
        }

        tracing::info!(
            cart_id = %id,
            items = cart.item_count(),
            total = %cart.total_amount(),
            "cart items replaced"
        );
        Ok(cart)
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: CartId) -> Result<()> {
        if !self.store.delete_cart(id).await? {
            return Err(ShopError::not_found("Cart"));
        }
        tracing::info!(cart_id = %id, "cart deleted");
        Ok(())
    }

    async fn resolve(&self, lines: Vec<(ProductId, Quantity)>) -> Result<Vec<CartItem>> {
        let mut items = Vec::with_capacity(lines.len());
        for (product_id, quantity) in lines {
            let product = self.store.find_product(product_id).await?;
            if product.is_none() {
                tracing::debug!(%product_id, "cart line references unknown product");
            }
            items.push(CartItem::new(product, quantity));
        }
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::{Money, Product};
    use store::InMemoryStore;

    fn line(product: ProductId, quantity: i64) -> CartItemInput {
        CartItemInput {
            product_id: Some(product.to_string()),
            quantity: Some(quantity),
        }
    }

    async fn seeded() -> (CartService<InMemoryStore>, InMemoryStore, Product, Product) {
        let store = InMemoryStore::new();
        let p1 = Product::new("P1", Money::from_cents(500));
        let p2 = Product::new("P2", Money::from_cents(300));
        store.insert_product(&p1).await.unwrap();
        store.insert_product(&p2).await.unwrap();
        (CartService::new(store.clone()), store, p1, p2)
    }

    #[tokio::test]
    async fn create_computes_total() {
        let (service, _, p1, p2) = seeded().await;

        let cart = service
            .create(CartInput::new(vec![line(p1.id, 2), line(p2.id, 1)]))
            .await
            .unwrap();

        assert_eq!(cart.total_amount().to_string(), "13.00");
        assert_eq!(cart.items()[0].product.as_ref().unwrap().name, "P1");
    }

    #[tokio::test]
    async fn unknown_product_becomes_null_line() {
        let (service, _, p1, _) = seeded().await;

        let cart = service
            .create(CartInput::new(vec![line(p1.id, 1), line(ProductId::new(), 3)]))
            .await
            .unwrap();

        assert_eq!(cart.item_count(), 2);
        assert!(cart.items()[1].product.is_none());
        assert_eq!(cart.total_amount().to_string(), "5.00");
    }

    #[tokio::test]
    async fn empty_or_missing_items_fail_validation() {
        let (service, store, _, _) = seeded().await;

        for input in [CartInput::default(), CartInput::new(vec![])] {
            let Err(ShopError::Validation(errors)) = service.create(input).await else {
                panic!("expected validation error");
            };
            assert_eq!(errors.errors()[0].field, "items");
        }
        assert_eq!(store.cart_count().await, 0);
    }

    #[tokio::test]
    async fn bad_lines_report_indexed_fields() {
        let (service, _, p1, _) = seeded().await;
        let input = CartInput::new(vec![
            line(p1.id, 0),
            CartItemInput {
                product_id: Some("17".to_string()),
                quantity: Some(1),
            },
            CartItemInput::default(),
        ]);

        let Err(ShopError::Validation(errors)) = service.create(input).await else {
            panic!("expected validation error");
        };
        let fields: Vec<_> = errors.errors().iter().map(|e| e.field.as_str()).collect();
        assert_eq!(
            fields,
            [
                "items[0].quantity",
                "items[1].productId",
                "items[2].productId",
                "items[2].quantity",
            ]
        );
    }

    #[tokio::test]
    async fn total_beyond_storable_range_fails_validation() {
        let (service, store, _, _) = seeded().await;
        let dear = Product::new("Dear", Money::largest());
        store.insert_product(&dear).await.unwrap();

        let Err(ShopError::Validation(errors)) = service
            .create(CartInput::new(vec![line(dear.id, 100_000_000)]))
            .await
        else {
            panic!("expected validation error");
        };

        assert_eq!(errors.errors()[0].field, "items");
        assert_eq!(store.cart_count().await, 0);
    }

    #[tokio::test]
    async fn replace_beyond_storable_range_keeps_stored_cart() {
        let (service, store, p1, _) = seeded().await;
        let dear = Product::new("Dear", Money::largest());
        store.insert_product(&dear).await.unwrap();
        let cart = service
            .create(CartInput::new(vec![line(p1.id, 1)]))
            .await
            .unwrap();

        let result = service
            .replace_items(cart.id(), CartInput::new(vec![line(dear.id, 2)]))
            .await;

        assert!(matches!(result, Err(ShopError::Validation(_))));
        let stored = service.get(cart.id()).await.unwrap();
        assert_eq!(stored.total_amount().to_string(), "5.00");
    }

    #[tokio::test]
    async fn replace_items_discards_old_lines() {
        let (service, _, p1, p2) = seeded().await;
        let cart = service
            .create(CartInput::new(vec![line(p1.id, 2)]))
            .await
            .unwrap();

        let replaced = service
            .replace_items(cart.id(), CartInput::new(vec![line(p2.id, 4)]))
            .await
            .unwrap();

        assert_eq!(replaced.item_count(), 1);
        assert_eq!(replaced.items()[0].product_id(), Some(p2.id));
        assert_eq!(replaced.total_amount().to_string(), "12.00");

        let stored = service.get(cart.id()).await.unwrap();
        assert_eq!(stored.total_amount(), replaced.total_amount());
    }

    #[tokio::test]
    async fn replace_items_on_missing_cart_writes_nothing() {
        let (service, store, p1, _) = seeded().await;

        let result = service
            .replace_items(CartId::new(), CartInput::new(vec![line(p1.id, 1)]))
            .await;

        assert!(matches!(result, Err(ShopError::NotFound(_))));
        assert_eq!(store.cart_count().await, 0);
    }

    #[tokio::test]
    async fn delete_then_get_is_not_found() {
        let (service, _, p1, _) = seeded().await;
        let cart = service
            .create(CartInput::new(vec![line(p1.id, 1)]))
            .await
            .unwrap();

        service.delete(cart.id()).await.unwrap();

        assert!(matches!(service.get(cart.id()).await, Err(ShopError::NotFound(_))));
        assert!(matches!(service.delete(cart.id()).await, Err(ShopError::NotFound(_))));
    }
}
