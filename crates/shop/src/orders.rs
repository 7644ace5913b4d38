//! Order placement and lifecycle.

use common::{CartId, OrderId, Page, PageRequest, UserId};
use domain::{Order, OrderStatus};
use serde::Deserialize;
use store::{OrderStore, UserStore};

use crate::error::{Result, ShopError};
use crate::validation::ValidationErrors;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderInput {
    pub cart_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateStatusInput {
    pub status: Option<String>,
}

impl UpdateStatusInput {
    fn check(self) -> std::result::Result<OrderStatus, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let status = errors
            .required("status", self.status)
            .and_then(|raw| match raw.parse::<OrderStatus>() {
                Ok(status) => Some(status),
                Err(_) => {
                    errors.add("status", "must be one of: pending, completed");
                    None
                }
            });
        errors.finish(())?;
        Ok(status.unwrap_or_default())
    }
}

/// Service for orders.
#[derive(Clone)]
pub struct OrderService<S> {
    store: S,
}

impl<S: OrderStore + UserStore> OrderService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Converts a cart into a pending order owned by `owner`.
    ///
    /// Unit prices are frozen at their current effective value and the cart
    /// is consumed.
    #[tracing::instrument(skip(self))]
    pub async fn create_from_cart(&self, owner: UserId, input: CreateOrderInput) -> Result<Order> {
        let mut errors = ValidationErrors::new();
        let cart_id = errors
            .required("cartId", input.cart_id)
            .and_then(|raw| errors.id::<CartId>("cartId", raw.trim()));
        errors.finish(())?;
        let Some(cart_id) = cart_id else {
            return Err(ShopError::not_found("Cart"));
        };

        if self.store.find_user(owner).await?.is_none() {
            return Err(ShopError::not_found("User"));
        }

        let order = self
            .store
            .place_order(cart_id, owner)
            .await?
            .ok_or_else(|| ShopError::not_found("Cart"))?;

        metrics::counter!("orders_created_total").increment(1);
        tracing::info!(
            order_id = %order.id(),
            %cart_id,
            user_id = %owner,
            total = %order.total_amount(),
            "order created"
        );
        Ok(order)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get(&self, id: OrderId) -> Result<Order> {
        self.store
            .find_order(id)
            .await?
            .ok_or_else(|| ShopError::not_found("Order"))
    }

    /// Sets the order's status.
    ///
    /// Any transition is allowed, including back to pending and re-setting
    /// the current status.
    #[tracing::instrument(skip(self))]
    pub async fn set_status(&self, id: OrderId, input: UpdateStatusInput) -> Result<Order> {
        let status = input.check()?;
        let mut order = self.get(id).await?;

        let previous = order.set_status(status);
        if !self.store.save_order_status(&order).await? {
            return Err(ShopError::not_found("Order"));
        }

        metrics::counter!("order_status_updates_total", "status" => status.as_str()).increment(1);
        tracing::info!(order_id = %id, from = %previous, to = %status, "order status updated");
        Ok(order)
    }

    /// The owner's orders, newest first.
    #[tracing::instrument(skip(self))]
    pub async fn list_for_owner(&self, owner: UserId, page: PageRequest) -> Result<Page<Order>> {
        Ok(self.store.list_orders(Some(owner), page).await?)
    }

    /// Every order, newest first.
    #[tracing::instrument(skip(self))]
    pub async fn list_all(&self, page: PageRequest) -> Result<Page<Order>> {
        Ok(self.store.list_orders(None, page).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::{Cart, CartItem, Money, Product, Quantity, User};
    use store::{CartStore, CatalogStore, InMemoryStore};

    async fn setup() -> (OrderService<InMemoryStore>, InMemoryStore, User, Product) {
        let store = InMemoryStore::new();
        let user = User::new("buyer@example.com", "Buyer", "hash");
        store.insert_user(&user).await.unwrap();
        let product = Product::new("Widget", Money::from_cents(1000));
        store.insert_product(&product).await.unwrap();
        (OrderService::new(store.clone()), store, user, product)
    }

    async fn cart_with(store: &InMemoryStore, product: &Product, quantity: i64) -> CartId {
        let cart = Cart::new(vec![CartItem::new(
            Some(product.clone()),
            Quantity::new(quantity).unwrap(),
        )])
        .unwrap();
        store.insert_cart(&cart).await.unwrap();
        cart.id()
    }

    fn order_input(cart: CartId) -> CreateOrderInput {
        CreateOrderInput {
            cart_id: Some(cart.to_string()),
        }
    }

    fn status(raw: &str) -> UpdateStatusInput {
        UpdateStatusInput {
            status: Some(raw.to_string()),
        }
    }

    #[tokio::test]
    async fn order_snapshots_price_and_consumes_cart() {
        let (service, store, user, mut product) = setup().await;
        let cart = cart_with(&store, &product, 1).await;

        let order = service
            .create_from_cart(user.id, order_input(cart))
            .await
            .unwrap();
        assert_eq!(order.status(), OrderStatus::Pending);
        assert_eq!(order.total_amount().to_string(), "10.00");
        assert_eq!(store.cart_count().await, 0);

        product.price = Money::from_cents(2000);
        store.update_product(&product).await.unwrap();

        let stored = service.get(order.id()).await.unwrap();
        assert_eq!(stored.items()[0].unit_price.to_string(), "10.00");
        assert_eq!(stored.total_amount().to_string(), "10.00");
    }

    #[tokio::test]
    async fn second_conversion_is_not_found() {
        let (service, store, user, product) = setup().await;
        let cart = cart_with(&store, &product, 2).await;

        service
            .create_from_cart(user.id, order_input(cart))
            .await
            .unwrap();
        let again = service.create_from_cart(user.id, order_input(cart)).await;

        assert!(matches!(again, Err(ShopError::NotFound(m)) if m == "Cart not found"));
    }

    #[tokio::test]
    async fn unknown_owner_is_not_found() {
        let (service, store, _, product) = setup().await;
        let cart = cart_with(&store, &product, 1).await;

        let result = service
            .create_from_cart(UserId::new(), order_input(cart))
            .await;

        assert!(matches!(result, Err(ShopError::NotFound(m)) if m == "User not found"));
        assert_eq!(store.cart_count().await, 1);
    }

    #[tokio::test]
    async fn malformed_cart_id_fails_validation() {
        let (service, _, user, _) = setup().await;

        let missing = service
            .create_from_cart(user.id, CreateOrderInput::default())
            .await;
        assert!(matches!(missing, Err(ShopError::Validation(_))));

        let malformed = service
            .create_from_cart(
                user.id,
                CreateOrderInput {
                    cart_id: Some("12".to_string()),
                },
            )
            .await;
        assert!(matches!(malformed, Err(ShopError::Validation(_))));
    }

    #[tokio::test]
    async fn set_status_is_unguarded_and_idempotent() {
        let (service, store, user, product) = setup().await;
        let cart = cart_with(&store, &product, 1).await;
        let order = service
            .create_from_cart(user.id, order_input(cart))
            .await
            .unwrap();

        for _ in 0..2 {
            let updated = service.set_status(order.id(), status("completed")).await.unwrap();
            assert_eq!(updated.status(), OrderStatus::Completed);
        }
        let reopened = service.set_status(order.id(), status("pending")).await.unwrap();
        assert_eq!(reopened.status(), OrderStatus::Pending);
    }

    #[tokio::test]
    async fn unknown_status_leaves_order_unchanged() {
        let (service, store, user, product) = setup().await;
        let cart = cart_with(&store, &product, 1).await;
        let order = service
            .create_from_cart(user.id, order_input(cart))
            .await
            .unwrap();

        let result = service.set_status(order.id(), status("shipped")).await;
        let Err(ShopError::Validation(errors)) = result else {
            panic!("expected validation error");
        };
        assert_eq!(errors.errors()[0].field, "status");

        let stored = service.get(order.id()).await.unwrap();
        assert_eq!(stored.status(), OrderStatus::Pending);
    }

    #[tokio::test]
    async fn set_status_on_missing_order_is_not_found() {
        let (service, _, _, _) = setup().await;
        let result = service.set_status(OrderId::new(), status("completed")).await;
        assert!(matches!(result, Err(ShopError::NotFound(_))));
    }

    #[tokio::test]
    async fn listing_is_scoped_to_owner() {
        let (service, store, alice, product) = setup().await;
        let bob = User::new("bob@example.com", "Bob", "hash");
        store.insert_user(&bob).await.unwrap();

        for owner in [alice.id, bob.id, alice.id] {
            let cart = cart_with(&store, &product, 1).await;
            service.create_from_cart(owner, order_input(cart)).await.unwrap();
        }

        let mine = service
            .list_for_owner(alice.id, PageRequest::default())
            .await
            .unwrap();
        assert_eq!(mine.total, 2);
        assert!(mine.data.iter().all(|o| o.is_owned_by(alice.id)));

        let all = service.list_all(PageRequest::new(1, 2)).await.unwrap();
        assert_eq!(all.total, 3);
        assert_eq!(all.pages, 2);
        assert_eq!(all.data.len(), 2);
    }
}
