//! Order aggregate implementation.

use chrono::{DateTime, Utc};
use common::{OrderId, ProductId, UserId};
use serde::Serialize;

use crate::cart::{Cart, CartItem};
use crate::catalog::Product;
use crate::error::DomainError;
use crate::pricing::{self, PriceLine};
use crate::value_objects::{Money, Quantity};

use super::OrderStatus;

/// An order line with its unit price captured when the order was placed.
///
/// The price does not follow later catalog changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product: Option<Product>,
    pub quantity: Quantity,
    pub unit_price: Money,
}

impl OrderItem {
    pub fn new(product: Option<Product>, quantity: Quantity, unit_price: Money) -> Self {
        Self {
            product,
            quantity,
            unit_price,
        }
    }

    /// Freezes a cart line at the product's current effective price.
    pub fn snapshot(item: &CartItem) -> Self {
        let line = item.price_line();
        Self {
            product: item.product.clone(),
            quantity: item.quantity,
            unit_price: line.unit_price,
        }
    }

    /// Returns the referenced product ID, if the product still exists.
    pub fn product_id(&self) -> Option<ProductId> {
        self.product.as_ref().map(|p| p.id)
    }

    pub fn price_line(&self) -> PriceLine {
        PriceLine::new(self.unit_price, self.quantity)
    }
}

/// Order aggregate root.
///
/// Lines and total are fixed at creation; only the status changes afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    id: OrderId,
    /// Owner; `None` once the user has been deleted.
    user_id: Option<UserId>,
    items: Vec<OrderItem>,
    total_amount: Money,
    status: OrderStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Order {
    /// Places a pending order from the cart's current lines.
    ///
    /// Every line is priced at its product's effective price right now, and
    /// the total is computed from those snapshotted prices. Fails when that
    /// total is out of range, which can happen after a catalog price rise.
    pub fn from_cart(cart: &Cart, owner: UserId) -> Result<Self, DomainError> {
        let items: Vec<OrderItem> = cart.items().iter().map(OrderItem::snapshot).collect();
        let total_amount = pricing::compute_total(items.iter().map(OrderItem::price_line))?;

        if total_amount != cart.total_amount() {
            tracing::debug!(
                cart_id = %cart.id(),
                cart_total = %cart.total_amount(),
                order_total = %total_amount,
                "catalog prices changed since the cart was saved"
            );
        }

        let now = Utc::now();
        Ok(Self {
            id: OrderId::new(),
            user_id: Some(owner),
            items,
            total_amount,
            status: OrderStatus::Pending,
            created_at: now,
            updated_at: now,
        })
    }

    /// Rebuilds an order from its persisted form.
    pub fn restore(
        id: OrderId,
        user_id: Option<UserId>,
        items: Vec<OrderItem>,
        total_amount: Money,
        status: OrderStatus,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            user_id,
            items,
            total_amount,
            status,
            created_at,
            updated_at,
        }
    }

    /// Sets the status unconditionally and returns the previous one.
    pub fn set_status(&mut self, status: OrderStatus) -> OrderStatus {
        let previous = std::mem::replace(&mut self.status, status);
        self.updated_at = Utc::now();
        previous
    }
}

// Query methods
impl Order {
    pub fn id(&self) -> OrderId {
        self.id
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.user_id
    }

    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    pub fn total_amount(&self) -> Money {
        self.total_amount
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns the number of lines.
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Returns true if the order is owned by `user`.
    pub fn is_owned_by(&self, user: UserId) -> bool {
        self.user_id == Some(user)
    }
}
