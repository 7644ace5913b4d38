//! Cart aggregate.

use chrono::{DateTime, Utc};
use common::{CartId, ProductId};
use serde::Serialize;

use crate::catalog::Product;
use crate::error::DomainError;
use crate::pricing::{self, PriceLine};
use crate::value_objects::{Money, Quantity};

/// A cart line.
///
/// The product is `None` when the requested product did not resolve, or
/// when it has since been removed from the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartItem {
    pub product: Option<Product>,
    pub quantity: Quantity,
}

impl CartItem {
    pub fn new(product: Option<Product>, quantity: Quantity) -> Self {
        Self { product, quantity }
    }

    /// Returns the referenced product ID, if the product resolved.
    pub fn product_id(&self) -> Option<ProductId> {
        self.product.as_ref().map(|p| p.id)
    }

    /// The line priced at the product's current effective price.
    pub fn price_line(&self) -> PriceLine {
        let unit_price = self
            .product
            .as_ref()
            .map_or_else(Money::zero, Product::effective_price);
        PriceLine::new(unit_price, self.quantity)
    }
}

/// Cart aggregate root.
///
/// Owns its lines exclusively. The total is derived from the lines whenever
/// they change and cannot be set from outside.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    id: CartId,
    items: Vec<CartItem>,
    total_amount: Money,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Cart {
    /// Creates a new cart holding `items`.
    ///
    /// Fails when the lines total more than [`Money::largest`].
    pub fn new(items: Vec<CartItem>) -> Result<Self, DomainError> {
        let now = Utc::now();
        let total_amount = total_of(&items)?;
        Ok(Self {
            id: CartId::new(),
            items,
            total_amount,
            created_at: now,
            updated_at: now,
        })
    }

    /// Rebuilds a cart from its persisted form, keeping the stored total.
    pub fn restore(
        id: CartId,
        items: Vec<CartItem>,
        total_amount: Money,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            items,
            total_amount,
            created_at,
            updated_at,
        }
    }

    /// Discards every line and replaces them wholesale; lines are not merged.
    ///
    /// On error the cart is left untouched.
    pub fn replace_items(&mut self, items: Vec<CartItem>) -> Result<(), DomainError> {
        self.total_amount = total_of(&items)?;
        self.items = items;
        self.updated_at = Utc::now();
        Ok(())
    }
}

// Query methods
impl Cart {
    pub fn id(&self) -> CartId {
        self.id
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Total as computed the last time the lines changed.
    pub fn total_amount(&self) -> Money {
        self.total_amount
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

    /// Returns the total quantity over all lines.
    pub fn total_quantity(&self) -> u64 {
        self.items.iter().map(|i| u64::from(i.quantity.get())).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

fn total_of(items: &[CartItem]) -> Result<Money, DomainError> {
    pricing::compute_total(items.iter().map(CartItem::price_line))
}
