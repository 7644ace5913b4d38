//! Catalog records: categories and the products carts and orders refer to.

use chrono::{DateTime, Utc};
use common::{CategoryId, ProductId};
use serde::Serialize;

use crate::pricing;
use crate::value_objects::Money;

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub visible: bool,
    pub sort_id: i32,
    pub image_url: Option<String>,
}

impl Category {
    /// Creates a visible category sorted first.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: CategoryId::new(),
            name: name.into(),
            visible: true,
            sort_id: 0,
            image_url: None,
        }
    }
}

/// A sellable product.
///
/// Carts and orders hold non-owning references to products; a product may
/// disappear from the catalog while lines still point at it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Money,
    pub discounted_price: Option<Money>,
    pub description: Option<String>,
    pub category: Option<Category>,
    pub sort_id: i32,
    pub visible: bool,
    pub is_in_stock: bool,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Product {
    /// Creates a visible, in-stock product with no category.
    pub fn new(name: impl Into<String>, price: Money) -> Self {
        Self {
            id: ProductId::new(),
            name: name.into(),
            price,
            discounted_price: None,
            description: None,
            category: None,
            sort_id: 0,
            visible: true,
            is_in_stock: true,
            image_url: None,
            created_at: Utc::now(),
        }
    }

    /// Sets the discounted price.
    pub fn with_discount(mut self, discounted_price: Money) -> Self {
        self.discounted_price = Some(discounted_price);
        self
    }

    /// Places the product in a category.
    pub fn in_category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    /// The price a cart or order line is charged per unit right now.
    pub fn effective_price(&self) -> Money {
        pricing::effective_price(Some(self.price), self.discounted_price)
    }

    /// Returns the category ID, if any.
    pub fn category_id(&self) -> Option<CategoryId> {
        self.category.as_ref().map(|c| c.id)
    }
}
