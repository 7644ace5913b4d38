//! Domain layer for the shop backend.
//!
//! This crate holds the pure business model and has no storage concerns:
//! - Money and quantity value objects
//! - The pricing calculator shared by carts and orders
//! - Catalog records (categories, products) and users
//! - Cart aggregate with derived totals
//! - Order aggregate with price snapshots and its status lifecycle

pub mod cart;
pub mod catalog;
pub mod error;
pub mod order;
pub mod pricing;
pub mod user;
pub mod value_objects;

pub use cart::{Cart, CartItem};
pub use catalog::{Category, Product};
pub use error::DomainError;
pub use order::{Order, OrderItem, OrderStatus};
pub use pricing::{PriceLine, compute_total, effective_price};
pub use user::{User, UserSummary};
pub use value_objects::{Money, Quantity};
