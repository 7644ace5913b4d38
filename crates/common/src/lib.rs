//! Shared types for the shop backend.

pub mod pagination;
pub mod types;

pub use pagination::{Page, PageRequest};
pub use types::{CartId, CategoryId, OrderId, ProductId, UserId};
