//! Persistence layer for the shop backend.
//!
//! The store traits are the only seam services talk to. Two implementations
//! are provided:
//! - [`InMemoryStore`] for tests and local development
//! - [`PostgresStore`] backed by sqlx

pub mod error;
pub mod memory;
pub mod postgres;
pub mod query;
pub mod store;

pub use error::{Result, StoreError};
pub use memory::InMemoryStore;
pub use postgres::PostgresStore;
pub use query::ProductQuery;
pub use store::{CartStore, CatalogStore, OrderStore, Store, UserStore};
