//! Application services for the shop backend.
//!
//! Each service validates its input completely, then works against the
//! storage traits from the `store` crate:
//!
//! - [`CatalogService`]: categories and products
//! - [`CartService`]: shopping carts and their totals
//! - [`OrderService`]: placing orders from carts and updating their status
//! - [`AccountService`]: registration, sign-in and passwords
//! - [`DashboardService`]: admin summary counts
//! - [`UploadService`]: signed object-store upload URLs

pub mod accounts;
pub mod auth;
pub mod carts;
pub mod catalog;
pub mod dashboard;
pub mod error;
pub mod orders;
pub mod uploads;
pub mod validation;

pub use accounts::{
    AccountService, AuthSession, ChangePasswordInput, RegisterInput, ResetPasswordInput,
    SignInInput, SignInOutcome,
};
pub use auth::{Claims, TokenIssuer, parse_expiry};
pub use carts::{CartInput, CartItemInput, CartService};
pub use catalog::{CatalogService, CategoryInput, ProductInput};
pub use dashboard::{DashboardService, DashboardStats};
pub use error::{Result, ShopError};
pub use orders::{CreateOrderInput, OrderService, UpdateStatusInput};
pub use uploads::{
    InMemoryUploadSigner, SignUploadInput, SignedUpload, SupabaseConfig, SupabaseUploadSigner,
    UploadService, UploadSigner,
};
pub use validation::{FieldError, ValidationErrors};
