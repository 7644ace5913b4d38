//! Domain error types.

use thiserror::Error;

use crate::value_objects::{Money, Quantity};

/// Errors raised when constructing domain values from untrusted input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// Quantity outside the accepted range.
    #[error("Invalid quantity: {quantity} (must be between 1 and {})", Quantity::MAX)]
    InvalidQuantity { quantity: i64 },

    /// Status string that is not one of the known order statuses.
    #[error("Invalid order status: {0:?} (expected \"pending\" or \"completed\")")]
    InvalidStatus(String),

    /// Text that does not parse as a decimal amount.
    #[error("Invalid amount: {0:?}")]
    InvalidAmount(String),

    /// A computed total that overflows or does not fit the money column.
    #[error("total must not exceed {}", Money::largest())]
    AmountOutOfRange,
}
