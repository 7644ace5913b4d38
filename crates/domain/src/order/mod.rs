//! Order aggregate and related types.

mod aggregate;
mod state;

pub use aggregate::{Order, OrderItem};
pub use state::OrderStatus;
