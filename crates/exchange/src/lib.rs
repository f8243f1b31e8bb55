//! Exchange facade and HTTP surface
//!
//! Routes orders to per-market books, tracks which resting orders
//! belong to which user, and hands produced matches to the settlement
//! hook once the book lock is released.

pub mod api;
pub mod error;
pub mod exchange;

pub use error::{ApiError, ExchangeError};
pub use exchange::{BookSnapshot, Exchange, OrderType, PlaceOrder, User, UserOrders};

/// Result type for exchange operations
pub type Result<T> = std::result::Result<T, ExchangeError>;
