//! Order book error types

use thiserror::Error;

use crate::domain::OrderId;

/// Errors surfaced by book operations
#[derive(Debug, Error)]
pub enum BookError {
    /// Order rejected before touching the book
    #[error("invalid order: {0}")]
    InvalidOrder(String),

    /// Order id not present in the book's index
    #[error("unknown order: {0}")]
    UnknownOrder(OrderId),

    /// Market order larger than the opposite side
    #[error("not enough volume [{available:.2}] for market order [{requested:.2}]")]
    InsufficientLiquidity { available: f64, requested: f64 },
}
