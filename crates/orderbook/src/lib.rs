//! Central limit order book for a single market
//!
//! The book keeps two price-ordered sides of resting limit orders and
//! matches incoming market orders against them with strict price-time
//! priority. Limit orders only provide liquidity here; market orders
//! only take it.

pub mod book;
pub mod domain;
pub mod error;
pub mod level;
pub mod price;
pub mod side;

pub use book::{OrderBook, RestingOrder};
pub use domain::{Match, Order, OrderId, Side, Trade, UserId};
pub use error::BookError;
pub use level::PriceLevel;
pub use price::Price;
pub use side::SideIndex;

/// Result type for book operations
pub type Result<T> = std::result::Result<T, BookError>;
