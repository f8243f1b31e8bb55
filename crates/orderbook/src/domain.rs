//! Domain types shared across the book

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::price::Price;

/// Unique order identifier, assigned by the exchange at creation.
pub type OrderId = u64;

/// Identifier of the user that owns an order.
pub type UserId = u64;

/// Side of the book an order belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// An offer to buy
    Bid,
    /// An offer to sell
    Ask,
}

impl Side {
    pub fn opposite(&self) -> Self {
        match self {
            Side::Bid => Side::Ask,
            Side::Ask => Side::Bid,
        }
    }

    pub fn is_bid(&self) -> bool {
        matches!(self, Side::Bid)
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Bid => write!(f, "bid"),
            Side::Ask => write!(f, "ask"),
        }
    }
}

/// A resting or incoming order
///
/// While resting, the order lives by value inside exactly one price
/// level's queue; every other part of the system refers to it through
/// its id and the book's locator index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub side: Side,
    /// Size still open. Decremented by fills, never below zero.
    pub remaining_size: f64,
    /// Nanoseconds since epoch; breaks ties within a price level.
    pub timestamp_ns: i64,
}

impl Order {
    pub fn new(id: OrderId, user_id: UserId, side: Side, size: f64) -> Self {
        Self {
            id,
            user_id,
            side,
            remaining_size: size,
            timestamp_ns: Utc::now().timestamp_nanos_opt().unwrap_or_default(),
        }
    }

    pub fn is_filled(&self) -> bool {
        self.remaining_size == 0.0
    }
}

/// A single fill event pairing one resting order with the aggressor
///
/// The price is always the resting (maker) order's level price.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Match {
    pub bid_order_id: OrderId,
    pub bid_user_id: UserId,
    pub ask_order_id: OrderId,
    pub ask_user_id: UserId,
    pub size_filled: f64,
    pub price: Price,
}

/// Post-trade record, appended in match-production order
#[derive(Debug, Clone, Serialize)]
pub struct Trade {
    pub trade_id: Uuid,
    pub price: Price,
    pub size: f64,
    /// Side of the order that took liquidity.
    pub aggressor: Side,
    pub timestamp: DateTime<Utc>,
}
