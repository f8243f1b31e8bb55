//! The order book: two sides, a global order index, and matching

use chrono::Utc;
use std::collections::HashMap;
use tracing::{debug, info};
use uuid::Uuid;

use crate::domain::{Match, Order, OrderId, Side, Trade};
use crate::error::BookError;
use crate::price::Price;
use crate::side::SideIndex;

/// Where a resting order currently sits.
///
/// Stored per order id instead of a back-pointer into the level, so a
/// level can be dropped without leaving anything dangling.
#[derive(Debug, Clone, Copy)]
struct Locator {
    side: Side,
    price: Price,
}

/// Snapshot of one resting order, with its level price attached
#[derive(Debug, Clone, serde::Serialize)]
pub struct RestingOrder {
    pub id: OrderId,
    pub user_id: crate::domain::UserId,
    pub side: Side,
    pub price: Price,
    pub remaining_size: f64,
    pub timestamp_ns: i64,
}

/// Central limit order book for one market
///
/// An order id is present in the locator index iff the order is
/// resting on some level; market orders are never indexed.
#[derive(Debug)]
pub struct OrderBook {
    asks: SideIndex,
    bids: SideIndex,
    locators: HashMap<OrderId, Locator>,
    trades: Vec<Trade>,
}

impl OrderBook {
    pub fn new() -> Self {
        Self {
            asks: SideIndex::new(Side::Ask),
            bids: SideIndex::new(Side::Bid),
            locators: HashMap::new(),
            trades: Vec::new(),
        }
    }

    fn side_index(&self, side: Side) -> &SideIndex {
        match side {
            Side::Ask => &self.asks,
            Side::Bid => &self.bids,
        }
    }

    fn side_index_mut(&mut self, side: Side) -> &mut SideIndex {
        match side {
            Side::Ask => &mut self.asks,
            Side::Bid => &mut self.bids,
        }
    }

    /// Rest a limit order at `price`.
    ///
    /// Limit orders never match on entry, even when they cross the
    /// opposite side; they only provide liquidity.
    pub fn place_limit(&mut self, price: Price, order: Order) -> Result<(), BookError> {
        if !order.remaining_size.is_finite() || order.remaining_size <= 0.0 {
            return Err(BookError::InvalidOrder(format!(
                "size must be strictly positive, got {}",
                order.remaining_size
            )));
        }
        debug_assert!(
            !self.locators.contains_key(&order.id),
            "order id {} placed twice",
            order.id
        );

        info!(
            order_id = order.id,
            user_id = order.user_id,
            side = %order.side,
            size = order.remaining_size,
            price = %price,
            "new limit order"
        );

        self.locators.insert(
            order.id,
            Locator {
                side: order.side,
                price,
            },
        );
        self.side_index_mut(order.side)
            .get_or_create(price)
            .add(order);
        Ok(())
    }

    /// Execute a market order against the opposite side.
    ///
    /// All-or-nothing: when the opposite side holds less volume than
    /// the order asks for, the call fails and the book is untouched.
    /// On success the order is fully consumed, levels are walked best
    /// price first, emptied levels are dropped, and one trade record
    /// is appended per match.
    pub fn place_market(&mut self, mut order: Order) -> Result<Vec<Match>, BookError> {
        if !order.remaining_size.is_finite() || order.remaining_size <= 0.0 {
            return Err(BookError::InvalidOrder(format!(
                "size must be strictly positive, got {}",
                order.remaining_size
            )));
        }

        let opposite = order.side.opposite();
        let available = self.side_index(opposite).total_volume();
        if available < order.remaining_size {
            return Err(BookError::InsufficientLiquidity {
                available,
                requested: order.remaining_size,
            });
        }

        let aggressor = order.side;
        let mut matches = Vec::new();
        for price in self.side_index(opposite).prices_best_first() {
            if order.is_filled() {
                break;
            }
            let (level_matches, filled, emptied) = {
                let level = self
                    .side_index_mut(opposite)
                    .get_mut(price)
                    .expect("traversed price has a live level");
                let outcome = level.fill(&mut order);
                (outcome.matches, outcome.filled, level.is_empty())
            };
            for id in &filled {
                self.locators.remove(id);
            }
            if emptied {
                self.side_index_mut(opposite).remove(price);
            }
            matches.extend(level_matches);
        }
        debug_assert!(order.is_filled(), "market order left unfilled after walk");

        let now = Utc::now();
        for m in &matches {
            debug!(
                price = %m.price,
                size = m.size_filled,
                bid_order = m.bid_order_id,
                ask_order = m.ask_order_id,
                "match"
            );
            self.trades.push(Trade {
                trade_id: Uuid::new_v4(),
                price: m.price,
                size: m.size_filled,
                aggressor,
                timestamp: now,
            });
        }
        Ok(matches)
    }

    /// Remove a resting order from its level and the index.
    ///
    /// A second cancel of the same id fails with [`BookError::UnknownOrder`],
    /// as does a cancel racing behind a fill that consumed the order.
    pub fn cancel(&mut self, id: OrderId) -> Result<Order, BookError> {
        let locator = self
            .locators
            .remove(&id)
            .ok_or(BookError::UnknownOrder(id))?;

        let (order, emptied) = {
            let level = self
                .side_index_mut(locator.side)
                .get_mut(locator.price)
                .expect("locator points at a live level");
            let order = level
                .delete(id)
                .expect("indexed order present in its level queue");
            (order, level.is_empty())
        };
        if emptied {
            self.side_index_mut(locator.side).remove(locator.price);
        }
        info!(order_id = id, side = %locator.side, price = %locator.price, "order cancelled");
        Ok(order)
    }

    pub fn total_volume(&self, side: Side) -> f64 {
        self.side_index(side).total_volume()
    }

    /// Best price on a side, if the side is non-empty.
    pub fn best(&self, side: Side) -> Option<Price> {
        self.side_index(side).best()
    }

    pub fn contains(&self, id: OrderId) -> bool {
        self.locators.contains_key(&id)
    }

    /// Look up one resting order by id.
    pub fn resting(&self, id: OrderId) -> Option<RestingOrder> {
        let locator = self.locators.get(&id)?;
        self.side_index(locator.side)
            .get(locator.price)
            .and_then(|level| level.orders().find(|o| o.id == id))
            .map(|o| RestingOrder {
                id: o.id,
                user_id: o.user_id,
                side: o.side,
                price: locator.price,
                remaining_size: o.remaining_size,
                timestamp_ns: o.timestamp_ns,
            })
    }

    /// All resting orders on a side, best level first, FIFO within a
    /// level.
    pub fn side_orders(&self, side: Side) -> Vec<RestingOrder> {
        self.side_index(side)
            .iter_best_first()
            .flat_map(|level| {
                level.orders().map(move |o| RestingOrder {
                    id: o.id,
                    user_id: o.user_id,
                    side: o.side,
                    price: level.price(),
                    remaining_size: o.remaining_size,
                    timestamp_ns: o.timestamp_ns,
                })
            })
            .collect()
    }

    /// Executed trades, oldest first.
    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    pub fn order_count(&self) -> usize {
        self.locators.len()
    }
}

impl Default for OrderBook {
    fn default() -> Self {
        Self::new()
    }
}
