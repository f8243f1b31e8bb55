//! The exchange: per-market books and per-user order tracking

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

use orderbook::{BookError, Match, Order, OrderBook, OrderId, Price, RestingOrder, Side, UserId};
use settlement::Settler;

use crate::error::ExchangeError;
use crate::Result;

/// A registered user: an identity plus the account the settlement
/// hook moves value through.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub address: String,
}

/// How an order interacts with the book
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderType {
    Market,
    Limit,
}

/// A decoded order placement request
#[derive(Debug, Clone)]
pub struct PlaceOrder {
    pub market: String,
    pub user_id: UserId,
    pub side: Side,
    pub order_type: OrderType,
    pub size: f64,
    /// Required for limit orders, ignored for market orders.
    pub price: Option<f64>,
}

/// A user's resting orders, partitioned by side
#[derive(Debug, Default)]
pub struct UserOrders {
    pub bids: Vec<RestingOrder>,
    pub asks: Vec<RestingOrder>,
}

/// Point-in-time view of one market's book
#[derive(Debug)]
pub struct BookSnapshot {
    pub total_bid_volume: f64,
    pub total_ask_volume: f64,
    pub bids: Vec<RestingOrder>,
    pub asks: Vec<RestingOrder>,
}

/// Exchange facade over the per-market order books
///
/// Each book sits behind its own readers-writer lock; mutations hold
/// the write guard for the whole operation so a market-order walk is
/// atomic against every other book access. The per-user order lists
/// live behind a separate lock and are updated eagerly on fill and
/// cancel, so reads need no filtering. Locks are never held across
/// the settlement hook.
pub struct Exchange {
    books: HashMap<String, RwLock<OrderBook>>,
    users: RwLock<HashMap<UserId, User>>,
    orders_by_user: RwLock<HashMap<UserId, Vec<OrderId>>>,
    next_order_id: AtomicU64,
    settler: Arc<dyn Settler>,
}

impl Exchange {
    pub fn new(
        markets: impl IntoIterator<Item = String>,
        users: impl IntoIterator<Item = User>,
        settler: Arc<dyn Settler>,
    ) -> Self {
        let books = markets
            .into_iter()
            .map(|symbol| (symbol, RwLock::new(OrderBook::new())))
            .collect();
        let users = users.into_iter().map(|u| (u.id, u)).collect();
        Self {
            books,
            users: RwLock::new(users),
            orders_by_user: RwLock::new(HashMap::new()),
            next_order_id: AtomicU64::new(1),
            settler,
        }
    }

    fn book(&self, market: &str) -> Result<&RwLock<OrderBook>> {
        self.books
            .get(market)
            .ok_or_else(|| ExchangeError::UnknownMarket(market.to_string()))
    }

    /// Place a limit or market order; returns the assigned order id.
    pub async fn place(&self, request: PlaceOrder) -> Result<OrderId> {
        let book = self.book(&request.market)?;
        let id = self.next_order_id.fetch_add(1, Ordering::Relaxed);
        let order = Order::new(id, request.user_id, request.side, request.size);

        match request.order_type {
            OrderType::Limit => {
                let raw = request.price.ok_or_else(|| {
                    ExchangeError::Book(BookError::InvalidOrder(
                        "limit order requires a price".to_string(),
                    ))
                })?;
                let price = Price::from_f64(raw)?;
                book.write().await.place_limit(price, order)?;

                let mut by_user = self.orders_by_user.write().await;
                by_user.entry(request.user_id).or_default().push(id);
            }
            OrderType::Market => {
                let (matches, filled_makers) = {
                    let mut guard = book.write().await;
                    let matches = guard.place_market(order)?;
                    // Makers consumed to zero left the index inside the
                    // walk; mirror that in the user lists.
                    let filled: Vec<(UserId, OrderId)> = matches
                        .iter()
                        .map(|m| match request.side {
                            Side::Bid => (m.ask_user_id, m.ask_order_id),
                            Side::Ask => (m.bid_user_id, m.bid_order_id),
                        })
                        .filter(|(_, maker_id)| !guard.contains(*maker_id))
                        .collect();
                    (matches, filled)
                };

                {
                    let mut by_user = self.orders_by_user.write().await;
                    for (user_id, order_id) in filled_makers {
                        if let Some(list) = by_user.get_mut(&user_id) {
                            list.retain(|id| *id != order_id);
                        }
                    }
                }

                info!(
                    order_id = id,
                    user_id = request.user_id,
                    market = %request.market,
                    side = %request.side,
                    matches = matches.len(),
                    "market order executed"
                );
                self.settle(&matches).await;
            }
        }
        Ok(id)
    }

    /// Cancel a resting order wherever it sits.
    pub async fn cancel(&self, order_id: OrderId) -> Result<()> {
        for (market, book) in &self.books {
            let cancelled = {
                let mut guard = book.write().await;
                match guard.cancel(order_id) {
                    Ok(order) => order,
                    Err(BookError::UnknownOrder(_)) => continue,
                    Err(err) => return Err(err.into()),
                }
            };

            let mut by_user = self.orders_by_user.write().await;
            if let Some(list) = by_user.get_mut(&cancelled.user_id) {
                list.retain(|id| *id != order_id);
            }
            info!(order_id, market = %market, "order cancelled");
            return Ok(());
        }
        Err(ExchangeError::Book(BookError::UnknownOrder(order_id)))
    }

    /// A user's resting orders across all markets.
    pub async fn get_orders(&self, user_id: UserId) -> UserOrders {
        let ids = {
            let by_user = self.orders_by_user.read().await;
            by_user.get(&user_id).cloned().unwrap_or_default()
        };

        let mut orders = UserOrders::default();
        for book in self.books.values() {
            let guard = book.read().await;
            for id in &ids {
                if let Some(order) = guard.resting(*id) {
                    match order.side {
                        Side::Bid => orders.bids.push(order),
                        Side::Ask => orders.asks.push(order),
                    }
                }
            }
        }
        orders
    }

    /// Full snapshot of one market: aggregate volumes and every
    /// resting order, best level first.
    pub async fn get_book(&self, market: &str) -> Result<BookSnapshot> {
        let guard = self.book(market)?.read().await;
        Ok(BookSnapshot {
            total_bid_volume: guard.total_volume(Side::Bid),
            total_ask_volume: guard.total_volume(Side::Ask),
            bids: guard.side_orders(Side::Bid),
            asks: guard.side_orders(Side::Ask),
        })
    }

    pub async fn get_best_bid(&self, market: &str) -> Result<Option<Price>> {
        Ok(self.book(market)?.read().await.best(Side::Bid))
    }

    pub async fn get_best_ask(&self, market: &str) -> Result<Option<Price>> {
        Ok(self.book(market)?.read().await.best(Side::Ask))
    }

    /// Fire the settlement hook once per match: value flows from the
    /// ask-side user to the bid-side user, sized in whole wei.
    ///
    /// Runs strictly after the book lock is released. Failures are
    /// logged and never reverse the match.
    async fn settle(&self, matches: &[Match]) {
        if matches.is_empty() {
            return;
        }

        let addresses: Vec<Option<(String, String)>> = {
            let users = self.users.read().await;
            matches
                .iter()
                .map(|m| {
                    let from = users.get(&m.ask_user_id)?;
                    let to = users.get(&m.bid_user_id)?;
                    Some((from.address.clone(), to.address.clone()))
                })
                .collect()
        };

        for (m, addrs) in matches.iter().zip(addresses) {
            let Some((from, to)) = addrs else {
                warn!(
                    ask_user = m.ask_user_id,
                    bid_user = m.bid_user_id,
                    "match references an unregistered user, skipping settlement"
                );
                continue;
            };
            let amount_wei = m.size_filled.trunc() as u128;
            if let Err(err) = self.settler.transfer(&from, &to, amount_wei).await {
                warn!(
                    %err,
                    from,
                    to,
                    amount_wei,
                    price = %m.price,
                    "settlement transfer failed"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use settlement::SettlementError;
    use std::sync::Mutex;

    /// Captures transfers instead of talking to a node.
    #[derive(Default)]
    struct RecordingSettler {
        transfers: Mutex<Vec<(String, String, u128)>>,
    }

    #[async_trait]
    impl Settler for RecordingSettler {
        async fn transfer(
            &self,
            from: &str,
            to: &str,
            amount_wei: u128,
        ) -> std::result::Result<(), SettlementError> {
            self.transfers
                .lock()
                .unwrap()
                .push((from.to_string(), to.to_string(), amount_wei));
            Ok(())
        }
    }

    fn test_exchange() -> (Arc<RecordingSettler>, Exchange) {
        let settler = Arc::new(RecordingSettler::default());
        let exchange = Exchange::new(
            ["ETH".to_string()],
            [
                User {
                    id: 1,
                    address: "0xaaa".into(),
                },
                User {
                    id: 2,
                    address: "0xbbb".into(),
                },
            ],
            settler.clone(),
        );
        (settler, exchange)
    }

    fn limit(user_id: UserId, side: Side, size: f64, price: f64) -> PlaceOrder {
        PlaceOrder {
            market: "ETH".into(),
            user_id,
            side,
            order_type: OrderType::Limit,
            size,
            price: Some(price),
        }
    }

    fn market(user_id: UserId, side: Side, size: f64) -> PlaceOrder {
        PlaceOrder {
            market: "ETH".into(),
            user_id,
            side,
            order_type: OrderType::Market,
            size,
            price: None,
        }
    }

    #[tokio::test]
    async fn test_place_limit_then_get_orders() {
        let (_, exchange) = test_exchange();
        let id = exchange.place(limit(1, Side::Bid, 5.0, 9_000.0)).await.unwrap();

        let orders = exchange.get_orders(1).await;
        assert_eq!(orders.bids.len(), 1);
        assert_eq!(orders.bids[0].id, id);
        assert_eq!(orders.bids[0].price.as_f64(), 9_000.0);
        assert!(orders.asks.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_market_is_rejected() {
        let (_, exchange) = test_exchange();
        let placed = exchange.place(limit(1, Side::Bid, 5.0, 9_000.0)).await;
        assert!(placed.is_ok());

        let mut bad = limit(1, Side::Bid, 5.0, 9_000.0);
        bad.market = "BTC".into();
        assert!(matches!(
            exchange.place(bad).await,
            Err(ExchangeError::UnknownMarket(_))
        ));
    }

    #[tokio::test]
    async fn test_limit_without_price_is_invalid() {
        let (_, exchange) = test_exchange();
        let mut request = limit(1, Side::Bid, 5.0, 9_000.0);
        request.price = None;
        assert!(matches!(
            exchange.place(request).await,
            Err(ExchangeError::Book(BookError::InvalidOrder(_)))
        ));
    }

    #[tokio::test]
    async fn test_cancel_then_get_orders() {
        let (_, exchange) = test_exchange();
        let first = exchange.place(limit(7, Side::Bid, 5.0, 9_000.0)).await.unwrap();
        let second = exchange.place(limit(7, Side::Bid, 8.0, 9_100.0)).await.unwrap();

        exchange.cancel(first).await.unwrap();

        let orders = exchange.get_orders(7).await;
        assert_eq!(orders.bids.len(), 1);
        assert_eq!(orders.bids[0].id, second);
    }

    #[tokio::test]
    async fn test_cancel_unknown_order() {
        let (_, exchange) = test_exchange();
        assert!(matches!(
            exchange.cancel(42).await,
            Err(ExchangeError::Book(BookError::UnknownOrder(42)))
        ));
    }

    #[tokio::test]
    async fn test_market_order_settles_and_compacts_user_lists() {
        let (settler, exchange) = test_exchange();
        exchange.place(limit(1, Side::Ask, 10.0, 100.0)).await.unwrap();
        exchange.place(market(2, Side::Bid, 10.0)).await.unwrap();

        // The maker's order was fully consumed: eagerly dropped from
        // the user list, not just hidden.
        let orders = exchange.get_orders(1).await;
        assert!(orders.asks.is_empty());

        // Value moved from the ask-side user to the bid-side user.
        let transfers = settler.transfers.lock().unwrap();
        assert_eq!(
            *transfers,
            vec![("0xaaa".to_string(), "0xbbb".to_string(), 10u128)]
        );
    }

    #[tokio::test]
    async fn test_partial_fill_keeps_maker_listed() {
        let (_, exchange) = test_exchange();
        let maker = exchange.place(limit(1, Side::Ask, 10.0, 100.0)).await.unwrap();
        exchange.place(market(2, Side::Bid, 4.0)).await.unwrap();

        let orders = exchange.get_orders(1).await;
        assert_eq!(orders.asks.len(), 1);
        assert_eq!(orders.asks[0].id, maker);
        assert_eq!(orders.asks[0].remaining_size, 6.0);
    }

    #[tokio::test]
    async fn test_insufficient_liquidity_leaves_exchange_unchanged() {
        let (settler, exchange) = test_exchange();
        exchange.place(limit(1, Side::Ask, 4.0, 100.0)).await.unwrap();

        let err = exchange.place(market(2, Side::Bid, 5.0)).await;
        assert!(matches!(
            err,
            Err(ExchangeError::Book(BookError::InsufficientLiquidity { .. }))
        ));

        let book = exchange.get_book("ETH").await.unwrap();
        assert_eq!(book.total_ask_volume, 4.0);
        assert_eq!(book.asks.len(), 1);
        assert!(settler.transfers.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_best_prices() {
        let (_, exchange) = test_exchange();
        exchange.place(limit(1, Side::Ask, 1.0, 101.0)).await.unwrap();
        exchange.place(limit(1, Side::Ask, 1.0, 100.0)).await.unwrap();
        exchange.place(limit(2, Side::Bid, 1.0, 99.0)).await.unwrap();

        let ask = exchange.get_best_ask("ETH").await.unwrap().unwrap();
        let bid = exchange.get_best_bid("ETH").await.unwrap().unwrap();
        assert_eq!(ask.as_f64(), 100.0);
        assert_eq!(bid.as_f64(), 99.0);
        assert!(exchange.get_best_bid("BTC").await.is_err());
    }

    #[tokio::test]
    async fn test_book_snapshot_orders_best_first() {
        let (_, exchange) = test_exchange();
        exchange.place(limit(1, Side::Ask, 1.0, 102.0)).await.unwrap();
        exchange.place(limit(1, Side::Ask, 2.0, 100.0)).await.unwrap();
        exchange.place(limit(2, Side::Bid, 3.0, 98.0)).await.unwrap();
        exchange.place(limit(2, Side::Bid, 4.0, 99.0)).await.unwrap();

        let book = exchange.get_book("ETH").await.unwrap();
        assert_eq!(book.total_ask_volume, 3.0);
        assert_eq!(book.total_bid_volume, 7.0);

        let ask_prices: Vec<_> = book.asks.iter().map(|o| o.price.as_f64()).collect();
        let bid_prices: Vec<_> = book.bids.iter().map(|o| o.price.as_f64()).collect();
        assert_eq!(ask_prices, vec![100.0, 102.0]);
        assert_eq!(bid_prices, vec![99.0, 98.0]);
    }
}
