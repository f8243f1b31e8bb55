//! Price level: the FIFO bucket of orders resting at one price

use std::collections::VecDeque;

use crate::domain::{Match, Order, OrderId};
use crate::price::Price;

/// Orders resting at a single price on one side of the book
///
/// The queue is strict FIFO: orders are appended at the tail and
/// matched from the head. `total_volume` is kept equal to the sum of
/// the queued orders' remaining sizes.
#[derive(Debug, Clone)]
pub struct PriceLevel {
    price: Price,
    orders: VecDeque<Order>,
    total_volume: f64,
}

/// What a call to [`PriceLevel::fill`] produced
#[derive(Debug, Default)]
pub struct FillOutcome {
    pub matches: Vec<Match>,
    /// Resting orders consumed down to zero; the caller must drop
    /// them from the global index.
    pub filled: Vec<OrderId>,
}

impl PriceLevel {
    pub fn new(price: Price) -> Self {
        Self {
            price,
            orders: VecDeque::new(),
            total_volume: 0.0,
        }
    }

    pub fn price(&self) -> Price {
        self.price
    }

    pub fn total_volume(&self) -> f64 {
        self.total_volume
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// Iterate the queue in FIFO order.
    pub fn orders(&self) -> impl Iterator<Item = &Order> {
        self.orders.iter()
    }

    /// Append an order at the tail of the queue.
    ///
    /// A zero-size order entering a level is an invariant violation,
    /// not a user error; it is rejected with a panic.
    pub fn add(&mut self, order: Order) {
        assert!(
            order.remaining_size > 0.0,
            "order {} entered level {} with no remaining size",
            order.id,
            self.price
        );
        self.total_volume += order.remaining_size;
        self.orders.push_back(order);
    }

    /// Remove one order by id, preserving the FIFO order of the rest.
    pub fn delete(&mut self, id: OrderId) -> Option<Order> {
        let position = self.orders.iter().position(|o| o.id == id)?;
        let order = self.orders.remove(position)?;
        self.total_volume -= order.remaining_size;
        Some(order)
    }

    /// Consume the queue head-first into `incoming` until one of the
    /// two runs out.
    ///
    /// Each step fills `min(resting, incoming)` and emits one match at
    /// this level's price. Resting orders that reach zero are popped;
    /// only heads can fill, so popping as we go is the single removal
    /// pass. A zero-size incoming order produces no matches.
    pub fn fill(&mut self, incoming: &mut Order) -> FillOutcome {
        let mut outcome = FillOutcome::default();
        let mut drained = 0.0;

        while incoming.remaining_size > 0.0 {
            let Some(resting) = self.orders.front_mut() else {
                break;
            };
            debug_assert!(
                resting.remaining_size > 0.0,
                "level {} queue head has no remaining size",
                self.price
            );

            let size = resting.remaining_size.min(incoming.remaining_size);
            resting.remaining_size -= size;
            incoming.remaining_size -= size;
            drained += size;

            let m = if resting.side.is_bid() {
                Match {
                    bid_order_id: resting.id,
                    bid_user_id: resting.user_id,
                    ask_order_id: incoming.id,
                    ask_user_id: incoming.user_id,
                    size_filled: size,
                    price: self.price,
                }
            } else {
                Match {
                    bid_order_id: incoming.id,
                    bid_user_id: incoming.user_id,
                    ask_order_id: resting.id,
                    ask_user_id: resting.user_id,
                    size_filled: size,
                    price: self.price,
                }
            };
            outcome.matches.push(m);

            if resting.is_filled() {
                outcome.filled.push(resting.id);
                self.orders.pop_front();
            }
        }

        self.total_volume -= drained;
        debug_assert!(
            (self.total_volume - self.orders.iter().map(|o| o.remaining_size).sum::<f64>()).abs()
                < 1e-6,
            "level {} volume diverged from its queue",
            self.price
        );
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Side;

    fn level(price: f64) -> PriceLevel {
        PriceLevel::new(Price::from_f64(price).unwrap())
    }

    #[test]
    fn test_add_then_delete_keeps_fifo() {
        let mut l = level(10_000.0);
        l.add(Order::new(1, 1, Side::Bid, 5.0));
        l.add(Order::new(2, 1, Side::Bid, 8.0));
        l.add(Order::new(3, 1, Side::Bid, 10.0));

        let deleted = l.delete(2).unwrap();
        assert_eq!(deleted.remaining_size, 8.0);

        let ids: Vec<_> = l.orders().map(|o| o.id).collect();
        assert_eq!(ids, vec![1, 3]);
        assert_eq!(l.total_volume(), 15.0);
    }

    #[test]
    fn test_delete_unknown_is_none() {
        let mut l = level(10_000.0);
        l.add(Order::new(1, 1, Side::Bid, 5.0));
        assert!(l.delete(99).is_none());
        assert_eq!(l.total_volume(), 5.0);
    }

    #[test]
    fn test_fill_partial_leaves_head() {
        let mut l = level(9_000.0);
        l.add(Order::new(1, 1, Side::Bid, 10.0));

        let mut incoming = Order::new(2, 2, Side::Ask, 4.0);
        let outcome = l.fill(&mut incoming);

        assert_eq!(outcome.matches.len(), 1);
        assert_eq!(outcome.matches[0].size_filled, 4.0);
        assert!(outcome.filled.is_empty());
        assert!(incoming.is_filled());
        assert_eq!(l.total_volume(), 6.0);
        assert_eq!(l.orders().next().unwrap().remaining_size, 6.0);
    }

    #[test]
    fn test_fill_exact_sizes_zero_both() {
        let mut l = level(9_000.0);
        l.add(Order::new(1, 1, Side::Bid, 7.0));

        let mut incoming = Order::new(2, 2, Side::Ask, 7.0);
        let outcome = l.fill(&mut incoming);

        assert_eq!(outcome.matches.len(), 1);
        assert_eq!(outcome.filled, vec![1]);
        assert!(incoming.is_filled());
        assert!(l.is_empty());
        assert_eq!(l.total_volume(), 0.0);
    }

    #[test]
    fn test_fill_walks_queue_in_order() {
        let mut l = level(9_000.0);
        l.add(Order::new(1, 1, Side::Bid, 10.0));
        l.add(Order::new(2, 2, Side::Bid, 20.0));

        let mut incoming = Order::new(3, 3, Side::Ask, 25.0);
        let outcome = l.fill(&mut incoming);

        assert_eq!(outcome.matches.len(), 2);
        assert_eq!(outcome.matches[0].bid_order_id, 1);
        assert_eq!(outcome.matches[0].size_filled, 10.0);
        assert_eq!(outcome.matches[1].bid_order_id, 2);
        assert_eq!(outcome.matches[1].size_filled, 15.0);
        assert_eq!(outcome.filled, vec![1]);
        assert_eq!(l.total_volume(), 5.0);
    }

    #[test]
    fn test_fill_assigns_sides_by_resting_order() {
        let mut l = level(100.0);
        l.add(Order::new(1, 1, Side::Ask, 3.0));

        let mut incoming = Order::new(2, 2, Side::Bid, 3.0);
        let outcome = l.fill(&mut incoming);

        let m = &outcome.matches[0];
        assert_eq!(m.ask_order_id, 1);
        assert_eq!(m.ask_user_id, 1);
        assert_eq!(m.bid_order_id, 2);
        assert_eq!(m.bid_user_id, 2);
        assert_eq!(m.price, Price::from_f64(100.0).unwrap());
    }

    #[test]
    fn test_fill_zero_size_incoming_is_noop() {
        let mut l = level(100.0);
        l.add(Order::new(1, 1, Side::Ask, 3.0));

        let mut incoming = Order::new(2, 2, Side::Bid, 0.0);
        let outcome = l.fill(&mut incoming);

        assert!(outcome.matches.is_empty());
        assert_eq!(l.total_volume(), 3.0);
    }

    #[test]
    #[should_panic]
    fn test_add_zero_size_panics() {
        let mut l = level(100.0);
        l.add(Order::new(1, 1, Side::Bid, 0.0));
    }

    #[test]
    fn test_queue_timestamps_non_decreasing() {
        let mut l = level(100.0);
        for id in 0..5 {
            l.add(Order::new(id, 1, Side::Bid, 1.0));
        }
        let stamps: Vec<_> = l.orders().map(|o| o.timestamp_ns).collect();
        assert!(stamps.windows(2).all(|w| w[0] <= w[1]));
    }
}
