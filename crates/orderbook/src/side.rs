//! Price-ordered collection of levels for one side of the book

use std::collections::BTreeMap;

use crate::domain::Side;
use crate::level::PriceLevel;
use crate::price::Price;

/// All price levels on one side, keyed by canonical price
///
/// The map gives logarithmic insert/remove and an in-order traversal;
/// the bid side simply walks it in reverse so that iteration is always
/// best price first. Levels reachable through the index are never
/// empty: callers drop a level as soon as its last order goes.
#[derive(Debug)]
pub struct SideIndex {
    side: Side,
    levels: BTreeMap<Price, PriceLevel>,
}

impl SideIndex {
    pub fn new(side: Side) -> Self {
        Self {
            side,
            levels: BTreeMap::new(),
        }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn get_or_create(&mut self, price: Price) -> &mut PriceLevel {
        self.levels
            .entry(price)
            .or_insert_with(|| PriceLevel::new(price))
    }

    pub fn get(&self, price: Price) -> Option<&PriceLevel> {
        self.levels.get(&price)
    }

    pub fn get_mut(&mut self, price: Price) -> Option<&mut PriceLevel> {
        self.levels.get_mut(&price)
    }

    pub fn remove(&mut self, price: Price) -> Option<PriceLevel> {
        self.levels.remove(&price)
    }

    /// Best price on this side: highest bid, lowest ask.
    pub fn best(&self) -> Option<Price> {
        match self.side {
            Side::Ask => self.levels.keys().next().copied(),
            Side::Bid => self.levels.keys().next_back().copied(),
        }
    }

    /// Levels in matching order: ascending price for asks, descending
    /// for bids.
    pub fn iter_best_first(&self) -> Box<dyn Iterator<Item = &PriceLevel> + '_> {
        match self.side {
            Side::Ask => Box::new(self.levels.values()),
            Side::Bid => Box::new(self.levels.values().rev()),
        }
    }

    /// Snapshot of the traversal order, for walks that mutate levels.
    pub fn prices_best_first(&self) -> Vec<Price> {
        match self.side {
            Side::Ask => self.levels.keys().copied().collect(),
            Side::Bid => self.levels.keys().rev().copied().collect(),
        }
    }

    pub fn total_volume(&self) -> f64 {
        self.levels.values().map(|l| l.total_volume()).sum()
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Order;

    fn price(p: f64) -> Price {
        Price::from_f64(p).unwrap()
    }

    #[test]
    fn test_asks_iterate_ascending() {
        let mut asks = SideIndex::new(Side::Ask);
        for (id, p) in [(1, 102.0), (2, 100.0), (3, 101.0)] {
            asks.get_or_create(price(p))
                .add(Order::new(id, 1, Side::Ask, 5.0));
        }
        let prices: Vec<_> = asks.iter_best_first().map(|l| l.price().as_f64()).collect();
        assert_eq!(prices, vec![100.0, 101.0, 102.0]);
        assert_eq!(asks.best(), Some(price(100.0)));
    }

    #[test]
    fn test_bids_iterate_descending() {
        let mut bids = SideIndex::new(Side::Bid);
        for (id, p) in [(1, 98.0), (2, 100.0), (3, 99.0)] {
            bids.get_or_create(price(p))
                .add(Order::new(id, 1, Side::Bid, 5.0));
        }
        let prices: Vec<_> = bids.iter_best_first().map(|l| l.price().as_f64()).collect();
        assert_eq!(prices, vec![100.0, 99.0, 98.0]);
        assert_eq!(bids.best(), Some(price(100.0)));
    }

    #[test]
    fn test_get_or_create_is_idempotent_per_price() {
        let mut asks = SideIndex::new(Side::Ask);
        asks.get_or_create(price(100.0))
            .add(Order::new(1, 1, Side::Ask, 1.0));
        asks.get_or_create(price(100.0))
            .add(Order::new(2, 1, Side::Ask, 2.0));
        assert_eq!(asks.len(), 1);
        assert_eq!(asks.total_volume(), 3.0);
    }

    #[test]
    fn test_remove_drops_level() {
        let mut asks = SideIndex::new(Side::Ask);
        asks.get_or_create(price(100.0))
            .add(Order::new(1, 1, Side::Ask, 1.0));
        assert!(asks.remove(price(100.0)).is_some());
        assert!(asks.is_empty());
        assert_eq!(asks.best(), None);
    }
}
