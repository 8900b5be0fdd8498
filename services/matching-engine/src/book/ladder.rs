//! Side-aware price ladder
//!
//! One ladder per book side. `BTreeMap` keeps levels sorted and iteration
//! deterministic; priority order is price descending for bids and price
//! ascending for asks, with FIFO queues inside each level.

use std::collections::BTreeMap;

use types::ids::OrderId;
use types::numeric::{Price, Quantity};
use types::order::Side;

use super::price_level::{FrontFill, LevelEntry, PriceLevel};

/// Price ladder for one side of the book
#[derive(Debug, Clone)]
pub struct Ladder {
    side: Side,
    levels: BTreeMap<Price, PriceLevel>,
}

impl Ladder {
    pub fn new(side: Side) -> Self {
        Self {
            side,
            levels: BTreeMap::new(),
        }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    /// Best price on this side: highest bid, lowest ask
    pub fn best_price(&self) -> Option<Price> {
        match self.side {
            Side::Buy => self.levels.keys().next_back().copied(),
            Side::Sell => self.levels.keys().next().copied(),
        }
    }

    /// Best price together with the quantity resting there
    pub fn best(&self) -> Option<(Price, Quantity)> {
        let price = self.best_price()?;
        let level = self.levels.get(&price)?;
        Some((price, level.total_quantity()))
    }

    /// Consume quantity from the front order at the best level, dropping
    /// the level once empty
    pub fn fill_best(&mut self, price: Price, quantity: Quantity) -> Option<FrontFill> {
        let level = self.levels.get_mut(&price)?;
        let fill = level.fill_front(quantity)?;
        if level.is_empty() {
            self.levels.remove(&price);
        }
        Some(fill)
    }

    /// Rest an order behind existing orders at its price
    pub fn insert(&mut self, price: Price, entry: LevelEntry) {
        self.levels.entry(price).or_default().push_back(entry);
    }

    /// Remove a resting order; drops the level if it empties
    pub fn remove(&mut self, order_id: &OrderId, price: Price) -> Option<LevelEntry> {
        let level = self.levels.get_mut(&price)?;
        let entry = level.remove(order_id)?;
        if level.is_empty() {
            self.levels.remove(&price);
        }
        Some(entry)
    }

    /// Top N levels in priority order as (price, total quantity)
    pub fn depth(&self, depth: usize) -> Vec<(Price, Quantity)> {
        match self.side {
            Side::Buy => self
                .levels
                .iter()
                .rev()
                .take(depth)
                .map(|(price, level)| (*price, level.total_quantity()))
                .collect(),
            Side::Sell => self
                .levels
                .iter()
                .take(depth)
                .map(|(price, level)| (*price, level.total_quantity()))
                .collect(),
        }
    }

    /// Walk levels in priority order without bound
    pub fn iter_priority(&self) -> Box<dyn Iterator<Item = (&Price, &PriceLevel)> + '_> {
        match self.side {
            Side::Buy => Box::new(self.levels.iter().rev()),
            Side::Sell => Box::new(self.levels.iter()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn level_count(&self) -> usize {
        self.levels.len()
    }
}
