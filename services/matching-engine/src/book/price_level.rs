//! Price level with a FIFO order queue
//!
//! A price level holds every resting order at one price, in admission
//! order. The front of the queue is always the oldest order, which is
//! matched first. Remainders below the dust tolerance are purged so no
//! near-zero orders linger.

use std::collections::VecDeque;
use types::ids::{AccountId, OrderId};
use types::numeric::Quantity;

/// A resting order's footprint at a price level
#[derive(Debug, Clone)]
pub struct LevelEntry {
    pub order_id: OrderId,
    pub owner_id: AccountId,
    pub remaining_quantity: Quantity,
    /// Leverage on the resting order, carried into its trades
    pub leverage: u8,
    /// Admission sequence, strictly increasing along the queue
    pub created_at: u64,
}

/// Outcome of filling the front order of a level
#[derive(Debug, Clone, PartialEq)]
pub struct FrontFill {
    pub order_id: OrderId,
    /// True when the maker was fully consumed (or reduced to dust) and
    /// left the queue
    pub exhausted: bool,
}

/// All orders resting at one price, FIFO
#[derive(Debug, Clone, Default)]
pub struct PriceLevel {
    orders: VecDeque<LevelEntry>,
    total_quantity: Quantity,
}

impl PriceLevel {
    pub fn new() -> Self {
        Self {
            orders: VecDeque::new(),
            total_quantity: Quantity::zero(),
        }
    }

    /// Queue an order behind every existing order at this price
    pub fn push_back(&mut self, entry: LevelEntry) {
        self.total_quantity = self.total_quantity + entry.remaining_quantity;
        self.orders.push_back(entry);
    }

    /// Oldest order at this level
    pub fn front(&self) -> Option<&LevelEntry> {
        self.orders.front()
    }

    /// Consume `quantity` from the front order
    ///
    /// The quantity must not exceed the front order's remainder. If the
    /// remainder hits zero or dust, the order leaves the queue.
    pub fn fill_front(&mut self, quantity: Quantity) -> Option<FrontFill> {
        let entry = self.orders.front_mut()?;
        let order_id = entry.order_id;

        let remaining = entry.remaining_quantity.checked_sub(quantity)?;
        entry.remaining_quantity = remaining;
        self.total_quantity = self.total_quantity - quantity;

        if remaining.is_negligible() {
            // Purge dust along with the entry so the level total stays clean
            self.total_quantity = self.total_quantity - remaining;
            self.orders.pop_front();
            Some(FrontFill {
                order_id,
                exhausted: true,
            })
        } else {
            Some(FrontFill {
                order_id,
                exhausted: false,
            })
        }
    }

    /// Remove an order anywhere in the queue (cancellation path)
    pub fn remove(&mut self, order_id: &OrderId) -> Option<LevelEntry> {
        let position = self.orders.iter().position(|e| &e.order_id == order_id)?;
        let entry = self.orders.remove(position)?;
        self.total_quantity = self.total_quantity - entry.remaining_quantity;
        Some(entry)
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    pub fn total_quantity(&self) -> Quantity {
        self.total_quantity
    }

    pub fn order_count(&self) -> usize {
        self.orders.len()
    }
}
