//! Book events
//!
//! Every successful `place` emits zero or more `TradeExecuted` events (one
//! per match, in match order) followed by exactly one `TopOfBook` delta
//! for the symbol. Subscribers receive them in exactly this order.

use serde::{Deserialize, Serialize};
use types::ids::Symbol;
use types::numeric::{Price, Quantity};
use types::trade::Trade;

/// One side's best level
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BookLevel {
    pub price: Price,
    pub quantity: Quantity,
}

/// Event emitted by the order book during `place` and `cancel`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event_type")]
pub enum BookEvent {
    /// A maker and taker matched
    TradeExecuted { trade: Trade },

    /// New top-of-book state after a mutation
    TopOfBook {
        symbol: Symbol,
        /// Per-book monotonic delta sequence
        sequence: u64,
        best_bid: Option<BookLevel>,
        best_ask: Option<BookLevel>,
        timestamp: i64,
    },
}

impl BookEvent {
    /// Symbol this event concerns
    pub fn symbol(&self) -> &Symbol {
        match self {
            BookEvent::TradeExecuted { trade } => &trade.symbol,
            BookEvent::TopOfBook { symbol, .. } => symbol,
        }
    }

    /// Label for logging
    pub fn label(&self) -> &'static str {
        match self {
            BookEvent::TradeExecuted { .. } => "TradeExecuted",
            BookEvent::TopOfBook { .. } => "TopOfBook",
        }
    }
}
