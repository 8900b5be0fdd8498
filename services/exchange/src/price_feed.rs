//! Reference price seam
//!
//! The feed answers "what is this pair worth right now" for notional
//! checks, the slippage shield, PnL marks, and multiplier-mode quantity
//! derivation. Absence of a price is not an error: dependent checks are
//! skipped and placement continues.

use std::collections::HashMap;
use std::sync::RwLock;

use types::ids::Symbol;
use types::numeric::Price;

/// Source of reference (mid/last) prices
pub trait PriceFeed: Send + Sync {
    /// Current reference price, or None when the feed has nothing
    fn reference_price(&self, symbol: &Symbol) -> Option<Price>;
}

/// Fixed price table, settable at runtime
///
/// Stands in for a market-data service in tests and single-process
/// deployments.
#[derive(Debug, Default)]
pub struct StaticPriceFeed {
    prices: RwLock<HashMap<Symbol, Price>>,
}

impl StaticPriceFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, symbol: Symbol, price: Price) {
        self.prices
            .write()
            .expect("price feed lock poisoned")
            .insert(symbol, price);
    }

    pub fn clear(&self, symbol: &Symbol) {
        self.prices
            .write()
            .expect("price feed lock poisoned")
            .remove(symbol);
    }
}

impl PriceFeed for StaticPriceFeed {
    fn reference_price(&self, symbol: &Symbol) -> Option<Price> {
        self.prices
            .read()
            .expect("price feed lock poisoned")
            .get(symbol)
            .copied()
    }
}
