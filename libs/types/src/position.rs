//! Position tracking types
//!
//! One position per (owner, symbol): a signed quantity (positive = long,
//! negative = short) with a quantity-weighted average entry price. The
//! average price carries no meaning while flat, so it is `None` exactly
//! when `signed_quantity == 0`.

use crate::ids::{AccountId, Symbol};
use crate::numeric::Price;
use crate::order::Side;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Per (owner, symbol) position state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub owner_id: AccountId,
    pub symbol: Symbol,
    /// Positive = long, negative = short, zero = flat
    pub signed_quantity: Decimal,
    /// Quantity-weighted average entry price; `None` iff flat
    pub avg_entry_price: Option<Price>,
    pub leverage: u8,
    /// Running total of PnL realized by closes and flips
    pub realized_pnl: Decimal,
    /// Unix nanoseconds of the last applied trade
    pub last_updated: i64,
}

impl Position {
    /// Create a flat position
    pub fn flat(owner_id: AccountId, symbol: Symbol) -> Self {
        Self {
            owner_id,
            symbol,
            signed_quantity: Decimal::ZERO,
            avg_entry_price: None,
            leverage: 1,
            realized_pnl: Decimal::ZERO,
            last_updated: 0,
        }
    }

    pub fn is_flat(&self) -> bool {
        self.signed_quantity.is_zero()
    }

    pub fn is_long(&self) -> bool {
        self.signed_quantity > Decimal::ZERO
    }

    pub fn is_short(&self) -> bool {
        self.signed_quantity < Decimal::ZERO
    }

    /// Direction a fill on `side` pushes a signed quantity: +1 buy, -1 sell
    pub fn direction(side: Side) -> Decimal {
        match side {
            Side::Buy => Decimal::ONE,
            Side::Sell => Decimal::NEGATIVE_ONE,
        }
    }

    /// Unrealized PnL against a mark price:
    /// `(mark − avg_entry) × signed_quantity × leverage`
    ///
    /// Zero while flat.
    pub fn unrealized_pnl(&self, mark_price: Price) -> Decimal {
        match self.avg_entry_price {
            Some(entry) => {
                (mark_price.as_decimal() - entry.as_decimal())
                    * self.signed_quantity
                    * Decimal::from(self.leverage)
            }
            None => Decimal::ZERO,
        }
    }
}
