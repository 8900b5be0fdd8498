//! Trade execution types
//!
//! A trade is the immutable record of one match: created once, never
//! mutated or deleted. Price is always the resting (maker) order's price.

use crate::ids::{AccountId, OrderId, Symbol, TradeId};
use crate::numeric::{Price, Quantity};
use crate::order::Side;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Immutable record of one match between a maker and a taker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub trade_id: TradeId,
    /// Global monotonic sequence assigned at execution
    pub sequence: u64,
    pub symbol: Symbol,

    // Order references
    pub maker_order_id: OrderId,
    pub taker_order_id: OrderId,

    // Owner references, needed to apply the trade to both ledger sides
    pub maker_owner_id: AccountId,
    pub taker_owner_id: AccountId,

    /// Side of the incoming (taker) order
    pub taker_side: Side,
    /// Execution price: the maker's resting price
    pub price: Price,
    pub quantity: Quantity,
    /// Leverage on the resting (maker) order
    pub maker_leverage: u8,
    /// Leverage on the incoming (taker) order
    pub taker_leverage: u8,

    /// Unix nanoseconds
    pub executed_at: i64,
}

impl Trade {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        sequence: u64,
        symbol: Symbol,
        maker_order_id: OrderId,
        taker_order_id: OrderId,
        maker_owner_id: AccountId,
        taker_owner_id: AccountId,
        taker_side: Side,
        price: Price,
        quantity: Quantity,
        maker_leverage: u8,
        taker_leverage: u8,
        executed_at: i64,
    ) -> Self {
        Self {
            trade_id: TradeId::new(),
            sequence,
            symbol,
            maker_order_id,
            taker_order_id,
            maker_owner_id,
            taker_owner_id,
            taker_side,
            price,
            quantity,
            maker_leverage,
            taker_leverage,
            executed_at,
        }
    }

    /// Notional value (price × quantity)
    pub fn notional(&self) -> Decimal {
        self.quantity.as_decimal() * self.price.as_decimal()
    }

    /// Side of the resting (maker) order
    pub fn maker_side(&self) -> Side {
        self.taker_side.opposite()
    }
}
