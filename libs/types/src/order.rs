//! Order lifecycle types
//!
//! An order is created by a caller request, mutated only by the order book
//! during matching, and becomes terminal exactly once.

use crate::errors::NumericError;
use crate::ids::{AccountId, OrderId, Symbol};
use crate::numeric::{Price, Quantity};
use serde::{Deserialize, Serialize};

/// Order side (buyer or seller)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    /// Buy order (bid)
    Buy,
    /// Sell order (ask)
    Sell,
}

impl Side {
    /// Get the opposite side
    pub fn opposite(&self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

/// Order kind with kind-specific required fields
///
/// A limit order cannot exist without a positive price; `Price` enforces
/// positivity at construction, so an ill-formed limit order is
/// unrepresentable past the request boundary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "UPPERCASE")]
pub enum OrderKind {
    /// Execute immediately against resting liquidity; never rests
    Market,
    /// Match while crossing, then rest at the limit price
    Limit { limit_price: Price },
}

impl OrderKind {
    /// Limit price if this is a limit order
    pub fn limit_price(&self) -> Option<Price> {
        match self {
            OrderKind::Market => None,
            OrderKind::Limit { limit_price } => Some(*limit_price),
        }
    }

    pub fn is_market(&self) -> bool {
        matches!(self, OrderKind::Market)
    }
}

/// Margin accounting mode, informational on the order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MarginMode {
    Isolated,
    Cross,
}

impl Default for MarginMode {
    fn default() -> Self {
        MarginMode::Isolated
    }
}

/// Order status
///
/// `Filled`, `Cancelled`, and `Rejected` are terminal. `Open` is also a
/// valid terminal state for a market order that found no liquidity: the
/// remainder is discarded, never rested, and the state is distinct from
/// rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Accepted, no fills yet
    Open,
    /// Some quantity executed, remainder outstanding or discarded
    PartiallyFilled,
    /// Completely executed (terminal)
    Filled,
    /// Removed from the book before completion (terminal)
    Cancelled,
    /// Failed validation, never reached the book (terminal)
    ///
    /// Placement rejects before an order is admitted, so the book never
    /// assigns this status itself; it exists for serialized order records
    /// reported back to callers.
    Rejected,
}

impl OrderStatus {
    /// Check if no further transitions are possible
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Filled | OrderStatus::Cancelled | OrderStatus::Rejected
        )
    }
}

/// A resting or transient trading instruction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: OrderId,
    pub owner_id: AccountId,
    pub symbol: Symbol,
    pub side: Side,
    pub kind: OrderKind,
    pub quantity: Quantity,
    pub filled_quantity: Quantity,
    pub remaining_quantity: Quantity,
    pub status: OrderStatus,
    /// Leverage multiplier, >= 1
    pub leverage: u8,
    pub margin_mode: MarginMode,
    /// Monotonic admission sequence assigned by the book; time-priority
    /// tie-break key. Zero until admitted.
    pub created_at: u64,
}

impl Order {
    /// Create a market order
    pub fn market(
        owner_id: AccountId,
        symbol: Symbol,
        side: Side,
        quantity: Quantity,
    ) -> Result<Self, NumericError> {
        Self::new(owner_id, symbol, side, OrderKind::Market, quantity)
    }

    /// Create a limit order
    pub fn limit(
        owner_id: AccountId,
        symbol: Symbol,
        side: Side,
        limit_price: Price,
        quantity: Quantity,
    ) -> Result<Self, NumericError> {
        Self::new(owner_id, symbol, side, OrderKind::Limit { limit_price }, quantity)
    }

    fn new(
        owner_id: AccountId,
        symbol: Symbol,
        side: Side,
        kind: OrderKind,
        quantity: Quantity,
    ) -> Result<Self, NumericError> {
        if quantity.is_zero() {
            return Err(NumericError::NegativeQuantity(quantity.as_decimal()));
        }
        Ok(Self {
            order_id: OrderId::new(),
            owner_id,
            symbol,
            side,
            kind,
            quantity,
            filled_quantity: Quantity::zero(),
            remaining_quantity: quantity,
            status: OrderStatus::Open,
            leverage: 1,
            margin_mode: MarginMode::default(),
            created_at: 0,
        })
    }

    /// Set leverage (builder style); clamps to at least 1
    pub fn with_leverage(mut self, leverage: u8) -> Self {
        self.leverage = leverage.max(1);
        self
    }

    /// Set margin mode (builder style)
    pub fn with_margin_mode(mut self, mode: MarginMode) -> Self {
        self.margin_mode = mode;
        self
    }

    /// Check quantity invariant: filled + remaining = total
    pub fn check_invariant(&self) -> bool {
        self.filled_quantity.as_decimal() + self.remaining_quantity.as_decimal()
            == self.quantity.as_decimal()
    }

    /// Check if order is completely filled
    pub fn is_filled(&self) -> bool {
        self.filled_quantity == self.quantity
    }

    /// Check if order has any fills
    pub fn has_fills(&self) -> bool {
        !self.filled_quantity.is_zero()
    }

    /// Record a fill and adjust status
    ///
    /// Fails with the would-be overfill amount if the fill exceeds the
    /// remaining quantity; the order is untouched on failure.
    pub fn add_fill(&mut self, fill_quantity: Quantity) -> Result<(), NumericError> {
        let remaining = self
            .remaining_quantity
            .checked_sub(fill_quantity)
            .ok_or_else(|| {
                NumericError::NegativeQuantity(
                    self.remaining_quantity.as_decimal() - fill_quantity.as_decimal(),
                )
            })?;

        self.filled_quantity = self.filled_quantity + fill_quantity;
        self.remaining_quantity = remaining;

        if self.is_filled() {
            self.status = OrderStatus::Filled;
        } else if self.has_fills() {
            self.status = OrderStatus::PartiallyFilled;
        }

        debug_assert!(self.check_invariant());
        Ok(())
    }

    /// Mark a resting order cancelled; no-op guard against terminal states
    pub fn cancel(&mut self) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.status = OrderStatus::Cancelled;
        true
    }
}
