//! Request and report models
//!
//! `OrderRequest` is the untyped boundary: loose symbol text, a kind tag
//! with an optional price, raw decimals. `into_order` is the only path
//! from a request to a typed `Order`, so an ill-formed order never exists
//! past this point.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use position_ledger::ProtectiveLevels;
use types::errors::RejectReason;
use types::ids::{AccountId, OrderId, Symbol};
use types::numeric::{Price, Quantity};
use types::order::{Order, OrderStatus, Side};
use types::trade::Trade;

/// Requested order kind, price carried separately as raw input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RequestKind {
    Market,
    Limit,
}

/// Raw order placement request as a caller would submit it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRequest {
    pub owner_id: AccountId,
    /// Loose pair input, resolved case- and delimiter-insensitively
    pub symbol: String,
    pub side: Side,
    pub kind: RequestKind,
    /// Required for limit orders, ignored for market orders
    pub limit_price: Option<Decimal>,
    pub quantity: Decimal,
    /// Defaults to 1
    pub leverage: Option<u8>,
}

impl OrderRequest {
    pub fn market(owner_id: AccountId, symbol: impl Into<String>, side: Side, quantity: Decimal) -> Self {
        Self {
            owner_id,
            symbol: symbol.into(),
            side,
            kind: RequestKind::Market,
            limit_price: None,
            quantity,
            leverage: None,
        }
    }

    pub fn limit(
        owner_id: AccountId,
        symbol: impl Into<String>,
        side: Side,
        limit_price: Decimal,
        quantity: Decimal,
    ) -> Self {
        Self {
            owner_id,
            symbol: symbol.into(),
            side,
            kind: RequestKind::Limit,
            limit_price: Some(limit_price),
            quantity,
            leverage: None,
        }
    }

    /// Build the typed order against an already-resolved canonical symbol
    pub fn into_order(self, symbol: Symbol) -> Result<Order, RejectReason> {
        let quantity =
            Quantity::try_new(self.quantity).map_err(|_| RejectReason::InvalidQuantity)?;
        if quantity.is_negligible() {
            return Err(RejectReason::InvalidQuantity);
        }

        let order = match self.kind {
            RequestKind::Market => Order::market(self.owner_id, symbol, self.side, quantity),
            RequestKind::Limit => {
                let raw = self.limit_price.ok_or(RejectReason::MissingPrice)?;
                let price = Price::try_new(raw).map_err(|_| RejectReason::MissingPrice)?;
                Order::limit(self.owner_id, symbol, self.side, price, quantity)
            }
        }
        .map_err(|_| RejectReason::InvalidQuantity)?;

        Ok(order.with_leverage(self.leverage.unwrap_or(1)))
    }
}

/// Outcome of a placement returned to the caller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceReport {
    pub order_id: OrderId,
    pub status: OrderStatus,
    pub trades: Vec<Trade>,
}

/// Outcome of a multiplier-mode placement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultiplierReport {
    pub report: PlaceReport,
    /// Quantity derived from the investment amount
    pub quantity: Quantity,
    /// Default protective levels around the reference entry
    pub levels: ProtectiveLevels,
}
