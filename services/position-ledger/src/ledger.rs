//! Trade application
//!
//! `apply` is called once per trade per side: the buyer and the seller
//! each get their own update. Rules:
//!
//! - Same direction: quantity-weighted average entry price, magnitude
//!   grows
//! - Opposite direction: the closing portion realizes
//!   `(price - avg_entry) x closed x sign x leverage`; a residual beyond
//!   the existing quantity opens the opposite direction at the trade
//!   price
//! - Signed quantities inside the dust tolerance collapse to flat
//!
//! Shortfalls are the risk engine's job to prevent. If malformed input
//! reaches `apply` anyway, the fault is logged and the position is not
//! mutated.

use std::collections::HashMap;

use rust_decimal::prelude::Signed;
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{debug, error};

use types::ids::{AccountId, Symbol};
use types::numeric::{Price, QTY_EPSILON};
use types::order::Side;
use types::position::Position;
use types::trade::Trade;

/// Fatal ledger failure; the position is untouched when this is returned
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("consistency fault in ledger: {detail}")]
    ConsistencyFault { detail: String },
}

/// All positions, keyed by (owner, symbol)
#[derive(Debug, Default)]
pub struct PositionLedger {
    positions: HashMap<(AccountId, Symbol), Position>,
}

impl PositionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one side of a trade to its owner's position
    ///
    /// `fill_side` is the direction the owner traded: the taker's side
    /// for the taker, its opposite for the maker. Returns the updated
    /// position.
    pub fn apply(
        &mut self,
        trade: &Trade,
        fill_side: Side,
        owner_id: AccountId,
    ) -> Result<Position, LedgerError> {
        if trade.quantity.is_negligible() {
            let detail = format!(
                "trade {} carries negligible quantity {}",
                trade.trade_id, trade.quantity
            );
            error!(symbol = %trade.symbol, "consistency fault: {detail}");
            return Err(LedgerError::ConsistencyFault { detail });
        }

        let key = (owner_id, trade.symbol.clone());
        let position = self
            .positions
            .entry(key)
            .or_insert_with(|| Position::flat(owner_id, trade.symbol.clone()));

        if !position.is_flat() && position.avg_entry_price.is_none() {
            let detail = format!(
                "position ({}, {}) has quantity {} but no entry price",
                owner_id, trade.symbol, position.signed_quantity
            );
            error!(%owner_id, symbol = %trade.symbol, "consistency fault: {detail}");
            return Err(LedgerError::ConsistencyFault { detail });
        }

        let direction = Position::direction(fill_side);
        let quantity = trade.quantity.as_decimal();
        let price = trade.price.as_decimal();
        // Each side's position carries the leverage that side chose
        let leverage = if fill_side == trade.taker_side {
            trade.taker_leverage
        } else {
            trade.maker_leverage
        };

        let same_direction =
            position.is_flat() || position.signed_quantity.signum() == direction;

        if same_direction {
            // Extend: weighted average entry
            let old_magnitude = position.signed_quantity.abs();
            let old_entry = position
                .avg_entry_price
                .map(|p| p.as_decimal())
                .unwrap_or(Decimal::ZERO);
            let new_entry =
                (old_magnitude * old_entry + quantity * price) / (old_magnitude + quantity);

            let new_entry = Price::try_new(new_entry).map_err(|e| {
                let detail = format!("bad weighted entry price: {e}");
                error!(symbol = %trade.symbol, "consistency fault: {detail}");
                LedgerError::ConsistencyFault { detail }
            })?;

            if position.is_flat() {
                position.leverage = leverage;
            }
            position.signed_quantity += direction * quantity;
            position.avg_entry_price = Some(new_entry);
        } else {
            let entry = position
                .avg_entry_price
                .map(|p| p.as_decimal())
                .unwrap_or(Decimal::ZERO);
            let closing = position.signed_quantity.abs().min(quantity);
            let sign = position.signed_quantity.signum();
            let realized =
                (price - entry) * closing * sign * Decimal::from(position.leverage);
            position.realized_pnl += realized;

            position.signed_quantity += direction * quantity;

            if position.signed_quantity.abs() < QTY_EPSILON {
                // Closed out (possibly with dust); collapse to flat
                position.signed_quantity = Decimal::ZERO;
                position.avg_entry_price = None;
            } else if position.signed_quantity.signum() == direction {
                // Flipped: residual opens fresh at the trade price
                position.avg_entry_price = Some(trade.price);
                position.leverage = leverage;
            }
            // Reduced but still open: entry price unchanged

            debug!(
                %owner_id,
                symbol = %trade.symbol,
                realized = %realized,
                remaining = %position.signed_quantity,
                "position reduced"
            );
        }

        position.last_updated = trade.executed_at;
        Ok(position.clone())
    }

    /// Current position, if any trade ever touched it
    pub fn position(&self, owner_id: &AccountId, symbol: &Symbol) -> Option<&Position> {
        self.positions.get(&(*owner_id, symbol.clone()))
    }

    /// Signed quantity for risk checks; zero when no position exists
    pub fn signed_quantity(&self, owner_id: &AccountId, symbol: &Symbol) -> Decimal {
        self.position(owner_id, symbol)
            .map(|p| p.signed_quantity)
            .unwrap_or(Decimal::ZERO)
    }

    /// All non-flat positions for an owner
    pub fn positions_for(&self, owner_id: &AccountId) -> Vec<&Position> {
        self.positions
            .values()
            .filter(|p| p.owner_id == *owner_id && !p.is_flat())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::ids::OrderId;
    use types::numeric::Quantity;

    fn symbol() -> Symbol {
        Symbol::try_new("BTC/USDT").unwrap()
    }

    fn trade(price: u64, qty: &str, leverage: u8) -> Trade {
        Trade::new(
            0,
            symbol(),
            OrderId::new(),
            OrderId::new(),
            AccountId::new(),
            AccountId::new(),
            Side::Buy,
            Price::from_u64(price),
            Quantity::from_str(qty).unwrap(),
            leverage,
            leverage,
            1708123456789000000,
        )
    }

    #[test]
    fn test_open_long_from_flat() {
        let mut ledger = PositionLedger::new();
        let owner = AccountId::new();

        let position = ledger.apply(&trade(100, "2.0", 1), Side::Buy, owner).unwrap();

        assert_eq!(position.signed_quantity, Decimal::from(2));
        assert_eq!(position.avg_entry_price, Some(Price::from_u64(100)));
        assert_eq!(position.realized_pnl, Decimal::ZERO);
    }

    #[test]
    fn test_extend_uses_weighted_average() {
        let mut ledger = PositionLedger::new();
        let owner = AccountId::new();

        ledger.apply(&trade(100, "1.0", 1), Side::Buy, owner).unwrap();
        let position = ledger.apply(&trade(110, "1.0", 1), Side::Buy, owner).unwrap();

        // (1x100 + 1x110) / 2 = 105
        assert_eq!(position.signed_quantity, Decimal::from(2));
        assert_eq!(position.avg_entry_price, Some(Price::from_u64(105)));
        assert_eq!(position.realized_pnl, Decimal::ZERO);
    }

    #[test]
    fn test_reduce_realizes_pnl() {
        let mut ledger = PositionLedger::new();
        let owner = AccountId::new();

        ledger.apply(&trade(100, "2.0", 1), Side::Buy, owner).unwrap();
        let position = ledger.apply(&trade(120, "1.0", 1), Side::Sell, owner).unwrap();

        // (120 - 100) x 1 x (+1) x 1 = 20
        assert_eq!(position.realized_pnl, Decimal::from(20));
        assert_eq!(position.signed_quantity, Decimal::ONE);
        // Entry price survives a partial close
        assert_eq!(position.avg_entry_price, Some(Price::from_u64(100)));
    }

    #[test]
    fn test_full_close_goes_flat() {
        let mut ledger = PositionLedger::new();
        let owner = AccountId::new();

        ledger.apply(&trade(100, "1.0", 1), Side::Buy, owner).unwrap();
        let position = ledger.apply(&trade(90, "1.0", 1), Side::Sell, owner).unwrap();

        assert!(position.is_flat());
        assert_eq!(position.avg_entry_price, None);
        // (90 - 100) x 1 x (+1) x 1 = -10
        assert_eq!(position.realized_pnl, Decimal::from(-10));
    }

    #[test]
    fn test_flip_opens_residual_at_trade_price() {
        let mut ledger = PositionLedger::new();
        let owner = AccountId::new();

        ledger.apply(&trade(100, "1.0", 1), Side::Buy, owner).unwrap();
        let position = ledger.apply(&trade(110, "3.0", 1), Side::Sell, owner).unwrap();

        // 1 closes (+10 realized), 2 opens short at 110
        assert_eq!(position.signed_quantity, Decimal::from(-2));
        assert_eq!(position.avg_entry_price, Some(Price::from_u64(110)));
        assert_eq!(position.realized_pnl, Decimal::from(10));
        assert!(position.is_short());
    }

    #[test]
    fn test_short_reduce_realizes_pnl() {
        let mut ledger = PositionLedger::new();
        let owner = AccountId::new();

        ledger.apply(&trade(100, "2.0", 1), Side::Sell, owner).unwrap();
        let position = ledger.apply(&trade(80, "2.0", 1), Side::Buy, owner).unwrap();

        // (80 - 100) x 2 x (-1) x 1 = 40
        assert_eq!(position.realized_pnl, Decimal::from(40));
        assert!(position.is_flat());
    }

    #[test]
    fn test_leverage_scales_realized_pnl() {
        let mut ledger = PositionLedger::new();
        let owner = AccountId::new();

        ledger.apply(&trade(100, "1.0", 5), Side::Buy, owner).unwrap();
        let position = ledger.apply(&trade(110, "1.0", 5), Side::Sell, owner).unwrap();

        // (110 - 100) x 1 x (+1) x 5 = 50
        assert_eq!(position.realized_pnl, Decimal::from(50));
    }

    #[test]
    fn test_each_side_keeps_its_own_leverage() {
        let mut ledger = PositionLedger::new();
        let mut t = trade(100, "1.0", 1);
        t.maker_leverage = 1;
        t.taker_leverage = 5;

        // Taker bought at 5x; the maker sold at 1x and must not inherit 5x
        let taker = ledger.apply(&t, t.taker_side, t.taker_owner_id).unwrap();
        let maker = ledger.apply(&t, t.maker_side(), t.maker_owner_id).unwrap();

        assert_eq!(taker.leverage, 5);
        assert_eq!(maker.leverage, 1);

        // A 10-point move realizes 1x for the maker, not 5x
        let mut close = trade(110, "1.0", 1);
        close.taker_owner_id = t.maker_owner_id;
        let closed = ledger.apply(&close, Side::Buy, t.maker_owner_id).unwrap();
        assert_eq!(closed.realized_pnl, Decimal::from(-10));
    }

    #[test]
    fn test_both_sides_of_one_trade() {
        let mut ledger = PositionLedger::new();
        let t = trade(100, "1.0", 1);
        let buyer = t.taker_owner_id;
        let seller = t.maker_owner_id;

        let long = ledger.apply(&t, Side::Buy, buyer).unwrap();
        let short = ledger.apply(&t, Side::Sell, seller).unwrap();

        assert_eq!(long.signed_quantity, Decimal::ONE);
        assert_eq!(short.signed_quantity, Decimal::from(-1));
        assert_eq!(long.signed_quantity + short.signed_quantity, Decimal::ZERO);
    }

    #[test]
    fn test_dust_residual_collapses_to_flat() {
        let mut ledger = PositionLedger::new();
        let owner = AccountId::new();

        ledger.apply(&trade(100, "1.0", 1), Side::Buy, owner).unwrap();
        let position = ledger
            .apply(&trade(100, "0.999999995", 1), Side::Sell, owner)
            .unwrap();

        assert!(position.is_flat());
        assert_eq!(position.avg_entry_price, None);
    }

    #[test]
    fn test_negligible_trade_is_fault_without_mutation() {
        let mut ledger = PositionLedger::new();
        let owner = AccountId::new();
        ledger.apply(&trade(100, "1.0", 1), Side::Buy, owner).unwrap();

        let bad = trade(100, "0.000000001", 1);
        let result = ledger.apply(&bad, Side::Sell, owner);

        assert!(matches!(result, Err(LedgerError::ConsistencyFault { .. })));
        assert_eq!(
            ledger.signed_quantity(&owner, &symbol()),
            Decimal::ONE,
            "position must be untouched after a fault"
        );
    }

    #[test]
    fn test_positions_for_skips_flat() {
        let mut ledger = PositionLedger::new();
        let owner = AccountId::new();

        ledger.apply(&trade(100, "1.0", 1), Side::Buy, owner).unwrap();
        ledger.apply(&trade(100, "1.0", 1), Side::Sell, owner).unwrap();

        assert!(ledger.positions_for(&owner).is_empty());
        assert_eq!(ledger.signed_quantity(&owner, &symbol()), Decimal::ZERO);
    }
}
