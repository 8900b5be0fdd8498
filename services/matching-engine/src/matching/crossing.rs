//! Crossing detection
//!
//! An incoming order crosses resting liquidity when its price constraint
//! admits the resting price. Market orders carry no constraint and cross
//! anything on the opposite side.

use types::numeric::Price;
use types::order::{OrderKind, Side};

/// Check whether an incoming order can trade against a resting price
///
/// - Market: always
/// - Buy limit: `limit >= resting ask`
/// - Sell limit: `limit <= resting bid`
pub fn crosses(taker_side: Side, taker_kind: &OrderKind, resting_price: Price) -> bool {
    match taker_kind {
        OrderKind::Market => true,
        OrderKind::Limit { limit_price } => match taker_side {
            Side::Buy => *limit_price >= resting_price,
            Side::Sell => *limit_price <= resting_price,
        },
    }
}
