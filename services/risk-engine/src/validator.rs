//! Pre-trade order validation
//!
//! Checks run in a fixed order and short-circuit on the first failure:
//!
//! 1. Pair listed and active
//! 2. Quantity positive and within the pair's bounds
//! 3. Order notional within exchange limits (skipped when no reference
//!    price is available)
//! 4. Resulting position notional under the per-pair cap (also needs the
//!    reference price)
//! 5. Limit price present and positive: discharged by construction, a
//!    `OrderKind::Limit` cannot exist without a positive `Price`; raw
//!    requests missing one are rejected with `MissingPrice` at the
//!    request boundary
//! 6. Slippage shield for market orders
//!
//! Purely a predicate: no state is touched, and rejection reasons always
//! propagate.

use rust_decimal::Decimal;
use tracing::warn;

use types::errors::RejectReason;
use types::numeric::Price;
use types::order::{Order, Side};

use crate::limits::RiskLimits;
use crate::pairs::TradingPair;

/// Validate an order before it reaches the book
///
/// `current_signed_quantity` is the owner's existing position on the
/// pair (positive long, negative short). `estimated_fill_price` is the
/// depth-walk estimate from the book, used only for market orders.
pub fn validate_order(
    order: &Order,
    pair: Option<&TradingPair>,
    reference_price: Option<Price>,
    current_signed_quantity: Decimal,
    estimated_fill_price: Option<Price>,
    limits: &RiskLimits,
) -> Result<(), RejectReason> {
    // 1. Pair must be listed and active
    let pair = match pair {
        Some(pair) if pair.active => pair,
        _ => return Err(RejectReason::UnknownPair),
    };

    // 2. Quantity positive and within pair bounds
    if order.quantity.is_negligible() || !pair.quantity_in_bounds(order.quantity) {
        return Err(RejectReason::InvalidQuantity);
    }

    // 3 and 4 both need the reference price; degrade by skipping, never
    // by blocking placement
    match reference_price {
        Some(reference) => {
            let notional = order.quantity.as_decimal() * reference.as_decimal();
            if notional < limits.min_order_usd || notional > limits.max_order_usd {
                return Err(RejectReason::NotionalOutOfRange);
            }

            let direction = match order.side {
                Side::Buy => Decimal::ONE,
                Side::Sell => -Decimal::ONE,
            };
            let resulting = current_signed_quantity + direction * order.quantity.as_decimal();
            if resulting.abs() * reference.as_decimal() > limits.max_position_usd {
                return Err(RejectReason::PositionLimitExceeded);
            }
        }
        None => {
            warn!(
                symbol = %order.symbol,
                order_id = %order.order_id,
                "no reference price, skipping notional and position checks"
            );
        }
    }

    // 6. Slippage shield, market orders only
    if order.kind.is_market() {
        if let (Some(reference), Some(estimate)) = (reference_price, estimated_fill_price) {
            let deviation =
                (estimate.as_decimal() - reference.as_decimal()).abs() / reference.as_decimal();
            if deviation > limits.max_slippage {
                return Err(RejectReason::SlippageExceeded);
            }
        }
    }

    Ok(())
}
