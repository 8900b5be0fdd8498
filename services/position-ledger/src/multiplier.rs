//! Multiplier-mode quantity derivation
//!
//! A multiplier position is an ordinary position whose traded quantity is
//! derived from a fiat investment amount: `investment x multiplier /
//! reference_price`. The take-profit and stop-loss distances default to
//! 20% of the entry price but are configuration, not protocol constants.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use types::errors::NumericError;
use types::numeric::{Price, Quantity};
use types::order::Side;

/// Protective level distances as fractions of the entry price
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MultiplierConfig {
    pub take_profit_frac: Decimal,
    pub stop_loss_frac: Decimal,
}

impl Default for MultiplierConfig {
    fn default() -> Self {
        Self {
            take_profit_frac: Decimal::new(20, 2),
            stop_loss_frac: Decimal::new(20, 2),
        }
    }
}

/// Reference levels for closing a multiplier position
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProtectiveLevels {
    pub take_profit: Price,
    pub stop_loss: Price,
}

/// Effective traded quantity for an investment at the reference price
///
/// `quantity = investment x multiplier / reference_price`. Non-positive
/// investments are rejected.
pub fn derive_quantity(
    investment: Decimal,
    multiplier: u8,
    reference_price: Price,
) -> Result<Quantity, NumericError> {
    if investment <= Decimal::ZERO {
        return Err(NumericError::NegativeQuantity(investment));
    }
    Quantity::try_new(investment * Decimal::from(multiplier) / reference_price.as_decimal())
}

/// Default take-profit and stop-loss levels around an entry price
///
/// Long: profit above, stop below. Short: mirrored. Fails only when the
/// configured fractions push a level to or past zero.
pub fn protective_levels(
    entry_price: Price,
    side: Side,
    config: &MultiplierConfig,
) -> Result<ProtectiveLevels, NumericError> {
    let entry = entry_price.as_decimal();
    let (take_profit, stop_loss) = match side {
        Side::Buy => (
            entry * (Decimal::ONE + config.take_profit_frac),
            entry * (Decimal::ONE - config.stop_loss_frac),
        ),
        Side::Sell => (
            entry * (Decimal::ONE - config.take_profit_frac),
            entry * (Decimal::ONE + config.stop_loss_frac),
        ),
    };

    Ok(ProtectiveLevels {
        take_profit: Price::try_new(take_profit)?,
        stop_loss: Price::try_new(stop_loss)?,
    })
}
