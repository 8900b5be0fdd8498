//! Global risk limits
//!
//! Exchange-wide bounds applied to every order regardless of pair. All
//! notionals are denominated in the quote currency (USD-pegged quotes in
//! practice).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Exchange-wide order and position limits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskLimits {
    /// Smallest accepted order notional
    pub min_order_usd: Decimal,
    /// Largest accepted order notional
    pub max_order_usd: Decimal,
    /// Cap on resulting position notional per pair per owner
    pub max_position_usd: Decimal,
    /// Maximum tolerated deviation of the estimated fill price from the
    /// reference price for market orders, as a fraction
    pub max_slippage: Decimal,
}

impl Default for RiskLimits {
    fn default() -> Self {
        Self {
            min_order_usd: Decimal::from(10),
            max_order_usd: Decimal::from(100_000),
            max_position_usd: Decimal::from(1_000_000),
            // 0.5%
            max_slippage: Decimal::new(5, 3),
        }
    }
}
