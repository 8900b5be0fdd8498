//! Error taxonomy for the trading core
//!
//! Distinguishes "your order was invalid" (`Rejected`) from "the system is
//! broken" (`ConsistencyFault`) and "a dependency is down"
//! (`UpstreamUnavailable`). Callers must never treat the three alike:
//! rejections are user-correctable and final, faults abort the operation
//! without retry, and upstream outages are fatal only for the balance
//! store.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reason an order failed pre-trade validation
///
/// Returned synchronously to the caller; never retried automatically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RejectReason {
    /// Symbol did not resolve to an active trading pair
    UnknownPair,
    /// Quantity non-positive or outside the pair's bounds
    InvalidQuantity,
    /// Order notional outside the configured USD range
    NotionalOutOfRange,
    /// Resulting position notional would exceed the per-pair cap
    PositionLimitExceeded,
    /// Limit order without a usable positive price
    MissingPrice,
    /// Estimated market fill deviates too far from the reference price
    SlippageExceeded,
    /// Reserving funds for the order failed
    InsufficientFunds,
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            RejectReason::UnknownPair => "unknown or inactive trading pair",
            RejectReason::InvalidQuantity => "quantity outside allowed bounds",
            RejectReason::NotionalOutOfRange => "order notional outside allowed range",
            RejectReason::PositionLimitExceeded => "position limit exceeded",
            RejectReason::MissingPrice => "limit order missing a positive price",
            RejectReason::SlippageExceeded => "estimated slippage exceeds limit",
            RejectReason::InsufficientFunds => "insufficient funds to reserve",
        };
        write!(f, "{label}")
    }
}

/// Top-level error for core operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    /// Order failed validation; user-correctable
    #[error("order rejected: {0}")]
    Rejected(RejectReason),

    /// Invariant violation inside matching or ledger apply; fatal for the
    /// operation, never retried
    #[error("consistency fault: {detail}")]
    ConsistencyFault { detail: String },

    /// A required upstream dependency is unreachable
    #[error("upstream unavailable: {service}")]
    UpstreamUnavailable { service: String },

    /// Numeric construction failure bubbling out of a raw request
    #[error(transparent)]
    Numeric(#[from] NumericError),
}

/// Errors constructing numeric domain values
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NumericError {
    #[error("price must be positive, got {0}")]
    NonPositivePrice(Decimal),

    #[error("quantity must be non-negative, got {0}")]
    NegativeQuantity(Decimal),

    #[error("unparseable decimal: {0}")]
    Unparseable(String),
}

/// Errors moving funds between available and locked balances
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BalanceError {
    #[error("insufficient {asset}: required {required}, available {available}")]
    Insufficient {
        asset: String,
        required: Decimal,
        available: Decimal,
    },

    #[error("insufficient locked {asset}: required {required}, locked {locked}")]
    InsufficientLocked {
        asset: String,
        required: Decimal,
        locked: Decimal,
    },

    #[error("negative amount {amount} for {asset}")]
    NegativeAmount { asset: String, amount: Decimal },
}
