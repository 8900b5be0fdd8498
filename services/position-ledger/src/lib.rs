//! Position ledger
//!
//! Applies committed trades to per-(owner, symbol) positions: weighted
//! average entry on extension, realized PnL on reduction, flips opening
//! the residual at the trade price. Also derives multiplier-mode
//! quantities from a fiat investment amount.
//!
//! By the time a trade exists, funds must move; the ledger therefore
//! never rejects a well-formed `apply`. Malformed input is a consistency
//! fault: logged, surfaced, and the position left untouched.

pub mod ledger;
pub mod multiplier;

pub use ledger::{LedgerError, PositionLedger};
pub use multiplier::{derive_quantity, protective_levels, MultiplierConfig, ProtectiveLevels};
