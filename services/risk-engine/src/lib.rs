//! Risk engine
//!
//! Pre-trade validation, run before any order reaches a book. All checks
//! are pure predicates: validation never mutates book, balance, or
//! position state, and a rejection reason always propagates to the
//! caller.

pub mod limits;
pub mod pairs;
pub mod validator;

pub use limits::RiskLimits;
pub use pairs::{PairRegistry, TradingPair};
pub use validator::validate_order;
