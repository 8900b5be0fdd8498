//! Types library for the trading core
//!
//! This library provides all core type definitions shared across the
//! matching, risk, and ledger crates, ensuring type safety and
//! deterministic behavior.
//!
//! # Modules
//! - `ids`: Unique identifiers (OrderId, TradeId, AccountId, Symbol)
//! - `numeric`: Fixed-point decimal types (Price, Quantity)
//! - `order`: Order lifecycle types
//! - `trade`: Trade execution types
//! - `position`: Position tracking types
//! - `balance`: Balance and fund-movement types
//! - `errors`: Error taxonomy

pub mod balance;
pub mod errors;
pub mod ids;
pub mod numeric;
pub mod order;
pub mod position;
pub mod trade;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::balance::*;
    pub use crate::errors::*;
    pub use crate::ids::*;
    pub use crate::numeric::*;
    pub use crate::order::*;
    pub use crate::position::*;
    pub use crate::trade::*;
}
