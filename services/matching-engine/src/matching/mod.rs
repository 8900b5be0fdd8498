//! Matching logic
//!
//! Crossing detection and trade execution.

pub mod crossing;
pub mod executor;

pub use executor::MatchExecutor;
