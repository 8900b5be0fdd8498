//! Order book infrastructure
//!
//! Price levels with FIFO queues, and the side-aware price ladder.

pub mod ladder;
pub mod price_level;

pub use ladder::Ladder;
pub use price_level::{LevelEntry, PriceLevel};
