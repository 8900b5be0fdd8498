//! Matching engine
//!
//! Per-symbol order book with price-time-priority matching.
//!
//! **Key invariants:**
//! - Price-time priority strictly enforced: better price first, ties broken
//!   by admission order
//! - Deterministic matching (same inputs, same outputs)
//! - Conservation of quantity: fills against an order never exceed its
//!   original quantity
//! - Crossed books never persist; crossing liquidity is consumed inside
//!   `place`
//!
//! The book is single-owner: all mutation for a symbol goes through one
//! `OrderBook` value, serialized by the caller.

pub mod book;
pub mod engine;
pub mod events;
pub mod matching;

pub use engine::{BookSnapshot, DepthLevel, MatchError, OrderBook, PlaceOutcome};
pub use events::{BookEvent, BookLevel};
