//! Exchange facade
//!
//! Orchestrates the trading core: resolves raw requests onto typed
//! orders, reserves funds, runs pre-trade validation, serializes matching
//! per symbol, applies trades to both ledger sides, settles balances, and
//! fans events out to subscribers.
//!
//! Each symbol's book is an independently lockable resource; two symbols
//! never contend. External collaborators sit behind the [`PriceFeed`] and
//! [`BalanceStore`] seams.

pub mod balances;
pub mod broadcast;
pub mod core;
pub mod models;
pub mod price_feed;

pub use crate::balances::{BalanceStore, BalanceStoreError, InMemoryBalanceStore};
pub use crate::broadcast::EventBroadcaster;
pub use crate::core::ExchangeCore;
pub use crate::models::{MultiplierReport, OrderRequest, PlaceReport, RequestKind};
pub use crate::price_feed::{PriceFeed, StaticPriceFeed};
