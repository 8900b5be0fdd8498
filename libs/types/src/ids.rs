//! Unique identifier types for core entities
//!
//! All entity IDs use UUID v7 for time-sortable ordering, enabling
//! efficient chronological queries over orders and trades.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for an order
///
/// Uses UUID v7 so orders can be queried in creation order via the
/// embedded timestamp. Matching priority is never derived from this id;
/// the book's admission sequence owns time priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(Uuid);

impl OrderId {
    /// Create a new OrderId with current timestamp
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Create from existing UUID
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get inner UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for OrderId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a trade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TradeId(Uuid);

impl TradeId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for TradeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TradeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for an account (order/position owner)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(Uuid);

impl AccountId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for AccountId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Canonical trading-pair symbol
///
/// Format: "BASE/QUOTE" (e.g., "BTC/USDT", "ETH/USDC"). Loose user input
/// ("btc-usdt", "BTC_USDT", "btcusdt") is resolved onto a canonical symbol
/// by the pair registry, never constructed here directly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Symbol(String);

impl Symbol {
    /// Create a new Symbol, returning None unless in BASE/QUOTE format
    pub fn try_new(symbol: impl Into<String>) -> Option<Self> {
        let s = symbol.into();
        let mut parts = s.split('/');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(base), Some(quote), None) if !base.is_empty() && !quote.is_empty() => {
                Some(Self(s))
            }
            _ => None,
        }
    }

    /// Get the symbol string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Split into base and quote assets
    pub fn split(&self) -> (&str, &str) {
        // Format validated at construction
        let idx = self.0.find('/').unwrap_or(0);
        (&self.0[..idx], &self.0[idx + 1..])
    }

    /// Base asset of the pair
    pub fn base(&self) -> &str {
        self.split().0
    }

    /// Quote asset of the pair
    pub fn quote(&self) -> &str {
        self.split().1
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_id_creation() {
        let id1 = OrderId::new();
        let id2 = OrderId::new();
        assert_ne!(id1, id2, "OrderIds should be unique");
    }

    #[test]
    fn test_order_id_serialization() {
        let id = OrderId::new();
        let json = serde_json::to_string(&id).unwrap();
        let deserialized: OrderId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, deserialized);
    }

    #[test]
    fn test_trade_id_creation() {
        let id1 = TradeId::new();
        let id2 = TradeId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_account_id_creation() {
        let id1 = AccountId::new();
        let id2 = AccountId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_symbol_creation() {
        let symbol = Symbol::try_new("BTC/USDT").unwrap();
        assert_eq!(symbol.as_str(), "BTC/USDT");

        let (base, quote) = symbol.split();
        assert_eq!(base, "BTC");
        assert_eq!(quote, "USDT");
    }

    #[test]
    fn test_symbol_rejects_invalid() {
        assert!(Symbol::try_new("INVALID").is_none());
        assert!(Symbol::try_new("/USDT").is_none());
        assert!(Symbol::try_new("BTC/").is_none());
        assert!(Symbol::try_new("A/B/C").is_none());
    }

    #[test]
    fn test_symbol_serialization() {
        let symbol = Symbol::try_new("ETH/USDC").unwrap();
        let json = serde_json::to_string(&symbol).unwrap();
        assert_eq!(json, "\"ETH/USDC\"");

        let deserialized: Symbol = serde_json::from_str(&json).unwrap();
        assert_eq!(symbol, deserialized);
    }
}
