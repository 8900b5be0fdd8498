//! Trading pair registry
//!
//! Maps loose user input ("btc-usdt", "BTC_USDT", "btcusdt") onto a
//! canonical `Symbol` and carries per-pair quantity bounds. Resolution is
//! case- and delimiter-insensitive; the canonical form is always
//! "BASE/QUOTE".

use std::collections::HashMap;

use types::ids::Symbol;
use types::numeric::Quantity;

/// A listed trading pair with its order-size bounds
#[derive(Debug, Clone, PartialEq)]
pub struct TradingPair {
    pub symbol: Symbol,
    pub min_quantity: Quantity,
    pub max_quantity: Quantity,
    /// Inactive pairs stay resolvable but reject new orders
    pub active: bool,
}

impl TradingPair {
    pub fn new(symbol: Symbol, min_quantity: Quantity, max_quantity: Quantity) -> Self {
        Self {
            symbol,
            min_quantity,
            max_quantity,
            active: true,
        }
    }

    /// Check a quantity against this pair's bounds
    pub fn quantity_in_bounds(&self, quantity: Quantity) -> bool {
        quantity >= self.min_quantity && quantity <= self.max_quantity
    }
}

/// Registry of listed pairs keyed by normalized symbol
#[derive(Debug, Default)]
pub struct PairRegistry {
    pairs: HashMap<Symbol, TradingPair>,
    /// Normalized input ("BTCUSDT") to canonical symbol
    aliases: HashMap<String, Symbol>,
}

impl PairRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// List a pair, replacing any previous listing for the same symbol
    pub fn register(&mut self, pair: TradingPair) {
        self.aliases
            .insert(normalize(pair.symbol.as_str()), pair.symbol.clone());
        self.pairs.insert(pair.symbol.clone(), pair);
    }

    /// Resolve loose input onto a canonical symbol
    pub fn resolve(&self, input: &str) -> Option<&Symbol> {
        self.aliases.get(&normalize(input))
    }

    /// Look up a pair by canonical symbol
    pub fn get(&self, symbol: &Symbol) -> Option<&TradingPair> {
        self.pairs.get(symbol)
    }

    /// Mark a pair inactive; resolvable but not tradable
    pub fn deactivate(&mut self, symbol: &Symbol) -> bool {
        match self.pairs.get_mut(symbol) {
            Some(pair) => {
                pair.active = false;
                true
            }
            None => false,
        }
    }

    pub fn symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.pairs.keys()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// Uppercase and strip delimiters so "btc-usdt", "BTC_USDT", "btc/usdt"
/// and "BTCUSDT" all collide on one key
fn normalize(input: &str) -> String {
    input
        .chars()
        .filter(|c| !matches!(c, '/' | '-' | '_' | ' '))
        .flat_map(char::to_uppercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> PairRegistry {
        let mut registry = PairRegistry::new();
        registry.register(TradingPair::new(
            Symbol::try_new("BTC/USDT").unwrap(),
            Quantity::from_str("0.0001").unwrap(),
            Quantity::from_str("100").unwrap(),
        ));
        registry.register(TradingPair::new(
            Symbol::try_new("ETH/USDC").unwrap(),
            Quantity::from_str("0.001").unwrap(),
            Quantity::from_str("1000").unwrap(),
        ));
        registry
    }

    #[test]
    fn test_resolve_is_case_and_delimiter_insensitive() {
        let registry = registry();
        let canonical = Symbol::try_new("BTC/USDT").unwrap();

        for input in ["BTC/USDT", "btc/usdt", "btc-usdt", "BTC_USDT", "btcusdt", "Btc Usdt"] {
            assert_eq!(registry.resolve(input), Some(&canonical), "input {input:?}");
        }
    }

    #[test]
    fn test_resolve_unknown_pair() {
        let registry = registry();
        assert_eq!(registry.resolve("DOGE/USDT"), None);
        assert_eq!(registry.resolve(""), None);
    }

    #[test]
    fn test_quantity_bounds() {
        let registry = registry();
        let symbol = Symbol::try_new("BTC/USDT").unwrap();
        let pair = registry.get(&symbol).unwrap();

        assert!(pair.quantity_in_bounds(Quantity::from_str("1.0").unwrap()));
        assert!(pair.quantity_in_bounds(Quantity::from_str("0.0001").unwrap()));
        assert!(!pair.quantity_in_bounds(Quantity::from_str("0.00001").unwrap()));
        assert!(!pair.quantity_in_bounds(Quantity::from_str("101").unwrap()));
    }

    #[test]
    fn test_deactivate_keeps_pair_resolvable() {
        let mut registry = registry();
        let symbol = Symbol::try_new("ETH/USDC").unwrap();

        assert!(registry.deactivate(&symbol));
        assert_eq!(registry.resolve("eth-usdc"), Some(&symbol));
        assert!(!registry.get(&symbol).unwrap().active);
    }
}
