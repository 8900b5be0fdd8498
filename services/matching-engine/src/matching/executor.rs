//! Trade execution
//!
//! Builds the immutable trade record for each match and owns the global
//! monotonic trade sequence. A zero-quantity fill can only come from a
//! bug upstream, so it surfaces as a consistency fault rather than an
//! empty trade.

use types::ids::{AccountId, OrderId, Symbol};
use types::numeric::{Price, Quantity};
use types::order::Side;
use types::trade::Trade;

use crate::engine::MatchError;

/// Trade factory with monotonic sequence generation
#[derive(Debug)]
pub struct MatchExecutor {
    sequence_counter: u64,
}

impl MatchExecutor {
    /// Create an executor starting at the given sequence
    pub fn new(starting_sequence: u64) -> Self {
        Self {
            sequence_counter: starting_sequence,
        }
    }

    fn next_sequence(&mut self) -> u64 {
        let seq = self.sequence_counter;
        self.sequence_counter += 1;
        seq
    }

    /// Record a match between a resting maker and the incoming taker
    ///
    /// Execution price is the maker's resting price per price-time
    /// priority.
    #[allow(clippy::too_many_arguments)]
    pub fn execute(
        &mut self,
        symbol: Symbol,
        maker_order_id: OrderId,
        taker_order_id: OrderId,
        maker_owner_id: AccountId,
        taker_owner_id: AccountId,
        taker_side: Side,
        price: Price,
        quantity: Quantity,
        maker_leverage: u8,
        taker_leverage: u8,
        executed_at: i64,
    ) -> Result<Trade, MatchError> {
        if quantity.is_zero() || quantity.is_negligible() {
            return Err(MatchError::ConsistencyFault {
                detail: format!("zero-quantity fill between {maker_order_id} and {taker_order_id}"),
            });
        }

        Ok(Trade::new(
            self.next_sequence(),
            symbol,
            maker_order_id,
            taker_order_id,
            maker_owner_id,
            taker_owner_id,
            taker_side,
            price,
            quantity,
            maker_leverage,
            taker_leverage,
            executed_at,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn symbol() -> Symbol {
        Symbol::try_new("BTC/USDT").unwrap()
    }

    #[test]
    fn test_execute_builds_trade() {
        let mut executor = MatchExecutor::new(1000);

        let trade = executor
            .execute(
                symbol(),
                OrderId::new(),
                OrderId::new(),
                AccountId::new(),
                AccountId::new(),
                Side::Buy,
                Price::from_u64(50000),
                Quantity::from_str("0.5").unwrap(),
                1,
                1,
                1708123456789000000,
            )
            .unwrap();

        assert_eq!(trade.sequence, 1000);
        assert_eq!(trade.price, Price::from_u64(50000));
        assert_eq!(trade.taker_side, Side::Buy);
    }

    #[test]
    fn test_sequence_monotonic() {
        let mut executor = MatchExecutor::new(7);
        let mut run = |qty: &str| {
            executor
                .execute(
                    symbol(),
                    OrderId::new(),
                    OrderId::new(),
                    AccountId::new(),
                    AccountId::new(),
                    Side::Sell,
                    Price::from_u64(100),
                    Quantity::from_str(qty).unwrap(),
                    1,
                    1,
                    0,
                )
                .unwrap()
        };

        assert_eq!(run("1.0").sequence, 7);
        assert_eq!(run("2.0").sequence, 8);
        assert_eq!(run("3.0").sequence, 9);
    }

    #[test]
    fn test_zero_quantity_is_fault() {
        let mut executor = MatchExecutor::new(0);

        let result = executor.execute(
            symbol(),
            OrderId::new(),
            OrderId::new(),
            AccountId::new(),
            AccountId::new(),
            Side::Buy,
            Price::from_u64(100),
            Quantity::zero(),
            1,
            1,
            0,
        );

        assert!(matches!(result, Err(MatchError::ConsistencyFault { .. })));
    }
}
