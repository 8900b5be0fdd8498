//! Per-symbol order book
//!
//! `OrderBook` owns both ladders for one symbol and is the only mutator of
//! them. Matching is deterministic price-time priority: the best opposite
//! price first, FIFO within a price. The execution price is always the
//! maker's resting price.
//!
//! `place` is atomic from the caller's view: either it returns the full
//! outcome or a `ConsistencyFault` aborts the operation. Validation
//! happens before `place` (risk engine); the book itself only guards its
//! own invariants.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use types::ids::{OrderId, Symbol};
use types::numeric::{Price, Quantity};
use types::order::{Order, OrderKind, Side};
use types::trade::Trade;

use crate::book::price_level::LevelEntry;
use crate::book::Ladder;
use crate::events::{BookEvent, BookLevel};
use crate::matching::{crossing, MatchExecutor};

/// Fatal matching failure; the operation is aborted, never retried
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MatchError {
    #[error("consistency fault in matching: {detail}")]
    ConsistencyFault { detail: String },
}

/// Result of a successful `place` call
#[derive(Debug, Clone)]
pub struct PlaceOutcome {
    /// The order after matching: status, fills, and admission sequence set
    pub order: Order,
    /// Trades in match order (possibly empty)
    pub trades: Vec<Trade>,
    /// Trade events in match order, then exactly one top-of-book delta
    pub events: Vec<BookEvent>,
}

/// One price level of a depth snapshot, annotated with cumulative depth
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DepthLevel {
    pub price: Price,
    pub quantity: Quantity,
    /// Sum of quantities from the top of the book through this level
    pub cumulative: Quantity,
}

/// Read-only snapshot of the top of a book
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookSnapshot {
    pub symbol: Symbol,
    /// Best bid first
    pub bids: Vec<DepthLevel>,
    /// Best ask first
    pub asks: Vec<DepthLevel>,
}

/// Order book for a single symbol
#[derive(Debug)]
pub struct OrderBook {
    symbol: Symbol,
    bids: Ladder,
    asks: Ladder,
    /// Admission counter; assigned to `order.created_at` for tie-breaking
    admission_seq: u64,
    /// Top-of-book delta counter
    delta_seq: u64,
    /// Resting order locations for cancellation
    resting: HashMap<OrderId, (Side, Price)>,
    executor: MatchExecutor,
}

impl OrderBook {
    pub fn new(symbol: Symbol) -> Self {
        Self {
            symbol,
            bids: Ladder::new(Side::Buy),
            asks: Ladder::new(Side::Sell),
            admission_seq: 0,
            delta_seq: 0,
            resting: HashMap::new(),
            executor: MatchExecutor::new(0),
        }
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    /// Best bid as (price, total quantity at level)
    pub fn best_bid(&self) -> Option<(Price, Quantity)> {
        self.bids.best()
    }

    /// Best ask as (price, total quantity at level)
    pub fn best_ask(&self) -> Option<(Price, Quantity)> {
        self.asks.best()
    }

    /// Place an order: match against the opposite side, then rest any
    /// limit remainder. Market remainders are discarded, never rested.
    ///
    /// Emits trade events in match order followed by exactly one
    /// top-of-book delta.
    pub fn place(&mut self, mut order: Order, executed_at: i64) -> Result<PlaceOutcome, MatchError> {
        if order.symbol != self.symbol {
            return Err(MatchError::ConsistencyFault {
                detail: format!(
                    "order for {} placed on {} book",
                    order.symbol, self.symbol
                ),
            });
        }
        if order.status.is_terminal() {
            return Err(MatchError::ConsistencyFault {
                detail: format!("terminal order {} resubmitted", order.order_id),
            });
        }

        self.admission_seq += 1;
        order.created_at = self.admission_seq;

        let symbol = self.symbol.clone();
        let Self {
            bids,
            asks,
            resting,
            executor,
            ..
        } = self;

        let opposite = match order.side {
            Side::Buy => &mut *asks,
            Side::Sell => &mut *bids,
        };

        let mut trades = Vec::new();

        while !order.remaining_quantity.is_negligible() {
            let (best_price, front) = match opposite.iter_priority().next() {
                Some((price, level)) => match level.front() {
                    Some(entry) => (*price, entry.clone()),
                    // Empty levels are dropped eagerly; reaching one is a bug
                    None => {
                        return Err(MatchError::ConsistencyFault {
                            detail: format!("empty level at {price} on {symbol}"),
                        })
                    }
                },
                None => break,
            };

            if !crossing::crosses(order.side, &order.kind, best_price) {
                break;
            }

            let fill_qty = order.remaining_quantity.min(front.remaining_quantity);
            let trade = executor.execute(
                symbol.clone(),
                front.order_id,
                order.order_id,
                front.owner_id,
                order.owner_id,
                order.side,
                best_price,
                fill_qty,
                front.leverage,
                order.leverage,
                executed_at,
            )?;

            order.add_fill(fill_qty).map_err(|e| MatchError::ConsistencyFault {
                detail: format!("taker fill overflow on {}: {e}", order.order_id),
            })?;

            let fill = opposite
                .fill_best(best_price, fill_qty)
                .ok_or_else(|| MatchError::ConsistencyFault {
                    detail: format!("maker fill overflow at {best_price} on {symbol}"),
                })?;
            if fill.exhausted {
                resting.remove(&fill.order_id);
            }

            debug!(
                symbol = %symbol,
                price = %trade.price,
                quantity = %trade.quantity,
                sequence = trade.sequence,
                "trade executed"
            );
            trades.push(trade);
        }

        // Rest the remainder of a limit order; market remainders are
        // discarded and the order's status stands as its terminal state.
        if let OrderKind::Limit { limit_price } = order.kind {
            if !order.remaining_quantity.is_negligible() {
                let own = match order.side {
                    Side::Buy => &mut *bids,
                    Side::Sell => &mut *asks,
                };
                own.insert(
                    limit_price,
                    LevelEntry {
                        order_id: order.order_id,
                        owner_id: order.owner_id,
                        remaining_quantity: order.remaining_quantity,
                        leverage: order.leverage,
                        created_at: order.created_at,
                    },
                );
                resting.insert(order.order_id, (order.side, limit_price));
            }
        }

        let mut events: Vec<BookEvent> = trades
            .iter()
            .cloned()
            .map(|trade| BookEvent::TradeExecuted { trade })
            .collect();
        events.push(self.top_of_book_event(executed_at));

        Ok(PlaceOutcome {
            order,
            trades,
            events,
        })
    }

    /// Remove a resting order
    ///
    /// Returns the released remaining quantity and the resulting
    /// top-of-book delta, or None for unknown/already-gone orders.
    pub fn cancel(&mut self, order_id: &OrderId, timestamp: i64) -> Option<(Quantity, BookEvent)> {
        let (side, price) = self.resting.remove(order_id)?;
        let ladder = match side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        };
        let entry = ladder.remove(order_id, price)?;
        Some((entry.remaining_quantity, self.top_of_book_event(timestamp)))
    }

    /// Depth snapshot, cumulative-depth-annotated, best levels first
    ///
    /// Pure read: two calls with no intervening mutation return identical
    /// results.
    pub fn snapshot(&self, depth: usize) -> BookSnapshot {
        BookSnapshot {
            symbol: self.symbol.clone(),
            bids: annotate(self.bids.depth(depth)),
            asks: annotate(self.asks.depth(depth)),
        }
    }

    /// Volume-weighted average fill price for `quantity` taken from the
    /// opposite side of `taker_side`
    ///
    /// Walks the ladder in priority order. If the book cannot supply the
    /// full quantity, the walked portion's VWAP is returned; None on an
    /// empty opposite side.
    pub fn estimated_fill_price(&self, taker_side: Side, quantity: Quantity) -> Option<Price> {
        let (filled, value) = self.walk_opposite(taker_side, quantity);
        if filled.is_zero() {
            None
        } else {
            Price::try_new(value / filled).ok()
        }
    }

    /// Exact quote notional a sweep of `quantity` would pay, summed level
    /// by level over the opposite side of `taker_side`
    ///
    /// Unlike [`OrderBook::estimated_fill_price`] this carries no division
    /// rounding: with no intervening mutation it equals the sum of the
    /// resulting trade notionals. None on an empty opposite side.
    pub fn estimated_sweep_cost(&self, taker_side: Side, quantity: Quantity) -> Option<Decimal> {
        let (filled, value) = self.walk_opposite(taker_side, quantity);
        if filled.is_zero() {
            None
        } else {
            Some(value)
        }
    }

    /// (quantity walked, notional walked) for a hypothetical sweep
    fn walk_opposite(&self, taker_side: Side, quantity: Quantity) -> (Decimal, Decimal) {
        let ladder = match taker_side {
            Side::Buy => &self.asks,
            Side::Sell => &self.bids,
        };

        let mut remaining = quantity;
        let mut value = Decimal::ZERO;
        let mut filled = Decimal::ZERO;

        for (price, level) in ladder.iter_priority() {
            if remaining.is_negligible() {
                break;
            }
            let take = remaining.min(level.total_quantity());
            value += take.as_decimal() * price.as_decimal();
            filled += take.as_decimal();
            remaining = remaining - take;
        }

        (filled, value)
    }

    fn top_of_book_event(&mut self, timestamp: i64) -> BookEvent {
        self.delta_seq += 1;
        BookEvent::TopOfBook {
            symbol: self.symbol.clone(),
            sequence: self.delta_seq,
            best_bid: self.bids.best().map(|(price, quantity)| BookLevel { price, quantity }),
            best_ask: self.asks.best().map(|(price, quantity)| BookLevel { price, quantity }),
            timestamp,
        }
    }
}

fn annotate(levels: Vec<(Price, Quantity)>) -> Vec<DepthLevel> {
    let mut cumulative = Quantity::zero();
    levels
        .into_iter()
        .map(|(price, quantity)| {
            cumulative = cumulative + quantity;
            DepthLevel {
                price,
                quantity,
                cumulative,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::ids::AccountId;
    use types::order::OrderStatus;

    const T0: i64 = 1708123456789000000;

    fn symbol() -> Symbol {
        Symbol::try_new("BTC/USDT").unwrap()
    }

    fn limit(side: Side, price: u64, qty: &str) -> Order {
        Order::limit(
            AccountId::new(),
            symbol(),
            side,
            Price::from_u64(price),
            Quantity::from_str(qty).unwrap(),
        )
        .unwrap()
    }

    fn market(side: Side, qty: &str) -> Order {
        Order::market(AccountId::new(), symbol(), side, Quantity::from_str(qty).unwrap()).unwrap()
    }

    #[test]
    fn test_limit_buy_rests_on_empty_book() {
        let mut book = OrderBook::new(symbol());

        let outcome = book.place(limit(Side::Buy, 100, "1.0"), T0).unwrap();

        assert!(outcome.trades.is_empty());
        assert_eq!(outcome.order.status, OrderStatus::Open);
        assert_eq!(
            book.best_bid(),
            Some((Price::from_u64(100), Quantity::from_str("1.0").unwrap()))
        );
        assert_eq!(book.best_ask(), None);
    }

    #[test]
    fn test_market_buy_partial_against_resting_ask() {
        let mut book = OrderBook::new(symbol());
        book.place(limit(Side::Sell, 105, "2.0"), T0).unwrap();

        let outcome = book.place(market(Side::Buy, "1.0"), T0 + 1).unwrap();

        assert_eq!(outcome.trades.len(), 1);
        assert_eq!(outcome.trades[0].price, Price::from_u64(105));
        assert_eq!(outcome.trades[0].quantity, Quantity::from_str("1.0").unwrap());
        assert_eq!(outcome.order.status, OrderStatus::Filled);
        assert_eq!(
            book.best_ask(),
            Some((Price::from_u64(105), Quantity::from_str("1.0").unwrap()))
        );
    }

    #[test]
    fn test_price_time_priority_at_same_price() {
        let mut book = OrderBook::new(symbol());
        let first = book.place(limit(Side::Buy, 100, "1.0"), T0).unwrap().order;
        let second = book.place(limit(Side::Buy, 100, "1.0"), T0 + 1).unwrap().order;

        let outcome = book.place(market(Side::Sell, "1.5"), T0 + 2).unwrap();

        assert_eq!(outcome.trades.len(), 2);
        assert_eq!(outcome.trades[0].maker_order_id, first.order_id);
        assert_eq!(outcome.trades[0].quantity, Quantity::from_str("1.0").unwrap());
        assert_eq!(outcome.trades[1].maker_order_id, second.order_id);
        assert_eq!(outcome.trades[1].quantity, Quantity::from_str("0.5").unwrap());
        assert_eq!(
            book.best_bid(),
            Some((Price::from_u64(100), Quantity::from_str("0.5").unwrap()))
        );
    }

    #[test]
    fn test_better_price_wins_over_earlier_time() {
        let mut book = OrderBook::new(symbol());
        book.place(limit(Side::Sell, 105, "1.0"), T0).unwrap();
        let cheaper = book.place(limit(Side::Sell, 104, "1.0"), T0 + 1).unwrap().order;

        let outcome = book.place(market(Side::Buy, "1.0"), T0 + 2).unwrap();

        assert_eq!(outcome.trades[0].maker_order_id, cheaper.order_id);
        assert_eq!(outcome.trades[0].price, Price::from_u64(104));
    }

    #[test]
    fn test_non_crossing_limit_rests() {
        let mut book = OrderBook::new(symbol());
        book.place(limit(Side::Sell, 105, "1.0"), T0).unwrap();

        let outcome = book.place(limit(Side::Buy, 90, "1.0"), T0 + 1).unwrap();

        assert!(outcome.trades.is_empty());
        assert_eq!(book.best_bid().unwrap().0, Price::from_u64(90));
        assert_eq!(book.best_ask().unwrap().0, Price::from_u64(105));
    }

    #[test]
    fn test_crossing_limit_matches_then_rests_remainder() {
        let mut book = OrderBook::new(symbol());
        book.place(limit(Side::Sell, 100, "1.0"), T0).unwrap();

        let outcome = book.place(limit(Side::Buy, 102, "3.0"), T0 + 1).unwrap();

        assert_eq!(outcome.trades.len(), 1);
        assert_eq!(outcome.trades[0].price, Price::from_u64(100));
        assert_eq!(outcome.order.status, OrderStatus::PartiallyFilled);
        // Remainder rests at the limit price, not the traded price
        assert_eq!(
            book.best_bid(),
            Some((Price::from_u64(102), Quantity::from_str("2.0").unwrap()))
        );
        assert_eq!(book.best_ask(), None);
    }

    #[test]
    fn test_market_on_empty_book_is_open_not_rejected() {
        let mut book = OrderBook::new(symbol());

        let outcome = book.place(market(Side::Buy, "1.0"), T0).unwrap();

        assert!(outcome.trades.is_empty());
        assert_eq!(outcome.order.status, OrderStatus::Open);
        // Remainder discarded: nothing rests
        assert_eq!(book.best_bid(), None);
        assert_eq!(book.best_ask(), None);
    }

    #[test]
    fn test_market_remainder_discarded_after_sweep() {
        let mut book = OrderBook::new(symbol());
        book.place(limit(Side::Sell, 100, "1.0"), T0).unwrap();

        let outcome = book.place(market(Side::Buy, "5.0"), T0 + 1).unwrap();

        assert_eq!(outcome.trades.len(), 1);
        assert_eq!(outcome.order.status, OrderStatus::PartiallyFilled);
        assert_eq!(book.best_bid(), None, "market remainder must not rest");
    }

    #[test]
    fn test_no_self_crossing_after_any_sequence() {
        let mut book = OrderBook::new(symbol());
        book.place(limit(Side::Sell, 101, "1.0"), T0).unwrap();
        book.place(limit(Side::Buy, 99, "1.0"), T0 + 1).unwrap();
        book.place(limit(Side::Buy, 103, "0.4"), T0 + 2).unwrap();
        book.place(limit(Side::Sell, 98, "0.2"), T0 + 3).unwrap();

        if let (Some((bid, _)), Some((ask, _))) = (book.best_bid(), book.best_ask()) {
            assert!(bid < ask, "book crossed: bid {bid} >= ask {ask}");
        }
    }

    #[test]
    fn test_events_are_trades_then_one_delta() {
        let mut book = OrderBook::new(symbol());
        book.place(limit(Side::Sell, 100, "0.5"), T0).unwrap();
        book.place(limit(Side::Sell, 101, "0.5"), T0).unwrap();

        let outcome = book.place(market(Side::Buy, "1.0"), T0 + 1).unwrap();

        assert_eq!(outcome.events.len(), 3);
        assert!(matches!(outcome.events[0], BookEvent::TradeExecuted { .. }));
        assert!(matches!(outcome.events[1], BookEvent::TradeExecuted { .. }));
        assert!(matches!(outcome.events[2], BookEvent::TopOfBook { .. }));
    }

    #[test]
    fn test_snapshot_cumulative_depth() {
        let mut book = OrderBook::new(symbol());
        book.place(limit(Side::Buy, 100, "1.0"), T0).unwrap();
        book.place(limit(Side::Buy, 99, "2.0"), T0).unwrap();
        book.place(limit(Side::Buy, 98, "3.0"), T0).unwrap();

        let snapshot = book.snapshot(2);

        assert_eq!(snapshot.bids.len(), 2);
        assert_eq!(snapshot.bids[0].price, Price::from_u64(100));
        assert_eq!(snapshot.bids[0].cumulative, Quantity::from_str("1.0").unwrap());
        assert_eq!(snapshot.bids[1].price, Price::from_u64(99));
        assert_eq!(snapshot.bids[1].cumulative, Quantity::from_str("3.0").unwrap());
    }

    #[test]
    fn test_snapshot_idempotent() {
        let mut book = OrderBook::new(symbol());
        book.place(limit(Side::Buy, 100, "1.0"), T0).unwrap();
        book.place(limit(Side::Sell, 105, "2.0"), T0).unwrap();

        assert_eq!(book.snapshot(10), book.snapshot(10));
    }

    #[test]
    fn test_cancel_releases_remaining() {
        let mut book = OrderBook::new(symbol());
        let order = book.place(limit(Side::Buy, 100, "1.5"), T0).unwrap().order;

        let (released, event) = book.cancel(&order.order_id, T0 + 1).unwrap();

        assert_eq!(released, Quantity::from_str("1.5").unwrap());
        assert!(matches!(event, BookEvent::TopOfBook { best_bid: None, .. }));
        assert!(book.cancel(&order.order_id, T0 + 2).is_none());
    }

    #[test]
    fn test_fully_filled_maker_not_cancellable() {
        let mut book = OrderBook::new(symbol());
        let maker = book.place(limit(Side::Sell, 100, "1.0"), T0).unwrap().order;
        book.place(market(Side::Buy, "1.0"), T0 + 1).unwrap();

        assert!(book.cancel(&maker.order_id, T0 + 2).is_none());
    }

    #[test]
    fn test_estimated_fill_price_walks_depth() {
        let mut book = OrderBook::new(symbol());
        book.place(limit(Side::Sell, 100, "1.0"), T0).unwrap();
        book.place(limit(Side::Sell, 110, "1.0"), T0).unwrap();

        // 1.0 @ 100 + 1.0 @ 110 => VWAP 105
        let estimate = book
            .estimated_fill_price(Side::Buy, Quantity::from_str("2.0").unwrap())
            .unwrap();
        assert_eq!(estimate, Price::from_u64(105));

        // Only the first level needed
        let estimate = book
            .estimated_fill_price(Side::Buy, Quantity::from_str("0.5").unwrap())
            .unwrap();
        assert_eq!(estimate, Price::from_u64(100));

        assert!(book
            .estimated_fill_price(Side::Sell, Quantity::from_str("1.0").unwrap())
            .is_none());
    }

    #[test]
    fn test_estimated_sweep_cost_matches_traded_notional() {
        let mut book = OrderBook::new(symbol());
        book.place(limit(Side::Sell, 100, "1.0"), T0).unwrap();
        book.place(limit(Side::Sell, 110, "2.0"), T0).unwrap();

        let quantity = Quantity::from_str("2.5").unwrap();
        let cost = book.estimated_sweep_cost(Side::Buy, quantity).unwrap();
        assert_eq!(cost, Decimal::from(265)); // 1.0 @ 100 + 1.5 @ 110

        let outcome = book.place(market(Side::Buy, "2.5"), T0 + 1).unwrap();
        let traded: Decimal = outcome.trades.iter().map(|t| t.notional()).sum();
        assert_eq!(traded, cost);

        assert!(book
            .estimated_sweep_cost(Side::Sell, Quantity::from_str("1.0").unwrap())
            .is_none());
    }

    #[test]
    fn test_trade_carries_each_sides_leverage() {
        let mut book = OrderBook::new(symbol());
        let maker = limit(Side::Sell, 100, "1.0").with_leverage(2);
        book.place(maker, T0).unwrap();

        let taker = market(Side::Buy, "1.0").with_leverage(5);
        let outcome = book.place(taker, T0 + 1).unwrap();

        assert_eq!(outcome.trades[0].maker_leverage, 2);
        assert_eq!(outcome.trades[0].taker_leverage, 5);
    }

    #[test]
    fn test_conservation_across_fills() {
        let mut book = OrderBook::new(symbol());
        book.place(limit(Side::Sell, 100, "0.3"), T0).unwrap();
        book.place(limit(Side::Sell, 100, "0.3"), T0).unwrap();
        book.place(limit(Side::Sell, 101, "0.3"), T0).unwrap();

        let outcome = book.place(market(Side::Buy, "0.8"), T0 + 1).unwrap();

        let total: Decimal = outcome
            .trades
            .iter()
            .map(|t| t.quantity.as_decimal())
            .sum();
        assert_eq!(total, outcome.order.filled_quantity.as_decimal());
        assert!(total <= outcome.order.quantity.as_decimal());
        assert!(outcome.order.check_invariant());
    }

    #[test]
    fn test_wrong_symbol_is_fault() {
        let mut book = OrderBook::new(symbol());
        let order = Order::market(
            AccountId::new(),
            Symbol::try_new("ETH/USDC").unwrap(),
            Side::Buy,
            Quantity::from_str("1.0").unwrap(),
        )
        .unwrap();

        assert!(matches!(
            book.place(order, T0),
            Err(MatchError::ConsistencyFault { .. })
        ));
    }
}
