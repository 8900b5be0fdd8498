//! Exchange core
//!
//! Owns the per-symbol book arena. Placement is synchronous: resolve the
//! pair, build the typed order, validate, reserve funds, match under the
//! symbol's lock, apply trades to both ledger sides, settle balances,
//! publish events. Two symbols never contend for a lock; two orders on
//! one symbol are fully serialized.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

use matching_engine::{BookEvent, BookSnapshot, MatchError, OrderBook, PlaceOutcome};
use position_ledger::{derive_quantity, protective_levels, MultiplierConfig, PositionLedger};
use risk_engine::{validate_order, PairRegistry, RiskLimits};
use types::errors::{CoreError, RejectReason};
use types::ids::{AccountId, OrderId, Symbol};
use types::numeric::Price;
use types::order::{Order, OrderKind, Side};
use types::position::Position;
use types::trade::Trade;

use crate::balances::{BalanceStore, BalanceStoreError};
use crate::broadcast::EventBroadcaster;
use crate::models::{MultiplierReport, OrderRequest, PlaceReport};
use crate::price_feed::PriceFeed;

/// Funds locked for one live order, released when the order dies
#[derive(Debug)]
struct Reservation {
    owner: AccountId,
    asset: String,
    amount: Decimal,
}

/// Everything owned by one symbol, behind one lock
#[derive(Debug)]
struct SymbolState {
    book: OrderBook,
    ledger: PositionLedger,
    reservations: HashMap<OrderId, Reservation>,
}

/// The trading core facade
pub struct ExchangeCore {
    pairs: PairRegistry,
    limits: RiskLimits,
    multiplier_config: MultiplierConfig,
    price_feed: Arc<dyn PriceFeed>,
    balances: Arc<dyn BalanceStore>,
    broadcaster: EventBroadcaster,
    books: HashMap<Symbol, Mutex<SymbolState>>,
}

impl ExchangeCore {
    /// Build the arena from the registry's listed pairs
    pub fn new(
        pairs: PairRegistry,
        limits: RiskLimits,
        price_feed: Arc<dyn PriceFeed>,
        balances: Arc<dyn BalanceStore>,
    ) -> Self {
        let symbols: Vec<Symbol> = pairs.symbols().cloned().collect();
        let books = symbols
            .iter()
            .map(|symbol| {
                (
                    symbol.clone(),
                    Mutex::new(SymbolState {
                        book: OrderBook::new(symbol.clone()),
                        ledger: PositionLedger::new(),
                        reservations: HashMap::new(),
                    }),
                )
            })
            .collect();

        Self {
            pairs,
            limits,
            multiplier_config: MultiplierConfig::default(),
            price_feed,
            balances,
            broadcaster: EventBroadcaster::new(symbols),
            books,
        }
    }

    pub fn with_multiplier_config(mut self, config: MultiplierConfig) -> Self {
        self.multiplier_config = config;
        self
    }

    /// Place an order from a raw request
    pub fn place_order(&self, request: OrderRequest) -> Result<PlaceReport, CoreError> {
        let symbol = self.resolve(&request.symbol)?;
        let order = request
            .into_order(symbol.clone())
            .map_err(CoreError::Rejected)?;
        let reference = self.price_feed.reference_price(&symbol);

        let mut state = self.lock_symbol(&symbol)?;
        let report = self.place_locked(&mut state, order, reference)?;

        info!(
            symbol = %symbol,
            order_id = %report.order_id,
            status = ?report.status,
            trades = report.trades.len(),
            "order placed"
        );
        Ok(report)
    }

    /// Place a multiplier-mode order: quantity derived from a fiat
    /// investment, leverage set to the multiplier, protective levels
    /// reported alongside
    ///
    /// Unlike plain placement, this path requires a reference price.
    pub fn place_multiplier_order(
        &self,
        owner_id: AccountId,
        symbol: &str,
        side: Side,
        investment: Decimal,
        multiplier: u8,
    ) -> Result<MultiplierReport, CoreError> {
        let symbol = self.resolve(symbol)?;
        let reference =
            self.price_feed
                .reference_price(&symbol)
                .ok_or(CoreError::UpstreamUnavailable {
                    service: "price-feed".to_string(),
                })?;

        let quantity = derive_quantity(investment, multiplier, reference)
            .map_err(|_| CoreError::Rejected(RejectReason::InvalidQuantity))?;
        let order = Order::market(owner_id, symbol.clone(), side, quantity)
            .map_err(|_| CoreError::Rejected(RejectReason::InvalidQuantity))?
            .with_leverage(multiplier);

        let mut state = self.lock_symbol(&symbol)?;
        let report = self.place_locked(&mut state, order, Some(reference))?;

        // Protective levels anchor on the actual average fill when there
        // is one, the reference price otherwise
        let entry = average_fill_price(&report.trades).unwrap_or(reference);
        let levels = protective_levels(entry, side, &self.multiplier_config)?;

        Ok(MultiplierReport {
            report,
            quantity,
            levels,
        })
    }

    /// Cancel a resting order; false when it is unknown or already gone
    pub fn cancel_order(&self, symbol: &str, order_id: &OrderId) -> Result<bool, CoreError> {
        let symbol = self.resolve(symbol)?;
        let mut state = self.lock_symbol(&symbol)?;

        let Some((_, event)) = state.book.cancel(order_id, now_nanos()) else {
            return Ok(false);
        };

        if let Some(reservation) = state.reservations.remove(order_id) {
            self.release_reservation(&reservation)?;
        }
        self.broadcaster.publish(&symbol, std::slice::from_ref(&event));
        Ok(true)
    }

    /// Depth snapshot; pure read
    pub fn order_book_snapshot(&self, symbol: &str, depth: usize) -> Result<BookSnapshot, CoreError> {
        let symbol = self.resolve(symbol)?;
        let state = self.lock_symbol(&symbol)?;
        Ok(state.book.snapshot(depth))
    }

    /// Subscribe to one symbol's event stream
    pub fn subscribe(&self, symbol: &str) -> Result<broadcast::Receiver<BookEvent>, CoreError> {
        let symbol = self.resolve(symbol)?;
        self.broadcaster
            .subscribe(&symbol)
            .ok_or(CoreError::Rejected(RejectReason::UnknownPair))
    }

    /// Current position on one pair
    pub fn position(&self, owner_id: &AccountId, symbol: &str) -> Result<Option<Position>, CoreError> {
        let symbol = self.resolve(symbol)?;
        let state = self.lock_symbol(&symbol)?;
        Ok(state.ledger.position(owner_id, &symbol).cloned())
    }

    /// All non-flat positions for an owner across pairs
    pub fn positions(&self, owner_id: &AccountId) -> Vec<Position> {
        let mut positions = Vec::new();
        for state in self.books.values() {
            if let Ok(state) = state.lock() {
                positions.extend(state.ledger.positions_for(owner_id).into_iter().cloned());
            }
        }
        positions
    }

    fn resolve(&self, input: &str) -> Result<Symbol, CoreError> {
        self.pairs
            .resolve(input)
            .cloned()
            .ok_or(CoreError::Rejected(RejectReason::UnknownPair))
    }

    fn lock_symbol(&self, symbol: &Symbol) -> Result<MutexGuard<'_, SymbolState>, CoreError> {
        let state = self
            .books
            .get(symbol)
            .ok_or_else(|| CoreError::ConsistencyFault {
                detail: format!("no book for listed pair {symbol}"),
            })?;
        state.lock().map_err(|_| CoreError::ConsistencyFault {
            detail: format!("poisoned lock for {symbol}"),
        })
    }

    /// Validate, reserve, match, apply, settle, publish. Caller holds the
    /// symbol lock.
    fn place_locked(
        &self,
        state: &mut SymbolState,
        order: Order,
        reference: Option<Price>,
    ) -> Result<PlaceReport, CoreError> {
        let symbol = order.symbol.clone();
        let (estimate, sweep_cost) = if order.kind.is_market() {
            (
                state.book.estimated_fill_price(order.side, order.quantity),
                state.book.estimated_sweep_cost(order.side, order.quantity),
            )
        } else {
            (None, None)
        };

        let current = state.ledger.signed_quantity(&order.owner_id, &symbol);
        validate_order(
            &order,
            self.pairs.get(&symbol),
            reference,
            current,
            estimate,
            &self.limits,
        )
        .map_err(CoreError::Rejected)?;

        let reservation = reservation_for(&order, reference, sweep_cost);
        if reservation.amount > Decimal::ZERO {
            self.balances
                .reserve(&reservation.owner, &reservation.asset, reservation.amount)
                .map_err(map_store_error)?;
        }
        let order_id = order.order_id;
        state.reservations.insert(order_id, reservation);

        let outcome = match state.book.place(order, now_nanos()) {
            Ok(outcome) => outcome,
            Err(MatchError::ConsistencyFault { detail }) => {
                if let Some(reservation) = state.reservations.remove(&order_id) {
                    let _ = self.release_reservation(&reservation);
                }
                return Err(CoreError::ConsistencyFault { detail });
            }
        };

        self.apply_and_settle(state, &outcome)?;
        self.close_out_reservation(state, &outcome)?;
        self.broadcaster.publish(&symbol, &outcome.events);

        Ok(PlaceReport {
            order_id,
            status: outcome.order.status,
            trades: outcome.trades,
        })
    }

    /// Move positions and funds for every trade, both sides each
    fn apply_and_settle(
        &self,
        state: &mut SymbolState,
        outcome: &PlaceOutcome,
    ) -> Result<(), CoreError> {
        for trade in &outcome.trades {
            state
                .ledger
                .apply(trade, trade.taker_side, trade.taker_owner_id)
                .map_err(|e| CoreError::ConsistencyFault {
                    detail: e.to_string(),
                })?;
            state
                .ledger
                .apply(trade, trade.maker_side(), trade.maker_owner_id)
                .map_err(|e| CoreError::ConsistencyFault {
                    detail: e.to_string(),
                })?;

            self.settle_trade(state, trade)?;
        }
        Ok(())
    }

    /// Settle one committed trade: the buyer's locked quote pays for base,
    /// the seller's locked base pays for quote
    fn settle_trade(&self, state: &mut SymbolState, trade: &Trade) -> Result<(), CoreError> {
        let (base, quote) = trade.symbol.split();
        let (buyer, buyer_order, seller, seller_order) = match trade.taker_side {
            Side::Buy => (
                trade.taker_owner_id,
                trade.taker_order_id,
                trade.maker_owner_id,
                trade.maker_order_id,
            ),
            Side::Sell => (
                trade.maker_owner_id,
                trade.maker_order_id,
                trade.taker_owner_id,
                trade.taker_order_id,
            ),
        };

        let notional = trade.notional();
        let quantity = trade.quantity.as_decimal();

        self.settle_from_reservation(state, &buyer_order, &buyer, quote, notional)?;
        self.balances
            .credit(&buyer, base, quantity)
            .map_err(map_store_error)?;

        self.settle_from_reservation(state, &seller_order, &seller, base, quantity)?;
        self.balances
            .credit(&seller, quote, notional)
            .map_err(map_store_error)?;

        Ok(())
    }

    /// Settle against an order's tracked reservation
    ///
    /// Reservations are sized to cover every fill the order can produce,
    /// so a settlement exceeding the remainder means funds were never
    /// locked for it. That shortfall is a consistency fault, not something
    /// to absorb silently.
    fn settle_from_reservation(
        &self,
        state: &mut SymbolState,
        order_id: &OrderId,
        owner: &AccountId,
        asset: &str,
        amount: Decimal,
    ) -> Result<(), CoreError> {
        let drained = match state.reservations.get_mut(order_id) {
            Some(reservation) => {
                if amount > reservation.amount {
                    let detail = format!(
                        "settlement of {amount} {asset} exceeds the {} still reserved for order {order_id}",
                        reservation.amount
                    );
                    error!(%order_id, "consistency fault: {detail}");
                    return Err(CoreError::ConsistencyFault { detail });
                }
                reservation.amount -= amount;
                reservation.amount.is_zero()
            }
            None => {
                warn!(%order_id, asset, "settling without a tracked reservation");
                false
            }
        };
        if drained {
            state.reservations.remove(order_id);
        }
        if amount > Decimal::ZERO {
            self.balances
                .settle(owner, asset, amount)
                .map_err(map_store_error)?;
        }
        Ok(())
    }

    /// After matching: resting limit remainders keep their reservation,
    /// everything else releases the leftover
    ///
    /// A remainder only needs what its own limit price can consume. The
    /// taker phase settles at maker prices at or better than the limit, so
    /// any savings are given back here instead of staying locked until a
    /// cancel that may never come.
    fn close_out_reservation(
        &self,
        state: &mut SymbolState,
        outcome: &PlaceOutcome,
    ) -> Result<(), CoreError> {
        let order = &outcome.order;
        let rests = matches!(order.kind, OrderKind::Limit { .. })
            && !order.status.is_terminal()
            && !order.remaining_quantity.is_negligible();
        if rests {
            let needed = match (order.side, order.kind.limit_price()) {
                (Side::Buy, Some(limit)) => {
                    order.remaining_quantity.as_decimal() * limit.as_decimal()
                }
                _ => order.remaining_quantity.as_decimal(),
            };
            if let Some(reservation) = state.reservations.get_mut(&order.order_id) {
                if reservation.amount > needed {
                    let excess = reservation.amount - needed;
                    reservation.amount = needed;
                    let owner = reservation.owner;
                    let asset = reservation.asset.clone();
                    self.balances
                        .release(&owner, &asset, excess)
                        .map_err(map_store_error)?;
                }
            }
            return Ok(());
        }

        if let Some(reservation) = state.reservations.remove(&order.order_id) {
            self.release_reservation(&reservation)?;
        }
        Ok(())
    }

    fn release_reservation(&self, reservation: &Reservation) -> Result<(), CoreError> {
        if reservation.amount > Decimal::ZERO {
            self.balances
                .release(&reservation.owner, &reservation.asset, reservation.amount)
                .map_err(map_store_error)?;
        }
        Ok(())
    }
}

/// Funds to lock for an order: quote notional for buys, base quantity for
/// sells
///
/// A market buy locks the book's own sweep cost. Under the symbol lock
/// that walk predicts the fills exactly, so the reservation covers every
/// settlement even when the book trades above the reference price. The
/// reference only sizes the lock when the opposite side is empty, where
/// nothing can fill anyway.
fn reservation_for(
    order: &Order,
    reference: Option<Price>,
    sweep_cost: Option<Decimal>,
) -> Reservation {
    let (base, quote) = order.symbol.split();
    match order.side {
        Side::Buy => {
            let amount = match order.kind.limit_price() {
                Some(limit) => order.quantity.as_decimal() * limit.as_decimal(),
                None => sweep_cost.unwrap_or_else(|| {
                    reference
                        .map(|p| order.quantity.as_decimal() * p.as_decimal())
                        .unwrap_or(Decimal::ZERO)
                }),
            };
            Reservation {
                owner: order.owner_id,
                asset: quote.to_string(),
                amount,
            }
        }
        Side::Sell => Reservation {
            owner: order.owner_id,
            asset: base.to_string(),
            amount: order.quantity.as_decimal(),
        },
    }
}

/// Volume-weighted average price across fills
fn average_fill_price(trades: &[Trade]) -> Option<Price> {
    let total_quantity: Decimal = trades.iter().map(|t| t.quantity.as_decimal()).sum();
    if total_quantity.is_zero() {
        return None;
    }
    let total_notional: Decimal = trades.iter().map(|t| t.notional()).sum();
    Price::try_new(total_notional / total_quantity).ok()
}

fn map_store_error(error: BalanceStoreError) -> CoreError {
    match error {
        BalanceStoreError::Funds(_) => CoreError::Rejected(RejectReason::InsufficientFunds),
        BalanceStoreError::Unavailable { .. } => CoreError::UpstreamUnavailable {
            service: "balance-store".to_string(),
        },
    }
}

fn now_nanos() -> i64 {
    Utc::now().timestamp_nanos_opt().unwrap_or(i64::MAX)
}
