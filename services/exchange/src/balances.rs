//! Balance store seam
//!
//! Funds move in three steps only: `reserve` ahead of placement,
//! `settle` when a committed trade consumes locked funds, `release` when
//! a reservation outlives its order. The facade orchestrates these; the
//! book never touches balances.
//!
//! An unreachable store is fatal for placement: no order can be safely
//! accepted without a reservation.

use std::collections::HashMap;
use std::sync::RwLock;

use rust_decimal::Decimal;
use thiserror::Error;

use types::balance::Balance;
use types::errors::BalanceError;
use types::ids::AccountId;

/// Failure talking to or moving funds in the store
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BalanceStoreError {
    /// Fund-movement rule violated (insufficient, negative amount)
    #[error(transparent)]
    Funds(#[from] BalanceError),

    /// The store itself is unreachable
    #[error("balance store unreachable: {detail}")]
    Unavailable { detail: String },
}

/// Custody of per-(owner, asset) balances
pub trait BalanceStore: Send + Sync {
    fn reserve(
        &self,
        owner: &AccountId,
        asset: &str,
        amount: Decimal,
    ) -> Result<(), BalanceStoreError>;

    fn release(
        &self,
        owner: &AccountId,
        asset: &str,
        amount: Decimal,
    ) -> Result<(), BalanceStoreError>;

    fn settle(
        &self,
        owner: &AccountId,
        asset: &str,
        amount: Decimal,
    ) -> Result<(), BalanceStoreError>;

    fn credit(
        &self,
        owner: &AccountId,
        asset: &str,
        amount: Decimal,
    ) -> Result<(), BalanceStoreError>;

    /// Current balance, None if the owner never held the asset
    fn balance(&self, owner: &AccountId, asset: &str) -> Result<Option<Balance>, BalanceStoreError>;
}

/// In-process balance store
#[derive(Debug, Default)]
pub struct InMemoryBalanceStore {
    balances: RwLock<HashMap<(AccountId, String), Balance>>,
}

impl InMemoryBalanceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit funds directly; test and bootstrap convenience
    pub fn deposit(&self, owner: AccountId, asset: &str, amount: Decimal) {
        let mut balances = self.balances.write().expect("balance lock poisoned");
        balances
            .entry((owner, asset.to_string()))
            .and_modify(|b| b.available += amount)
            .or_insert_with(|| Balance::new(asset, amount));
    }

    fn with_balance<F>(
        &self,
        owner: &AccountId,
        asset: &str,
        f: F,
    ) -> Result<(), BalanceStoreError>
    where
        F: FnOnce(&mut Balance) -> Result<(), BalanceError>,
    {
        let mut balances = self.balances.write().expect("balance lock poisoned");
        let balance = balances
            .entry((*owner, asset.to_string()))
            .or_insert_with(|| Balance::new(asset, Decimal::ZERO));
        f(balance).map_err(BalanceStoreError::from)
    }
}

impl BalanceStore for InMemoryBalanceStore {
    fn reserve(
        &self,
        owner: &AccountId,
        asset: &str,
        amount: Decimal,
    ) -> Result<(), BalanceStoreError> {
        self.with_balance(owner, asset, |b| b.reserve(amount))
    }

    fn release(
        &self,
        owner: &AccountId,
        asset: &str,
        amount: Decimal,
    ) -> Result<(), BalanceStoreError> {
        self.with_balance(owner, asset, |b| b.release(amount))
    }

    fn settle(
        &self,
        owner: &AccountId,
        asset: &str,
        amount: Decimal,
    ) -> Result<(), BalanceStoreError> {
        self.with_balance(owner, asset, |b| b.settle(amount))
    }

    fn credit(
        &self,
        owner: &AccountId,
        asset: &str,
        amount: Decimal,
    ) -> Result<(), BalanceStoreError> {
        self.with_balance(owner, asset, |b| b.credit(amount))
    }

    fn balance(&self, owner: &AccountId, asset: &str) -> Result<Option<Balance>, BalanceStoreError> {
        let balances = self.balances.read().expect("balance lock poisoned");
        Ok(balances.get(&(*owner, asset.to_string())).cloned())
    }
}
