//! Balance and fund-movement types
//!
//! One balance per (owner, asset). Funds move from `available` to `locked`
//! on reservation and leave `locked` only when a committed trade settles;
//! nothing moves speculatively. Invariant: both legs stay non-negative.

use crate::errors::BalanceError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Balance for a single asset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    pub asset: String,
    pub available: Decimal,
    pub locked: Decimal,
}

impl Balance {
    /// Create a balance with everything available
    pub fn new(asset: impl Into<String>, available: Decimal) -> Self {
        Self {
            asset: asset.into(),
            available,
            locked: Decimal::ZERO,
        }
    }

    /// Total funds across both legs
    pub fn total(&self) -> Decimal {
        self.available + self.locked
    }

    /// Move funds from available to locked ahead of order placement
    pub fn reserve(&mut self, amount: Decimal) -> Result<(), BalanceError> {
        self.check_amount(amount)?;
        if amount > self.available {
            return Err(BalanceError::Insufficient {
                asset: self.asset.clone(),
                required: amount,
                available: self.available,
            });
        }
        self.available -= amount;
        self.locked += amount;
        Ok(())
    }

    /// Return locked funds to available (cancel, partial fill remainder)
    pub fn release(&mut self, amount: Decimal) -> Result<(), BalanceError> {
        self.check_amount(amount)?;
        if amount > self.locked {
            return Err(BalanceError::InsufficientLocked {
                asset: self.asset.clone(),
                required: amount,
                locked: self.locked,
            });
        }
        self.locked -= amount;
        self.available += amount;
        Ok(())
    }

    /// Remove locked funds permanently as a consequence of a committed trade
    pub fn settle(&mut self, amount: Decimal) -> Result<(), BalanceError> {
        self.check_amount(amount)?;
        if amount > self.locked {
            return Err(BalanceError::InsufficientLocked {
                asset: self.asset.clone(),
                required: amount,
                locked: self.locked,
            });
        }
        self.locked -= amount;
        Ok(())
    }

    /// Credit funds to available (deposit, trade proceeds)
    pub fn credit(&mut self, amount: Decimal) -> Result<(), BalanceError> {
        self.check_amount(amount)?;
        self.available += amount;
        Ok(())
    }

    fn check_amount(&self, amount: Decimal) -> Result<(), BalanceError> {
        if amount < Decimal::ZERO {
            return Err(BalanceError::NegativeAmount {
                asset: self.asset.clone(),
                amount,
            });
        }
        Ok(())
    }
}
