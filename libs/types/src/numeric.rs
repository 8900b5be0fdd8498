//! Fixed-point decimal types for prices and quantities
//!
//! Uses rust_decimal for deterministic arithmetic (no floating-point
//! errors). Prices are strictly positive; quantities are non-negative.
//! Remainders below [`QTY_EPSILON`] are dust and treated as zero so no
//! near-zero orders linger on the book.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};
use std::str::FromStr;

use crate::errors::NumericError;

/// Dust tolerance for quantity comparisons: 1e-8
pub const QTY_EPSILON: Decimal = Decimal::from_parts(1, 0, 0, false, 8);

/// A strictly positive price
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// Create a price, rejecting zero and negative values
    pub fn try_new(value: Decimal) -> Result<Self, NumericError> {
        if value > Decimal::ZERO {
            Ok(Self(value))
        } else {
            Err(NumericError::NonPositivePrice(value))
        }
    }

    /// Create a price from an integer number of quote units
    pub fn from_u64(value: u64) -> Self {
        Self(Decimal::from(value))
    }

    /// Parse a price from a decimal string
    pub fn from_str(s: &str) -> Result<Self, NumericError> {
        let value = Decimal::from_str(s).map_err(|_| NumericError::Unparseable(s.to_string()))?;
        Self::try_new(value)
    }

    /// Get inner decimal value
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A non-negative quantity
///
/// `Default` is the zero quantity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Quantity(Decimal);

impl Quantity {
    /// The zero quantity
    pub fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    /// Create a quantity, rejecting negative values
    pub fn try_new(value: Decimal) -> Result<Self, NumericError> {
        if value >= Decimal::ZERO {
            Ok(Self(value))
        } else {
            Err(NumericError::NegativeQuantity(value))
        }
    }

    /// Parse a quantity from a decimal string
    pub fn from_str(s: &str) -> Result<Self, NumericError> {
        let value = Decimal::from_str(s).map_err(|_| NumericError::Unparseable(s.to_string()))?;
        Self::try_new(value)
    }

    /// Get inner decimal value
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// Exact zero check
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Dust check: below [`QTY_EPSILON`] counts as zero
    pub fn is_negligible(&self) -> bool {
        self.0 < QTY_EPSILON
    }

    /// Subtract, returning None if the result would go negative
    pub fn checked_sub(&self, other: Quantity) -> Option<Quantity> {
        let diff = self.0 - other.0;
        if diff >= Decimal::ZERO {
            Some(Self(diff))
        } else {
            None
        }
    }

    /// Smaller of two quantities
    pub fn min(self, other: Quantity) -> Quantity {
        if self.0 <= other.0 {
            self
        } else {
            other
        }
    }
}

impl Add for Quantity {
    type Output = Quantity;

    fn add(self, rhs: Quantity) -> Quantity {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Quantity {
    type Output = Quantity;

    /// Saturating at zero; use [`Quantity::checked_sub`] where going
    /// negative must be detected
    fn sub(self, rhs: Quantity) -> Quantity {
        let diff = self.0 - rhs.0;
        if diff >= Decimal::ZERO {
            Self(diff)
        } else {
            Self(Decimal::ZERO)
        }
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
