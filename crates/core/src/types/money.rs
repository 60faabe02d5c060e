//! Monetary amounts using decimal arithmetic.
//!
//! All storefront prices are quoted in a single currency (QAR), so `Money`
//! carries an amount only. Amounts are never negative; arithmetic that could
//! produce a negative value is rejected at construction time instead.

use core::fmt;
use std::ops::{Add, Mul};
use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing a [`Money`] value.
#[derive(thiserror::Error, Debug, Clone)]
pub enum MoneyError {
    /// The amount is negative.
    #[error("monetary amount cannot be negative: {0}")]
    Negative(Decimal),
    /// The input string is not a valid decimal.
    #[error("invalid monetary amount: {0}")]
    Parse(String),
}

/// A non-negative monetary amount.
///
/// Serializes as a decimal string (e.g. `"10.50"`), matching how prices
/// travel on the wire everywhere else in the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    /// The zero amount.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a `Money` value, rejecting negative amounts.
    ///
    /// # Errors
    ///
    /// Returns [`MoneyError::Negative`] if `amount < 0`.
    pub fn new(amount: Decimal) -> Result<Self, MoneyError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(MoneyError::Negative(amount));
        }
        Ok(Self(amount))
    }

    /// Create a `Money` value from whole currency units.
    #[must_use]
    pub fn from_major(units: u64) -> Self {
        Self(Decimal::from(units))
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Round to the nearest multiple of `increment`, midpoints away from zero.
    ///
    /// A zero increment leaves the amount unchanged.
    #[must_use]
    pub fn round_to_increment(self, increment: Self) -> Self {
        if increment.0.is_zero() {
            return self;
        }
        let steps = (self.0 / increment.0)
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
        Self(steps * increment.0)
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Mul<u32> for Money {
    type Output = Self;

    fn mul(self, rhs: u32) -> Self {
        Self(self.0 * Decimal::from(rhs))
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl FromStr for Money {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let amount = Decimal::from_str(s).map_err(|e| MoneyError::Parse(e.to_string()))?;
        Self::new(amount)
    }
}
