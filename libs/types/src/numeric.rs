//! Fixed-point decimal types for prices and quantities
//!
//! Prices use rust_decimal for deterministic arithmetic (no floating-point
//! errors). Quantities are whole shares.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};
use std::str::FromStr;

/// Number of decimal places in the currency unit
pub const PRICE_SCALE: u32 = 2;

/// Limit or execution price in currency units
///
/// Construction does not validate the value: a malformed price (zero,
/// negative, sub-cent) must still reach the business validator so it can be
/// rejected with a reason. Use [`Price::is_valid`] to check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    pub fn new(value: Decimal) -> Self {
        Self(value.normalize())
    }

    pub fn from_u64(value: u64) -> Self {
        Self(Decimal::from(value))
    }

    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// Strictly positive with at most two decimal places
    pub fn is_valid(&self) -> bool {
        self.0 > Decimal::ZERO && self.0.normalize().scale() <= PRICE_SCALE
    }

    /// Value of `quantity` shares at this price
    ///
    /// # Panics
    /// Panics if the product does not fit a `Decimal`. Orders are screened
    /// with [`Price::checked_notional`] on intake, so every fill of an
    /// accepted order fits.
    pub fn notional(&self, quantity: Quantity) -> Decimal {
        self.checked_notional(quantity)
            .expect("notional overflow")
    }

    /// Value of `quantity` shares, or `None` if it does not fit a `Decimal`
    pub fn checked_notional(&self, quantity: Quantity) -> Option<Decimal> {
        self.0.checked_mul(Decimal::from(quantity.as_u64()))
    }
}

impl FromStr for Price {
    type Err = rust_decimal::Error;

    /// Parse a price such as `"150.25"`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s).map(Self::new)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Share count
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Quantity(u64);

impl Quantity {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn zero() -> Self {
        Self(0)
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }

    pub fn as_decimal(&self) -> Decimal {
        Decimal::from(self.0)
    }

    pub fn checked_add(self, rhs: Quantity) -> Option<Quantity> {
        self.0.checked_add(rhs.0).map(Quantity)
    }

    /// Subtraction that returns `None` instead of going negative
    pub fn checked_sub(self, rhs: Quantity) -> Option<Quantity> {
        self.0.checked_sub(rhs.0).map(Quantity)
    }
}

impl Add for Quantity {
    type Output = Quantity;

    fn add(self, rhs: Quantity) -> Quantity {
        Quantity(self.0 + rhs.0)
    }
}

impl Sub for Quantity {
    type Output = Quantity;

    /// # Panics
    /// Panics on underflow; quantities never go negative.
    fn sub(self, rhs: Quantity) -> Quantity {
        Quantity(
            self.0
                .checked_sub(rhs.0)
                .expect("quantity underflow"),
        )
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
