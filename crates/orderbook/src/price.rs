//! Canonical price representation
//!
//! Prices arrive over the wire as floats. Keying price levels by raw
//! `f64` would let `100.0` and `100.00000001` coexist as distinct
//! levels, so a price is canonicalized to a count of 1e-8 ticks on
//! entry. The conversion goes through `rust_decimal` so the grid
//! check is exact decimal arithmetic, not float comparison; inputs
//! off the tick grid are rejected rather than rounded.

use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::BookError;

/// Ticks per whole unit of the quote currency.
const TICKS_PER_UNIT: u64 = 100_000_000;

/// Decimal places the tick grid supports.
const PRICE_DECIMALS: u32 = 8;

/// A price expressed as a whole number of 1e-8 ticks.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "f64", into = "f64")]
pub struct Price(u64);

impl Price {
    /// Canonicalize a float price onto the tick grid.
    ///
    /// Rejects non-finite and negative values, and values that need
    /// more than eight decimal places.
    pub fn from_f64(value: f64) -> Result<Self, BookError> {
        let decimal = Decimal::from_f64(value)
            .ok_or_else(|| BookError::InvalidOrder(format!("invalid price: {value}")))?;
        if decimal.is_sign_negative() {
            return Err(BookError::InvalidOrder(format!("invalid price: {value}")));
        }

        let decimal = decimal.normalize();
        if decimal.scale() > PRICE_DECIMALS {
            return Err(BookError::InvalidOrder(format!(
                "price {value} is off the 1e-8 tick grid"
            )));
        }

        let ticks = decimal
            .checked_mul(Decimal::from(TICKS_PER_UNIT))
            .and_then(|scaled| scaled.to_u64())
            .ok_or_else(|| BookError::InvalidOrder(format!("price {value} is out of range")))?;
        Ok(Self(ticks))
    }

    pub fn as_f64(&self) -> f64 {
        (Decimal::from(self.0) / Decimal::from(TICKS_PER_UNIT))
            .to_f64()
            .unwrap_or_default()
    }

    /// Raw tick count.
    pub fn ticks(&self) -> u64 {
        self.0
    }
}

impl TryFrom<f64> for Price {
    type Error = BookError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::from_f64(value)
    }
}

impl From<Price> for f64 {
    fn from(price: Price) -> Self {
        price.as_f64()
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let price = Price::from_f64(10_000.0).unwrap();
        assert_eq!(price.as_f64(), 10_000.0);
        assert_eq!(price.ticks(), 1_000_000_000_000);
    }

    #[test]
    fn test_fractional_price_is_exact() {
        let price = Price::from_f64(0.1).unwrap();
        assert_eq!(price.ticks(), 10_000_000);
        assert_eq!(price.as_f64(), 0.1);
    }

    #[test]
    fn test_tick_equality() {
        // The same grid point reached from different float spellings
        // must collapse to one key.
        let a = Price::from_f64(99.5).unwrap();
        let b = Price::from_f64(99.50).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_rejects_off_grid() {
        assert!(Price::from_f64(1e-9).is_err());
        assert!(Price::from_f64(0.123456789).is_err());
    }

    #[test]
    fn test_rejects_negative_and_non_finite() {
        assert!(Price::from_f64(-1.0).is_err());
        assert!(Price::from_f64(f64::NAN).is_err());
        assert!(Price::from_f64(f64::INFINITY).is_err());
    }

    #[test]
    fn test_ordering_follows_value() {
        let low = Price::from_f64(100.0).unwrap();
        let high = Price::from_f64(101.0).unwrap();
        assert!(low < high);
    }
}
