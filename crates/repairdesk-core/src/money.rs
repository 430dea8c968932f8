//! # Money
//!
//! Amounts are integer minor units (cents). Labor, line totals and invoice
//! totals are all sums of cents, so an invoice always equals its labor plus
//! its lines to the cent.
//!
//! ```text
//!   labor 150.00 ──┐
//!   2 × 49.99    ──┼──►  15000 + 9998 = 24998  ──►  "249.98"
//! ```
//!
//! Overflow is ruled out by input bounds: prices and labor are capped at
//! [`MAX_PRICE_CENTS`](crate::MAX_PRICE_CENTS), quantities at
//! [`MAX_ITEM_QUANTITY`](crate::MAX_ITEM_QUANTITY).
//!
//! ```rust
//! use repairdesk_core::money::Money;
//!
//! let labor = Money::from_cents(15000);
//! let part = Money::from_cents(4999).multiply_quantity(2);
//! assert_eq!((labor + part).to_string(), "249.98");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Sub};
use ts_rs::TS;

/// An amount in cents. Signed so a margin can go below zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Unit price × quantity.
    ///
    /// ```rust
    /// use repairdesk_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(299).multiply_quantity(3).cents(), 897);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

/// `major.minor`, no currency symbol.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}
