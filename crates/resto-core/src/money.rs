//! # Money Module
//!
//! Provides the `Money` type for order totals and redemption discounts.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  POINTS ARE DERIVED FROM MONEY                                          │
//! │                                                                         │
//! │  pointsPerRp = 100                                                      │
//! │    Rp 25.000 / 100  = 250 points                                        │
//! │    Rp 25.099 / 100  = 250 points  (the 99 below one point earns nothing)│
//! │                                                                         │
//! │  With floating point, 0.1 + 0.2 = 0.30000000000000004 and a receipt    │
//! │  could show 249 points for an order that should earn 250.              │
//! │                                                                         │
//! │  OUR SOLUTION: Integer minor units, floor division, checked multiply   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use resto_core::money::Money;
//!
//! let order_total = Money::from_minor(25_000);
//! assert_eq!(order_total.points_at_rate(100), 250);
//!
//! let discount = Money::from_minor(50).checked_times_points(200).unwrap();
//! assert_eq!(discount.minor(), 10_000);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Sub};
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest unit of the outlet's currency.
///
/// For Rupiah the smallest unit in circulation is the rupiah itself, so
/// `Money::from_minor(25_000)` is Rp 25.000.
///
/// ## Where Money is Used
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Order settlement ──► CreditRequest.order_amount ──► base points       │
/// │                                                                         │
/// │  Program.discount_value_per_point × points ──► RedeemResult.discount   │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from the smallest currency unit.
    #[inline]
    pub const fn from_minor(amount: i64) -> Self {
        Money(amount)
    }

    /// Returns the value in the smallest currency unit.
    #[inline]
    pub const fn minor(&self) -> i64 {
        self.0
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Converts an amount into whole points at `per_point` currency units per point.
    ///
    /// ## Rules
    /// - Integer floor division: a remainder below one point earns nothing
    /// - Zero or negative amounts earn nothing (refunds never earn)
    /// - A non-positive rate earns nothing
    ///
    /// ## Example
    /// ```rust
    /// use resto_core::money::Money;
    ///
    /// assert_eq!(Money::from_minor(25_000).points_at_rate(100), 250);
    /// assert_eq!(Money::from_minor(99).points_at_rate(100), 0);
    /// assert_eq!(Money::from_minor(-500).points_at_rate(100), 0);
    /// ```
    #[inline]
    pub const fn points_at_rate(&self, per_point: i64) -> i64 {
        if self.0 <= 0 || per_point <= 0 {
            return 0;
        }
        self.0 / per_point
    }

    /// Multiplies a per-point value by a number of points.
    ///
    /// Returns `None` on overflow so that a misconfigured program cannot
    /// wrap a discount around to a negative amount.
    #[inline]
    pub const fn checked_times_points(&self, points: i64) -> Option<Money> {
        match self.0.checked_mul(points) {
            Some(v) => Some(Money(v)),
            None => None,
        }
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display groups thousands with dots, the way Rupiah prints on receipts.
///
/// ## Note
/// This is for logs and debugging. The dashboard formats for its own locale.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.0.unsigned_abs().to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(ch);
        }
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}Rp {}", sign, grouped)
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
