//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  With floating point:                                                   │
//! │    150.00 * 0.9 = 135.00000000000003                                    │
//! │                                                                         │
//! │  Ticket totals computed that way drift a cent at a time once they      │
//! │  are summed in the sales dashboard.                                     │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    15000 cents * 9000 bps / 10000 = 13500 cents, exactly               │
//! │    Fractions of a cent are resolved ONCE, with half-even rounding      │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use akari_core::money::Money;
//!
//! let price = Money::from_cents(7500); // 75.00
//! let line_total = price.checked_multiply_quantity(2).unwrap();
//! assert_eq!(line_total.cents(), 15000);
//!
//! let total = Money::checked_sum([line_total, Money::from_cents(250)]).unwrap();
//! assert_eq!(total.cents(), 15250);
//!
//! // Overflow is reported, never wrapped.
//! assert!(Money::from_cents(i64::MAX / 2).checked_multiply_quantity(3).is_none());
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub};

use crate::types::DiscountRate;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (cents).
///
/// ## Where Money is Used
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │                                                                         │
/// │  Product.price_sell_cents ──► CartLine.unit_price_cents (snapshot)     │
/// │                                    │                                    │
/// │                                    ▼                                    │
/// │                          CartLine.total_amount_cents                    │
/// │                                    │ sum of pending lines               │
/// │                                    ▼                                    │
/// │  Ticket.prev_price_cents ──► apply_discount ──► Ticket.final_price     │
/// │                                                                         │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    ///
    /// ```rust
    /// use akari_core::money::Money;
    ///
    /// let price = Money::from_cents(1099);
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit portion.
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn minor(&self) -> i64 {
        (self.0 % 100).abs()
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies a unit price by a line quantity.
    ///
    /// ## User Workflow
    /// ```text
    /// Product: Cuaderno 75.00
    /// Quantity: 2
    ///      │
    ///      ▼
    /// checked_multiply_quantity(2) ← THIS FUNCTION
    ///      │
    ///      ▼
    /// CartLine.total_amount_cents: 15000
    /// ```
    ///
    /// Returns `None` if the product does not fit in an `i64`.
    #[inline]
    pub const fn checked_multiply_quantity(&self, qty: i64) -> Option<Self> {
        match self.0.checked_mul(qty) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// Adds two amounts, `None` on overflow.
    #[inline]
    pub const fn checked_add(&self, other: Money) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// Sums line totals, `None` if the running total overflows.
    pub fn checked_sum<I: IntoIterator<Item = Money>>(amounts: I) -> Option<Self> {
        amounts
            .into_iter()
            .try_fold(Money::zero(), |acc, m| acc.checked_add(m))
    }

    /// Returns the amount left after taking `rate` off, rounded half-even.
    ///
    /// ## Bankers Rounding
    /// ```text
    /// ┌─────────────────────────────────────────────────────────────────────┐
    /// │  exact = amount × (10000 − bps) / 10000                             │
    /// │                                                                     │
    /// │  remainder <  ½  → round down                                       │
    /// │  remainder >  ½  → round up                                         │
    /// │  remainder == ½  → round to the EVEN neighbour                      │
    /// │                                                                     │
    /// │  10.05 at 50% = 5.025 → 5.02                                        │
    /// │  10.15 at 50% = 5.075 → 5.08                                        │
    /// └─────────────────────────────────────────────────────────────────────┘
    /// ```
    ///
    /// ```rust
    /// use akari_core::money::Money;
    /// use akari_core::types::DiscountRate;
    ///
    /// let pre = Money::from_cents(15000);
    /// assert_eq!(pre.apply_discount(DiscountRate::from_percent(10)).cents(), 13500);
    /// assert_eq!(pre.apply_discount(DiscountRate::zero()), pre);
    /// ```
    pub fn apply_discount(&self, rate: DiscountRate) -> Money {
        // i128 keeps amount × 10000 from overflowing
        let numerator = self.0 as i128 * (10_000 - rate.bps() as i128);
        Money::from_cents(div_round_half_even(numerator, 10_000) as i64)
    }
}

/// Integer division with ties broken toward the even quotient. `d` > 0.
fn div_round_half_even(n: i128, d: i128) -> i128 {
    let q = n.div_euclid(d);
    let r = n.rem_euclid(d);
    match (2 * r).cmp(&d) {
        std::cmp::Ordering::Less => q,
        std::cmp::Ordering::Greater => q + 1,
        std::cmp::Ordering::Equal => {
            if q % 2 == 0 {
                q
            } else {
                q + 1
            }
        }
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Debug-friendly display; front ends do their own localization.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}${}.{:02}", sign, self.major().abs(), self.minor())
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

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + *m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(1099);
        assert_eq!(money.cents(), 1099);
        assert_eq!(money.major(), 10);
        assert_eq!(money.minor(), 99);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_cents(1099)), "$10.99");
        assert_eq!(format!("{}", Money::from_cents(500)), "$5.00");
        assert_eq!(format!("{}", Money::from_cents(-550)), "-$5.50");
        assert_eq!(format!("{}", Money::zero()), "$0.00");
    }

    #[test]
    fn test_arithmetic_and_sum() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        assert_eq!((a * 3).cents(), 3000);

        let lines = vec![Money::from_cents(10000), Money::from_cents(5000)];
        let total: Money = lines.iter().sum();
        assert_eq!(total.cents(), 15000);

        let empty: Vec<Money> = Vec::new();
        assert!(empty.into_iter().sum::<Money>().is_zero());
    }

    #[test]
    fn test_checked_arithmetic_reports_overflow() {
        let price = Money::from_cents(2500);
        assert_eq!(price.checked_multiply_quantity(3), Some(Money::from_cents(7500)));
        assert_eq!(Money::from_cents(i64::MAX / 2).checked_multiply_quantity(3), None);
        assert_eq!(Money::from_cents(i64::MIN).checked_multiply_quantity(-1), None);

        assert_eq!(
            Money::checked_sum([Money::from_cents(10000), Money::from_cents(5000)]),
            Some(Money::from_cents(15000))
        );
        assert_eq!(
            Money::checked_sum([Money::from_cents(i64::MAX), Money::from_cents(1)]),
            None
        );
        assert_eq!(Money::checked_sum(std::iter::empty()), Some(Money::zero()));
    }

    #[test]
    fn test_ten_percent_off_150() {
        let pre = Money::from_cents(15000);
        let final_price = pre.apply_discount(DiscountRate::from_percent(10));
        assert_eq!(final_price.cents(), 13500);
    }

    #[test]
    fn test_discount_ties_round_to_even() {
        // 502.5 → 502 (even)
        assert_eq!(
            Money::from_cents(1005)
                .apply_discount(DiscountRate::from_percent(50))
                .cents(),
            502
        );
        // 507.5 → 508 (even)
        assert_eq!(
            Money::from_cents(1015)
                .apply_discount(DiscountRate::from_percent(50))
                .cents(),
            508
        );
    }

    #[test]
    fn test_discount_non_tie_rounding() {
        // 999 × 0.85 = 849.15 → 849
        assert_eq!(
            Money::from_cents(999)
                .apply_discount(DiscountRate::from_bps(1500))
                .cents(),
            849
        );
        // 333 × 0.67 = 223.11 → 223; 1 × 0.33 = 0.33 → 0
        assert_eq!(
            Money::from_cents(333)
                .apply_discount(DiscountRate::from_bps(3300))
                .cents(),
            223
        );
        assert_eq!(
            Money::from_cents(1)
                .apply_discount(DiscountRate::from_bps(6700))
                .cents(),
            0
        );
    }

    #[test]
    fn test_discount_bounds() {
        let pre = Money::from_cents(4321);
        assert_eq!(pre.apply_discount(DiscountRate::zero()), pre);
        assert!(pre.apply_discount(DiscountRate::from_percent(100)).is_zero());
    }

    #[test]
    fn test_div_round_half_even_negative() {
        // -2.5 → -2, -3.5 → -4
        assert_eq!(div_round_half_even(-25, 10), -2);
        assert_eq!(div_round_half_even(-35, 10), -4);
        assert_eq!(div_round_half_even(-26, 10), -3);
    }
}
