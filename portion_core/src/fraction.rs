// Copyright 2026 the Portion Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Exact progress fractions with overflow-safe arithmetic.
//!
//! A [`Fraction`] is a rational `completed / total` backed by two `i64`s.
//! Arithmetic stays exact for as long as the intermediate products fit:
//!
//! 1. Bring both operands to the least common multiple of their totals and
//!    combine numerators with checked arithmetic.
//! 2. If anything overflows, divide both operands by their GCD and retry.
//! 3. If that still overflows, fall back to `f64`, re-express the result in
//!    units of [`APPROXIMATION_DENOMINATOR`](Fraction::APPROXIMATION_DENOMINATOR)
//!    and mark it *overflowed*.
//!
//! Overflow is sticky: any arithmetic with an overflowed operand goes
//! straight to the floating-point path and produces an overflowed result.
//! Overflowed fractions compare by their floating-point values only.
//!
//! A fraction with `total == 0` is *indeterminate* (not a number). Adding
//! or subtracting an indeterminate fraction returns the other operand
//! unchanged; combining two indeterminate fractions is a programming error.

use core::fmt;
use core::ops::{Add, Div, Mul, Sub};

/// An exact (or, after overflow, approximate) rational `completed / total`.
#[derive(Clone, Copy)]
pub struct Fraction {
    completed: i64,
    total: i64,
    overflowed: bool,
}

impl Fraction {
    /// Denominator used to re-express approximated values.
    pub const APPROXIMATION_DENOMINATOR: i64 = 131_072;

    /// `0 / 1`.
    pub const ZERO: Self = Self::new(0, 1);

    /// `1 / 1`.
    pub const ONE: Self = Self::new(1, 1);

    /// `0 / 0`, the canonical indeterminate fraction.
    pub const INDETERMINATE: Self = Self::new(0, 0);

    /// Creates an exact fraction.
    ///
    /// # Panics
    ///
    /// Panics if `total` is negative.
    #[inline]
    #[must_use]
    pub const fn new(completed: i64, total: i64) -> Self {
        assert!(total >= 0, "fraction total must not be negative");
        Self {
            completed,
            total,
            overflowed: false,
        }
    }

    /// Creates an overflowed fraction approximating `value`.
    ///
    /// The value is scaled by [`APPROXIMATION_DENOMINATOR`](Self::APPROXIMATION_DENOMINATOR)
    /// and truncated toward zero.
    #[must_use]
    pub fn approximate(value: f64) -> Self {
        #[expect(
            clippy::cast_possible_truncation,
            reason = "truncation toward zero is the rounding policy for approximations"
        )]
        let completed = (value * Self::APPROXIMATION_DENOMINATOR as f64) as i64;
        Self {
            completed,
            total: Self::APPROXIMATION_DENOMINATOR,
            overflowed: true,
        }
    }

    /// Returns the numerator.
    #[inline]
    #[must_use]
    pub const fn completed(self) -> i64 {
        self.completed
    }

    /// Returns the denominator.
    #[inline]
    #[must_use]
    pub const fn total(self) -> i64 {
        self.total
    }

    /// Returns whether this fraction is an approximation produced after an
    /// arithmetic overflow.
    #[inline]
    #[must_use]
    pub const fn is_overflowed(self) -> bool {
        self.overflowed
    }

    /// Returns whether the total is zero.
    #[inline]
    #[must_use]
    pub const fn is_indeterminate(self) -> bool {
        self.total == 0
    }

    /// Returns whether `completed >= total` with a positive total.
    #[inline]
    #[must_use]
    pub const fn is_finished(self) -> bool {
        self.total > 0 && self.completed >= self.total
    }

    /// Returns the value as `f64`, or `NaN` if indeterminate.
    #[must_use]
    pub fn fraction_completed(self) -> f64 {
        if self.total == 0 {
            return f64::NAN;
        }
        self.completed as f64 / self.total as f64
    }

    /// Returns this fraction reduced to lowest terms.
    #[must_use]
    pub fn simplified(self) -> Self {
        if self.total == 0 {
            return self;
        }
        let divisor = gcd(self.completed.unsigned_abs(), self.total.unsigned_abs());
        // The divisor never exceeds `total`, so it always fits.
        i64::try_from(divisor).map_or(self, |divisor| Self {
            completed: self.completed / divisor,
            total: self.total / divisor,
            overflowed: self.overflowed,
        })
    }

    /// Reduces this fraction to lowest terms in place.
    pub fn simplify(&mut self) {
        *self = self.simplified();
    }

    /// Runs `exact` on the operands, then on their simplified forms, and
    /// finally falls back to `approx` on their floating-point values.
    fn ladder(
        lhs: Self,
        rhs: Self,
        exact: impl Fn(Self, Self) -> Option<Self>,
        approx: impl Fn(f64, f64) -> f64,
    ) -> Self {
        if lhs.overflowed || rhs.overflowed {
            return Self::approximate(approx(lhs.fraction_completed(), rhs.fraction_completed()));
        }
        exact(lhs, rhs)
            .or_else(|| exact(lhs.simplified(), rhs.simplified()))
            .unwrap_or_else(|| {
                Self::approximate(approx(lhs.fraction_completed(), rhs.fraction_completed()))
            })
    }

    fn combine_over_lcm(
        self,
        rhs: Self,
        numerators: fn(i64, i64) -> Option<i64>,
        approx: fn(f64, f64) -> f64,
    ) -> Self {
        match (self.is_indeterminate(), rhs.is_indeterminate()) {
            (true, true) => panic!("arithmetic between two indeterminate fractions"),
            (true, false) => return rhs,
            (false, true) => return self,
            (false, false) => {}
        }
        Self::ladder(
            self,
            rhs,
            |a, b| {
                let lcm = lcm(a.total, b.total)?;
                let lhs = a.completed.checked_mul(lcm / a.total)?;
                let rhs = b.completed.checked_mul(lcm / b.total)?;
                Some(Self::new(numerators(lhs, rhs)?, lcm))
            },
            approx,
        )
    }
}

impl Default for Fraction {
    fn default() -> Self {
        Self::ZERO
    }
}

impl Add for Fraction {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        self.combine_over_lcm(rhs, i64::checked_add, |a, b| a + b)
    }
}

impl Sub for Fraction {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        self.combine_over_lcm(rhs, i64::checked_sub, |a, b| a - b)
    }
}

impl Mul for Fraction {
    type Output = Self;

    /// Multiplies numerators and denominators.
    ///
    /// If exactly one operand is indeterminate the product is
    /// [`INDETERMINATE`](Self::INDETERMINATE).
    fn mul(self, rhs: Self) -> Self {
        match (self.is_indeterminate(), rhs.is_indeterminate()) {
            (true, true) => panic!("arithmetic between two indeterminate fractions"),
            (false, false) => {}
            _ => return Self::INDETERMINATE,
        }
        Self::ladder(
            self,
            rhs,
            |a, b| {
                Some(Self::new(
                    a.completed.checked_mul(b.completed)?,
                    a.total.checked_mul(b.total)?,
                ))
            },
            |a, b| a * b,
        )
    }
}

impl Div<i64> for Fraction {
    type Output = Self;

    /// Scales the denominator by `rhs`.
    ///
    /// # Panics
    ///
    /// Panics if `rhs` is zero or negative.
    fn div(self, rhs: i64) -> Self {
        assert!(rhs != 0, "division of a fraction by zero");
        assert!(rhs > 0, "fraction divisor must be positive");
        if self.is_indeterminate() {
            return self;
        }
        let approx = || Self::approximate(self.fraction_completed() / rhs as f64);
        if self.overflowed {
            return approx();
        }
        let exact = |f: Self| f.total.checked_mul(rhs).map(|total| Self::new(f.completed, total));
        exact(self)
            .or_else(|| exact(self.simplified()))
            .unwrap_or_else(approx)
    }
}

impl PartialEq for Fraction {
    /// Compares by value. Indeterminate fractions are never equal to
    /// anything, themselves included.
    fn eq(&self, other: &Self) -> bool {
        let (a, b) = (*self, *other);
        if a.is_indeterminate() || b.is_indeterminate() {
            return false;
        }
        if a.completed == b.completed && a.total == b.total {
            return true;
        }
        if a.overflowed || b.overflowed {
            return a.fraction_completed() == b.fraction_completed();
        }
        if a.total == b.total {
            return false;
        }
        if a.completed == 0 && b.completed == 0 {
            return true;
        }
        if a.completed == a.total && b.completed == b.total {
            return true;
        }
        if a.completed == 0 || b.completed == 0 {
            return false;
        }
        let cross = |a: Self, b: Self| {
            Some(a.completed.checked_mul(b.total)? == a.total.checked_mul(b.completed)?)
        };
        cross(a, b)
            .or_else(|| cross(a.simplified(), b.simplified()))
            .unwrap_or_else(|| a.fraction_completed() == b.fraction_completed())
    }
}

impl fmt::Debug for Fraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fraction({}/{}", self.completed, self.total)?;
        if self.overflowed {
            write!(f, ", overflowed")?;
        }
        write!(f, ")")
    }
}

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

/// Least common multiple of two positive totals, or `None` on overflow.
fn lcm(a: i64, b: i64) -> Option<i64> {
    let divisor = i64::try_from(gcd(a.unsigned_abs(), b.unsigned_abs())).ok()?;
    (a / divisor).checked_mul(b)
}
