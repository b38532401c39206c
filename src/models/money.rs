//! Money value type: yen amounts backed by a fixed-point decimal.

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// An amount of in-game currency.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Money = Money(Decimal::ZERO);

    pub fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Whole-yen amount.
    pub fn from_yen(yen: i64) -> Self {
        Self(Decimal::from(yen))
    }

    pub fn amount(&self) -> Decimal {
        self.0
    }

    pub fn to_f64(&self) -> f64 {
        self.0.to_f64().unwrap_or(0.0)
    }

    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn abs(&self) -> Self {
        Self(self.0.abs())
    }

    /// Format as `¥1,234,567`, rounded to whole yen.
    pub fn format(&self) -> String {
        let rounded = Money(
            self.0
                .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero),
        );
        let digits = rounded.abs().0.trunc().to_string();

        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(ch);
        }

        if rounded.is_negative() {
            format!("-¥{}", grouped)
        } else {
            format!("¥{}", grouped)
        }
    }

    /// Like [`Money::format`] but with an explicit `+` for gains.
    pub fn format_with_sign(&self) -> String {
        if self.is_positive() {
            format!("+{}", self.format())
        } else {
            self.format()
        }
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.format())
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        self.0 += rhs.0;
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        Money(self.0 - rhs.0)
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Money) {
        self.0 -= rhs.0;
    }
}

impl Mul<Decimal> for Money {
    type Output = Money;

    fn mul(self, rhs: Decimal) -> Money {
        Money(self.0 * rhs)
    }
}

impl Div<Decimal> for Money {
    type Output = Money;

    fn div(self, rhs: Decimal) -> Money {
        Money(self.0 / rhs)
    }
}

impl Neg for Money {
    type Output = Money;

    fn neg(self) -> Money {
        Money(-self.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, |acc, m| acc + m)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, |acc, m| acc + *m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_arithmetic() {
        let a = Money::from_yen(1000);
        let b = Money::from_yen(250);

        assert_eq!(a + b, Money::from_yen(1250));
        assert_eq!(a - b, Money::from_yen(750));
        assert_eq!(a * dec!(0.001), Money::new(dec!(1)));
        assert_eq!(a / dec!(4), b);
        assert!(b < a);
        assert!((b - a).is_negative());
    }

    #[test]
    fn test_format() {
        assert_eq!(Money::from_yen(1_000_000).format(), "¥1,000,000");
        assert_eq!(Money::new(dec!(899900.4)).format(), "¥899,900");
        assert_eq!(Money::new(dec!(999.5)).format(), "¥1,000");
        assert_eq!(Money::from_yen(-59940).format(), "-¥59,940");
        assert_eq!(Money::ZERO.format(), "¥0");
    }

    #[test]
    fn test_format_with_sign() {
        assert_eq!(Money::from_yen(1200).format_with_sign(), "+¥1,200");
        assert_eq!(Money::from_yen(-80).format_with_sign(), "-¥80");
        assert_eq!(Money::ZERO.format_with_sign(), "¥0");
    }

    #[test]
    fn test_sum() {
        let total: Money = [Money::from_yen(1), Money::from_yen(2), Money::from_yen(3)]
            .iter()
            .sum();
        assert_eq!(total, Money::from_yen(6));
    }
}
