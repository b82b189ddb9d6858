//! Amounts in Brazilian reais, held as whole centavos.
//!
//! Prices, line totals, adjustments and sale totals are all [`Money`].
//! Percent adjustments are expressed in basis points (`1000` = 10%) and
//! rounded half up to the centavo, so no float ever enters a total.
//!
//! Arithmetic is checked: every operation returns `None` instead of
//! wrapping or panicking when the result leaves the `i64` range.
//!
//! ```rust
//! use pdv_core::money::Money;
//!
//! let line = Money::from_cents(1099).checked_mul(2).unwrap();
//! assert_eq!(line.cents(), 2198);
//! assert_eq!(line.to_string(), "R$ 21,98");
//! assert_eq!(Money::from_cents(i64::MAX).checked_mul(2), None);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

/// 100% in basis points.
pub const BPS_SCALE: i64 = 10_000;

/// Centavos. Serializes as a bare integer (`1099`, not `"10.99"`).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Whole reais, truncated toward zero.
    #[inline]
    pub const fn reais(&self) -> i64 {
        self.0 / 100
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    #[inline]
    pub const fn checked_add(self, rhs: Money) -> Option<Money> {
        match self.0.checked_add(rhs.0) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    #[inline]
    pub const fn checked_sub(self, rhs: Money) -> Option<Money> {
        match self.0.checked_sub(rhs.0) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// Unit price times quantity.
    ///
    /// ```rust
    /// use pdv_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(299).checked_mul(3).unwrap().cents(), 897);
    /// ```
    #[inline]
    pub const fn checked_mul(self, qty: i64) -> Option<Money> {
        match self.0.checked_mul(qty) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// `bps` basis points of this amount, half a centavo rounding up.
    ///
    /// ```rust
    /// use pdv_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(2500).percentage(1000).unwrap().cents(), 250);
    /// // 8.25% of R$ 10,00 is 82.5 centavos
    /// assert_eq!(Money::from_cents(1000).percentage(825).unwrap().cents(), 83);
    /// ```
    pub fn percentage(&self, bps: u32) -> Option<Money> {
        let scale = i128::from(BPS_SCALE);
        let scaled = i128::from(self.0) * i128::from(bps) + scale / 2;
        i64::try_from(scaled / scale).ok().map(Money)
    }

    /// Negative totals become zero: a discount can eat the sale, not more.
    #[inline]
    pub fn clamp_non_negative(self) -> Money {
        Money(self.0.max(0))
    }

    /// Dot-decimal form written into sale notes, e.g. `25.00`.
    pub fn to_decimal_string(&self) -> String {
        format!("{}{}.{:02}", self.sign(), self.reais().abs(), self.centavos())
    }

    fn sign(&self) -> &'static str {
        if self.0 < 0 {
            "-"
        } else {
            ""
        }
    }

    fn centavos(&self) -> i64 {
        (self.0 % 100).abs()
    }
}

/// `R$ 1.234,56`: dot between thousands, comma before centavos.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.reais().abs().to_string();
        let lead = digits.len() % 3;

        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, ch) in digits.char_indices() {
            if i > 0 && (i + 3 - lead) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(ch);
        }

        write!(f, "{}R$ {},{:02}", self.sign(), grouped, self.centavos())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reais_and_centavos() {
        let price = Money::from_cents(1099);
        assert_eq!(price.cents(), 1099);
        assert_eq!(price.reais(), 10);
        assert_eq!(Money::from_cents(-550).reais(), -5);
    }

    #[test]
    fn test_brl_display() {
        assert_eq!(Money::from_cents(1099).to_string(), "R$ 10,99");
        assert_eq!(Money::from_cents(500).to_string(), "R$ 5,00");
        assert_eq!(Money::zero().to_string(), "R$ 0,00");
        assert_eq!(Money::from_cents(-550).to_string(), "-R$ 5,50");
        assert_eq!(Money::from_cents(100000).to_string(), "R$ 1.000,00");
        assert_eq!(Money::from_cents(12345678).to_string(), "R$ 123.456,78");
        assert_eq!(Money::from_cents(123456789).to_string(), "R$ 1.234.567,89");
    }

    #[test]
    fn test_note_format() {
        assert_eq!(Money::from_cents(2500).to_decimal_string(), "25.00");
        assert_eq!(Money::from_cents(5).to_decimal_string(), "0.05");
        assert_eq!(Money::from_cents(123456).to_decimal_string(), "1234.56");
    }

    #[test]
    fn test_checked_arithmetic() {
        let till = Money::from_cents(1000)
            .checked_add(Money::from_cents(500))
            .and_then(|m| m.checked_sub(Money::from_cents(200)))
            .unwrap();
        assert_eq!(till.cents(), 1300);
        assert_eq!(Money::from_cents(250).checked_mul(4).unwrap().cents(), 1000);
    }

    #[test]
    fn test_overflow_is_none() {
        let max = Money::from_cents(i64::MAX);
        let min = Money::from_cents(i64::MIN);

        assert_eq!(max.checked_add(Money::from_cents(1)), None);
        assert_eq!(min.checked_sub(Money::from_cents(1)), None);
        assert_eq!(Money::from_cents(i64::MAX / 2).checked_mul(3), None);
        // 200% of the largest amount does not fit
        assert_eq!(max.percentage(20_000), None);
        assert_eq!(max.percentage(10_000), Some(max));
    }

    #[test]
    fn test_percentage_rounds_half_up() {
        let pct = |cents: i64, bps: u32| Money::from_cents(cents).percentage(bps).unwrap();
        assert_eq!(pct(1000, 1000).cents(), 100);
        assert_eq!(pct(999, 0), Money::zero());
        assert_eq!(pct(999, 10_000).cents(), 999);
        // 1.5% of R$ 1,00
        assert_eq!(pct(100, 150).cents(), 2);
    }

    #[test]
    fn test_clamp_and_sign_checks() {
        assert_eq!(Money::from_cents(-10).clamp_non_negative(), Money::zero());
        assert_eq!(Money::from_cents(10).clamp_non_negative().cents(), 10);
        assert!(Money::from_cents(100).is_positive());
    }

    #[test]
    fn test_serializes_as_integer() {
        assert_eq!(serde_json::to_string(&Money::from_cents(1099)).unwrap(), "1099");
    }
}
