// Explicit arithmetic context for the high-precision core.
// ---------------------------------------------------------
// Every multiply / divide / add / subtract the core performs goes through a
// `Precision` value and is rounded half-even to its number of significant digits.
// The context is a plain `Copy` value handed to whoever needs it, so two
// simulations running on different threads never share rounding state.
//
// `decimal_from_f64` is the only place where floating point enters the core.

use std::num::NonZeroU64;
use std::str::FromStr;

use bigdecimal::{BigDecimal, RoundingMode};
use num_traits::{One, ToPrimitive, Zero};

use crate::error::DomainError;

pub const MIN_PRECISION: u64 = 28;
pub const DEFAULT_PRECISION: u64 = 34;

const _: () = assert!(DEFAULT_PRECISION >= MIN_PRECISION);

const DEFAULT_DIGITS: NonZeroU64 = match NonZeroU64::new(DEFAULT_PRECISION) {
    Some(d) => d,
    None => unreachable!(),
};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Precision {
    digits: NonZeroU64,
}

impl Default for Precision {
    fn default() -> Self {
        Self { digits: DEFAULT_DIGITS }
    }
}

impl Precision {
    pub fn new(digits: u64) -> Result<Self, DomainError> {
        match NonZeroU64::new(digits) {
            Some(d) if digits >= MIN_PRECISION => Ok(Self { digits: d }),
            _ => Err(DomainError::InsufficientPrecision { requested: digits, minimum: MIN_PRECISION }),
        }
    }

    #[inline]
    pub fn digits(&self) -> u64 {
        self.digits.get()
    }

    /// Same rounding rule with `extra` guard digits on top.
    pub fn widen(&self, extra: u64) -> Self {
        Self { digits: self.digits.saturating_add(extra) }
    }

    #[inline]
    pub fn round(&self, value: BigDecimal) -> BigDecimal {
        if value.is_zero() {
            return value;
        }
        value.with_precision_round(self.digits, RoundingMode::HalfEven)
    }

    #[inline]
    pub fn add(&self, a: &BigDecimal, b: &BigDecimal) -> BigDecimal {
        self.round(a + b)
    }

    #[inline]
    pub fn sub(&self, a: &BigDecimal, b: &BigDecimal) -> BigDecimal {
        self.round(a - b)
    }

    #[inline]
    pub fn mul(&self, a: &BigDecimal, b: &BigDecimal) -> BigDecimal {
        self.round(a * b)
    }

    pub fn div(&self, a: &BigDecimal, b: &BigDecimal) -> Result<BigDecimal, DomainError> {
        if b.is_zero() {
            return Err(DomainError::DivisionByZero);
        }
        Ok(self.round(a / b))
    }

    #[inline]
    pub fn recip(&self, a: &BigDecimal) -> Result<BigDecimal, DomainError> {
        self.div(&BigDecimal::one(), a)
    }

    pub fn sqrt(&self, a: &BigDecimal) -> Result<BigDecimal, DomainError> {
        if *a < BigDecimal::zero() {
            return Err(DomainError::NonPositivePrice { what: "radicand", value: a.to_string() });
        }
        a.sqrt()
            .map(|root| self.round(root))
            .ok_or_else(|| DomainError::NonPositivePrice { what: "radicand", value: a.to_string() })
    }
}

/// Convert an external float into the core decimal type.
///
/// Uses the shortest decimal string that round-trips the float, so `1.00001`
/// becomes exactly `1.00001` rather than its binary expansion.
pub fn decimal_from_f64(value: f64) -> Result<BigDecimal, DomainError> {
    if !value.is_finite() {
        return Err(DomainError::NonFiniteInput(value.to_string()));
    }
    BigDecimal::from_str(&value.to_string())
        .map_err(|_| DomainError::NonFiniteInput(value.to_string()))
}

/// Lossy conversion for reporting and for the f64 search domain.
#[inline]
pub fn decimal_to_f64(value: &BigDecimal) -> f64 {
    value.to_f64().unwrap_or(f64::NAN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_precision_below_minimum() {
        assert!(matches!(
            Precision::new(27),
            Err(DomainError::InsufficientPrecision { requested: 27, minimum: 28 })
        ));
        assert_eq!(Precision::new(28).unwrap().digits(), 28);
        assert_eq!(Precision::default().digits(), DEFAULT_PRECISION);
    }

    #[test]
    fn default_is_a_valid_precision() {
        assert_eq!(Precision::new(DEFAULT_PRECISION), Ok(Precision::default()));
        assert!(Precision::default().digits() >= MIN_PRECISION);
    }

    #[test]
    fn rounds_to_significant_digits() {
        let ctx = Precision::new(28).unwrap();
        let third = ctx.div(&BigDecimal::one(), &BigDecimal::from(3)).unwrap();
        assert_eq!(third.digits(), 28);
        let expected = BigDecimal::from_str("0.3333333333333333333333333333").unwrap();
        assert_eq!(third, expected);
    }

    #[test]
    fn division_by_zero_is_an_error() {
        let ctx = Precision::default();
        assert_eq!(ctx.recip(&BigDecimal::zero()), Err(DomainError::DivisionByZero));
    }

    #[test]
    fn float_boundary_uses_shortest_representation() {
        let d = decimal_from_f64(1.00001).unwrap();
        assert_eq!(d, BigDecimal::from_str("1.00001").unwrap());
        assert!(decimal_from_f64(f64::NAN).is_err());
        assert!(decimal_from_f64(f64::INFINITY).is_err());
    }

    #[test]
    fn sqrt_of_negative_is_rejected() {
        let ctx = Precision::default();
        assert!(ctx.sqrt(&BigDecimal::from(-4)).is_err());
        assert_eq!(ctx.sqrt(&BigDecimal::from(4)).unwrap(), BigDecimal::from(2));
    }
}
