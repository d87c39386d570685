// Tick <-> sqrt price conversion in decimal space
// ----------------------------------------------
//   sqrt(P) = 1.0001^(tick/2) / 10^((dec1 - dec0)/2)
// where P is the price of token1 in terms of token0.
//
// Notes:
// - 1.0001^(tick/2) is evaluated as sqrt(1.0001)^|tick| by square-and-multiply in
//   working precision (context digits + guard digits), then rounded once to the
//   context precision. The result is a pure function of (tick, dec0, dec1, digits),
//   which is what makes the binary-search inverse round-trip exactly.
// - Segments are right-open [tick, tick + spacing); the inverse always floors.

use bigdecimal::BigDecimal;
use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{One, Zero};

use crate::error::DomainError;
use crate::math::precision::Precision;

pub const MIN_TICK: i32 = -887_272;
pub const MAX_TICK: i32 = 887_272;

const GUARD_DIGITS: u64 = 12;

#[inline]
pub fn check_tick(tick: i32) -> Result<(), DomainError> {
    if (MIN_TICK..=MAX_TICK).contains(&tick) {
        Ok(())
    } else {
        Err(DomainError::TickOutOfRange(tick))
    }
}

#[inline]
pub fn check_tick_spacing(spacing: i32) -> Result<(), DomainError> {
    if spacing > 0 { Ok(()) } else { Err(DomainError::InvalidTickSpacing(spacing)) }
}

/// Floor `tick` to the nearest multiple of `spacing` at or below it.
pub fn rounded_tick(tick: i32, spacing: i32) -> Result<i32, DomainError> {
    check_tick_spacing(spacing)?;
    Ok(tick.div_floor(&spacing) * spacing)
}

/// Token decimals coming from configuration arrive as plain integers.
pub fn decimals_from_i64(decimals: i64) -> Result<u8, DomainError> {
    u8::try_from(decimals).map_err(|_| DomainError::InvalidDecimals(decimals))
}

#[derive(Clone, Debug)]
pub struct TickMath {
    precision: Precision,
    working: Precision,
    sqrt_base: BigDecimal, // sqrt(1.0001)
    sqrt_ten: BigDecimal,
}

impl TickMath {
    pub fn new(precision: Precision) -> Result<Self, DomainError> {
        let working = precision.widen(GUARD_DIGITS);
        let base = BigDecimal::new(BigInt::from(10_001), 4);
        let sqrt_base = working.sqrt(&base)?;
        let sqrt_ten = working.sqrt(&BigDecimal::from(10))?;
        Ok(Self { precision, working, sqrt_base, sqrt_ten })
    }

    #[inline]
    pub fn precision(&self) -> &Precision {
        &self.precision
    }

    /// Exact (to context precision) sqrt price at `tick` for the given token decimals.
    pub fn sqrt_price_from_tick(&self, tick: i32, dec0: u8, dec1: u8) -> Result<BigDecimal, DomainError> {
        check_tick(tick)?;

        let ratio = self.pow_sqrt_base(tick.unsigned_abs());
        let ratio = if tick < 0 { self.working.recip(&ratio)? } else { ratio };

        // divide by 10^(shift/2): exact power of ten, plus one sqrt(10) when shift is odd
        let shift = i64::from(dec1) - i64::from(dec0);
        let half = shift.div_floor(&2);
        let scaled = &ratio * &BigDecimal::new(BigInt::one(), half);
        let scaled = if shift.is_odd() { self.working.div(&scaled, &self.sqrt_ten)? } else { scaled };

        Ok(self.precision.round(scaled))
    }

    /// Largest tick whose sqrt price is `<= sqrt_price`.
    pub fn tick_from_sqrt_price(&self, sqrt_price: &BigDecimal, dec0: u8, dec1: u8) -> Result<i32, DomainError> {
        if *sqrt_price <= BigDecimal::zero() {
            return Err(DomainError::NonPositivePrice { what: "sqrt price", value: sqrt_price.to_string() });
        }
        if self.sqrt_price_from_tick(MIN_TICK, dec0, dec1)? > *sqrt_price {
            return Err(DomainError::PriceBelowRange(sqrt_price.to_string()));
        }

        let mut lo = MIN_TICK;
        let mut hi = MAX_TICK;
        while lo < hi {
            let mid = lo + (hi - lo + 1) / 2;
            if self.sqrt_price_from_tick(mid, dec0, dec1)? <= *sqrt_price { lo = mid; } else { hi = mid - 1; }
        }
        Ok(lo)
    }

    fn pow_sqrt_base(&self, mut exponent: u32) -> BigDecimal {
        let mut result = BigDecimal::one();
        let mut base = self.sqrt_base.clone();
        while exponent > 0 {
            if exponent & 1 == 1 {
                result = self.working.mul(&result, &base);
            }
            exponent >>= 1;
            if exponent > 0 {
                base = self.working.mul(&base, &base);
            }
        }
        result
    }
}
