// Single concentrated-liquidity range and its token / value math.
//
// For a range [sa, sb] (sqrt prices of the lower and upper tick) and current sqrt price p:
//   p <= sa      : amount0 = L * (1/sa - 1/sb), amount1 = 0
//   p >= sb      : amount0 = 0,                 amount1 = L * (sb - sa)
//   sa < p < sb  : amount0 = L * (1/p - 1/sb),  amount1 = L * (p - sa)

use bigdecimal::BigDecimal;
use num_traits::Zero;

use crate::error::DomainError;
use crate::math::liquidity::LiquidityProfile;
use crate::math::tick_math::{check_tick, check_tick_spacing, TickMath};

#[derive(Clone, Debug, PartialEq)]
pub struct Position {
    lower_tick: i32,
    upper_tick: i32,
    liquidity: BigDecimal,
}

impl Position {
    pub fn new(lower_tick: i32, upper_tick: i32, liquidity: BigDecimal) -> Result<Self, DomainError> {
        check_tick(lower_tick)?;
        check_tick(upper_tick)?;
        if lower_tick >= upper_tick {
            return Err(DomainError::InvalidTickOrder { lower: lower_tick, upper: upper_tick });
        }
        if liquidity < BigDecimal::zero() {
            return Err(DomainError::NegativeAmount { what: "liquidity", value: liquidity.to_string() });
        }
        Ok(Self { lower_tick, upper_tick, liquidity })
    }

    /// Same range with a different amount of liquidity.
    pub fn with_liquidity(&self, liquidity: BigDecimal) -> Result<Self, DomainError> {
        Self::new(self.lower_tick, self.upper_tick, liquidity)
    }

    #[inline]
    pub fn lower_tick(&self) -> i32 { self.lower_tick }

    #[inline]
    pub fn upper_tick(&self) -> i32 { self.upper_tick }

    #[inline]
    pub fn liquidity(&self) -> &BigDecimal { &self.liquidity }

    /// Token amounts (amount0, amount1) held by this position at `current_sqrt_price`.
    pub fn tokens(
        &self,
        tick_math: &TickMath,
        current_sqrt_price: &BigDecimal,
        dec0: u8,
        dec1: u8,
    ) -> Result<(BigDecimal, BigDecimal), DomainError> {
        ensure_positive("current sqrt price", current_sqrt_price)?;
        let ctx = tick_math.precision();
        let sa = tick_math.sqrt_price_from_tick(self.lower_tick, dec0, dec1)?;
        let sb = tick_math.sqrt_price_from_tick(self.upper_tick, dec0, dec1)?;
        let l = &self.liquidity;

        let amounts = if *current_sqrt_price <= sa {
            let width = ctx.sub(&ctx.recip(&sa)?, &ctx.recip(&sb)?);
            (ctx.mul(l, &width), BigDecimal::zero())
        } else if *current_sqrt_price >= sb {
            (BigDecimal::zero(), ctx.mul(l, &ctx.sub(&sb, &sa)))
        } else {
            let inv_gap = ctx.sub(&ctx.recip(current_sqrt_price)?, &ctx.recip(&sb)?);
            (ctx.mul(l, &inv_gap), ctx.mul(l, &ctx.sub(current_sqrt_price, &sa)))
        };
        Ok(amounts)
    }

    /// Monetary value `amount0 * price0 + amount1 * price1` at `current_sqrt_price`.
    pub fn value(
        &self,
        tick_math: &TickMath,
        current_sqrt_price: &BigDecimal,
        price0: &BigDecimal,
        price1: &BigDecimal,
        dec0: u8,
        dec1: u8,
    ) -> Result<BigDecimal, DomainError> {
        ensure_non_negative("token0 price", price0)?;
        ensure_non_negative("token1 price", price1)?;
        let ctx = tick_math.precision();
        let (amount0, amount1) = self.tokens(tick_math, current_sqrt_price, dec0, dec1)?;
        Ok(ctx.add(&ctx.mul(&amount0, price0), &ctx.mul(&amount1, price1)))
    }

    /// Liquidity this range can hold when `budget` is spent at `current_sqrt_price`.
    ///
    /// Inverts [`Position::value`] per unit of liquidity; the position's own
    /// liquidity is ignored.
    #[allow(clippy::too_many_arguments)]
    pub fn liquidity_from_budget(
        &self,
        tick_math: &TickMath,
        budget: &BigDecimal,
        current_sqrt_price: &BigDecimal,
        price0: &BigDecimal,
        price1: &BigDecimal,
        dec0: u8,
        dec1: u8,
    ) -> Result<BigDecimal, DomainError> {
        ensure_non_negative("budget", budget)?;
        let unit = self.with_liquidity(BigDecimal::from(1))?;
        let value_per_unit = unit.value(tick_math, current_sqrt_price, price0, price1, dec0, dec1)?;
        tick_math.precision().div(budget, &value_per_unit)
    }

    /// Flat-density expansion: the full liquidity at every spacing bucket in
    /// `[lower_tick, upper_tick)`. Zero liquidity yields an empty profile.
    pub fn to_liquidity_profile(&self, tick_spacing: i32) -> Result<LiquidityProfile, DomainError> {
        check_tick_spacing(tick_spacing)?;
        for tick in [self.lower_tick, self.upper_tick] {
            if tick % tick_spacing != 0 {
                return Err(DomainError::UnalignedTick { tick, spacing: tick_spacing });
            }
        }

        let mut profile = LiquidityProfile::new(tick_spacing)?;
        if self.liquidity.is_zero() {
            return Ok(profile);
        }
        let mut tick = self.lower_tick;
        while tick < self.upper_tick {
            profile.insert(tick, self.liquidity.clone())?;
            tick += tick_spacing;
        }
        Ok(profile)
    }
}

fn ensure_positive(what: &'static str, value: &BigDecimal) -> Result<(), DomainError> {
    if *value > BigDecimal::zero() {
        Ok(())
    } else {
        Err(DomainError::NonPositivePrice { what, value: value.to_string() })
    }
}

fn ensure_non_negative(what: &'static str, value: &BigDecimal) -> Result<(), DomainError> {
    if *value < BigDecimal::zero() {
        Err(DomainError::NegativeAmount { what, value: value.to_string() })
    } else {
        Ok(())
    }
}
