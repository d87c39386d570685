// Exact-input swap simulator over a merged passive + JIT liquidity profile
// ------------------------------------------------------------------------
// Each step works inside one liquidity bucket:
//   zeroForOne (price falls) : in = L * (1/Pt - 1/Pc),  out = L * (Pc - Pf)
//   oneForZero (price rises) : in = L * (Pt - Pc),      out = L * (1/Pc - 1/Pf)
// The fee is charged on top of the input actually used and split between the
// passive side and the JIT side by their share of the bucket's liquidity.
//
// Notes:
// - The boundary is the nearest initialized tick strictly beyond the current
//   tick in the trade direction. With no boundary left the target is the price
//   at MIN_TICK / MAX_TICK, and reaching it ends the trade as Starved.
// - After a crossing the tick becomes `boundary - 1` going down and `boundary`
//   going up. Both land in the bucket just past the boundary, so the next step
//   reads that bucket's liquidity and never hits the same boundary twice.

use bigdecimal::BigDecimal;
use num_traits::{One, Zero};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::math::liquidity::{LiquidityProfile, MergedLiquidity};
use crate::math::position::Position;
use crate::math::precision::{decimal_from_f64, Precision};
use crate::math::tick_math::{TickMath, MAX_TICK, MIN_TICK};

// ------------------------------- Data types ----------------------------------

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(rename_all = "snake_case"))]
pub enum SwapDirection {
    ZeroForOne,
    OneForZero,
}

impl SwapDirection {
    #[inline]
    pub fn is_zero_for_one(self) -> bool {
        matches!(self, SwapDirection::ZeroForOne)
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SwapRequest {
    pub amount_in: BigDecimal, // exact input, fee included
    pub direction: SwapDirection,
    pub start_sqrt_price: BigDecimal,
    pub fee_rate: BigDecimal, // e.g. 0.003
    pub decimals0: u8,
    pub decimals1: u8,
}

impl SwapRequest {
    pub fn new(
        amount_in: BigDecimal,
        direction: SwapDirection,
        start_sqrt_price: BigDecimal,
        fee_rate: BigDecimal,
        decimals0: u8,
        decimals1: u8,
    ) -> Result<Self, DomainError> {
        let request = Self { amount_in, direction, start_sqrt_price, fee_rate, decimals0, decimals1 };
        request.validate()?;
        Ok(request)
    }

    /// Build from float inputs; each value is converted once into the decimal core.
    pub fn from_f64(
        amount_in: f64,
        direction: SwapDirection,
        start_sqrt_price: f64,
        fee_rate: f64,
        decimals0: u8,
        decimals1: u8,
    ) -> Result<Self, DomainError> {
        Self::new(
            decimal_from_f64(amount_in)?,
            direction,
            decimal_from_f64(start_sqrt_price)?,
            decimal_from_f64(fee_rate)?,
            decimals0,
            decimals1,
        )
    }

    /// Trade given as `(amount0, amount1)`; a positive `amount0` sells token0.
    /// Both zero is the no-trade request.
    pub fn from_amounts(
        amount0: BigDecimal,
        amount1: BigDecimal,
        start_sqrt_price: BigDecimal,
        fee_rate: BigDecimal,
        decimals0: u8,
        decimals1: u8,
    ) -> Result<Self, DomainError> {
        let zero = BigDecimal::zero();
        for (what, amount) in [("amount0", &amount0), ("amount1", &amount1)] {
            if *amount < zero {
                return Err(DomainError::NegativeAmount { what, value: amount.to_string() });
            }
        }
        let (amount_in, direction) = match (amount0 > zero, amount1 > zero) {
            (true, true) => {
                return Err(DomainError::InvalidTradeAmounts {
                    amount0: amount0.to_string(),
                    amount1: amount1.to_string(),
                })
            }
            (true, false) => (amount0, SwapDirection::ZeroForOne),
            (false, true) => (amount1, SwapDirection::OneForZero),
            (false, false) => (zero, SwapDirection::OneForZero),
        };
        Self::new(amount_in, direction, start_sqrt_price, fee_rate, decimals0, decimals1)
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.amount_in < BigDecimal::zero() {
            return Err(DomainError::NegativeAmount { what: "amount in", value: self.amount_in.to_string() });
        }
        if self.start_sqrt_price <= BigDecimal::zero() {
            return Err(DomainError::NonPositivePrice {
                what: "start sqrt price",
                value: self.start_sqrt_price.to_string(),
            });
        }
        if self.fee_rate < BigDecimal::zero() || self.fee_rate >= BigDecimal::one() {
            return Err(DomainError::InvalidFeeRate(self.fee_rate.to_string()));
        }
        Ok(())
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(rename_all = "snake_case"))]
pub enum SwapStatus {
    /// All input consumed.
    Exhausted,
    /// Ran out of active liquidity, or hit the edge of the tick range, with input left.
    Starved,
}

/// One bucket's worth of execution.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SwapStep {
    pub start_tick: i32,
    pub end_tick: i32,
    pub start_sqrt_price: BigDecimal,
    pub end_sqrt_price: BigDecimal,
    pub liquidity_passive: BigDecimal,
    pub liquidity_jit: BigDecimal,
    pub amount_in: BigDecimal, // net of fee
    pub amount_out: BigDecimal,
    pub fee: BigDecimal,
    pub crossed: bool,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SwapResult {
    pub status: SwapStatus,
    pub final_sqrt_price: BigDecimal,
    pub final_tick: i32,
    pub output_amount: BigDecimal,
    pub fees_passive: BigDecimal,
    pub fees_jit: BigDecimal,
    pub remaining_input: BigDecimal,
    pub steps: Vec<SwapStep>,
}

impl SwapResult {
    #[inline]
    pub fn is_filled(&self) -> bool {
        self.status == SwapStatus::Exhausted
    }

    pub fn total_fees(&self) -> BigDecimal {
        &self.fees_passive + &self.fees_jit
    }

    pub fn ticks_crossed(&self) -> usize {
        self.steps.iter().filter(|s| s.crossed).count()
    }
}

// ------------------------------- Swap math step -------------------------------

struct StepOutcome {
    sqrt_price: BigDecimal,
    amount_in: BigDecimal,
    amount_out: BigDecimal,
    fee: BigDecimal,
    remaining: BigDecimal,
    exhausted: bool,
}

fn compute_swap_step(
    ctx: &Precision,
    direction: SwapDirection,
    fee_rate: &BigDecimal,
    sqrt_price: &BigDecimal,
    sqrt_target: &BigDecimal,
    liquidity: &BigDecimal,
    remaining: &BigDecimal,
) -> Result<StepOutcome, DomainError> {
    let zero_for_one = direction.is_zero_for_one();
    let one_plus_fee = ctx.add(&BigDecimal::one(), fee_rate);

    // input left once the fee on it is set aside
    let gross_in = ctx.div(remaining, &one_plus_fee)?;

    // input the bucket absorbs before the price reaches the target
    let available_in = if zero_for_one {
        ctx.mul(liquidity, &ctx.sub(&ctx.recip(sqrt_target)?, &ctx.recip(sqrt_price)?).abs())
    } else {
        ctx.mul(liquidity, &ctx.sub(sqrt_target, sqrt_price).abs())
    };

    let (next_price, amount_in, fee, left, exhausted) = if available_in > gross_in {
        let next_price = if zero_for_one {
            let inv = ctx.add(&ctx.recip(sqrt_price)?, &ctx.div(&gross_in, liquidity)?);
            ctx.recip(&inv)?
        } else {
            ctx.add(sqrt_price, &ctx.div(&gross_in, liquidity)?)
        };
        let fee = ctx.sub(remaining, &gross_in);
        (next_price, gross_in, fee, BigDecimal::zero(), true)
    } else {
        let fee = ctx.mul(&available_in, fee_rate);
        let left = ctx.sub(remaining, &ctx.mul(&available_in, &one_plus_fee));
        let left = if left < BigDecimal::zero() { BigDecimal::zero() } else { left };
        (sqrt_target.clone(), available_in, fee, left, false)
    };

    let amount_out = if zero_for_one {
        ctx.mul(liquidity, &ctx.sub(sqrt_price, &next_price).abs())
    } else {
        ctx.mul(liquidity, &ctx.sub(&ctx.recip(sqrt_price)?, &ctx.recip(&next_price)?).abs())
    };

    Ok(StepOutcome { sqrt_price: next_price, amount_in, amount_out, fee, remaining: left, exhausted })
}

// -------------------------------- Simulator ---------------------------------

/// Swap simulator bound to one trade and one passive liquidity profile.
///
/// Holds no mutable state: every [`SwapEngine::simulate`] call walks the trade
/// from the same starting point, so one engine can be shared across threads.
#[derive(Clone, Debug)]
pub struct SwapEngine {
    request: SwapRequest,
    passive: LiquidityProfile,
    no_jit: LiquidityProfile,
    tick_math: TickMath,
    start_tick: i32,
    lower_bound: BigDecimal,
    upper_bound: BigDecimal,
}

impl SwapEngine {
    pub fn new(request: SwapRequest, passive: LiquidityProfile, tick_math: TickMath) -> Result<Self, DomainError> {
        request.validate()?;
        let (d0, d1) = (request.decimals0, request.decimals1);
        let start_tick = tick_math.tick_from_sqrt_price(&request.start_sqrt_price, d0, d1)?;
        let lower_bound = tick_math.sqrt_price_from_tick(MIN_TICK, d0, d1)?;
        let upper_bound = tick_math.sqrt_price_from_tick(MAX_TICK, d0, d1)?;
        let no_jit = LiquidityProfile::new(passive.tick_spacing())?;
        Ok(Self { request, passive, no_jit, tick_math, start_tick, lower_bound, upper_bound })
    }

    #[inline]
    pub fn request(&self) -> &SwapRequest {
        &self.request
    }

    #[inline]
    pub fn passive(&self) -> &LiquidityProfile {
        &self.passive
    }

    #[inline]
    pub fn tick_math(&self) -> &TickMath {
        &self.tick_math
    }

    #[inline]
    pub fn tick_spacing(&self) -> i32 {
        self.passive.tick_spacing()
    }

    #[inline]
    pub fn start_tick(&self) -> i32 {
        self.start_tick
    }

    /// Run the trade with `position` added on top of the passive liquidity.
    pub fn simulate(&self, position: &Position) -> Result<SwapResult, DomainError> {
        let jit = position.to_liquidity_profile(self.tick_spacing())?;
        self.run(&jit)
    }

    /// Run the trade against passive liquidity alone.
    pub fn simulate_passive(&self) -> Result<SwapResult, DomainError> {
        self.run(&self.no_jit)
    }

    fn run(&self, jit: &LiquidityProfile) -> Result<SwapResult, DomainError> {
        let merged = MergedLiquidity::new(&self.passive, jit)?;
        let ctx = *self.tick_math.precision();
        let req = &self.request;
        let direction = req.direction;

        let mut sqrt_price = req.start_sqrt_price.clone();
        let mut current_tick = self.start_tick;
        let mut remaining = req.amount_in.clone();

        let mut output = BigDecimal::zero();
        let mut fees_passive = BigDecimal::zero();
        let mut fees_jit = BigDecimal::zero();
        let mut steps: Vec<SwapStep> = Vec::new();

        let status = loop {
            if remaining.is_zero() {
                break SwapStatus::Exhausted;
            }

            let active = merged.active_at(current_tick, &ctx)?;
            if active.total.is_zero() {
                log::debug!("no active liquidity at tick {} (bucket {}), stopping", current_tick, active.bucket);
                break SwapStatus::Starved;
            }

            let boundary = match direction {
                SwapDirection::ZeroForOne => merged.prev_below(current_tick),
                SwapDirection::OneForZero => merged.next_above(current_tick),
            };
            let sqrt_target = match (boundary, direction) {
                (Some(t), _) => self.tick_math.sqrt_price_from_tick(t, req.decimals0, req.decimals1)?,
                (None, SwapDirection::ZeroForOne) => self.lower_bound.clone(),
                (None, SwapDirection::OneForZero) => self.upper_bound.clone(),
            };

            let step = compute_swap_step(
                &ctx,
                direction,
                &req.fee_rate,
                &sqrt_price,
                &sqrt_target,
                &active.total,
                &remaining,
            )?;

            let at_edge = boundary.map_or(true, |t| t == MIN_TICK || t == MAX_TICK);
            let next_tick = if step.exhausted {
                self.tick_math.tick_from_sqrt_price(&step.sqrt_price, req.decimals0, req.decimals1)?
            } else {
                match (boundary, direction) {
                    (Some(t), SwapDirection::ZeroForOne) if !at_edge => t - 1,
                    (Some(t), SwapDirection::OneForZero) if !at_edge => t,
                    (_, SwapDirection::ZeroForOne) => MIN_TICK,
                    (_, SwapDirection::OneForZero) => MAX_TICK,
                }
            };

            output = ctx.add(&output, &step.amount_out);
            fees_passive = ctx.add(&fees_passive, &ctx.mul(&ctx.div(&active.passive, &active.total)?, &step.fee));
            fees_jit = ctx.add(&fees_jit, &ctx.mul(&ctx.div(&active.jit, &active.total)?, &step.fee));

            log::debug!(
                "step {}: tick {} -> {} sqrt price {} -> {} L={} (passive {}, jit {}) in={} out={} fee={} crossed={}",
                steps.len(),
                current_tick,
                next_tick,
                sqrt_price,
                step.sqrt_price,
                active.total,
                active.passive,
                active.jit,
                step.amount_in,
                step.amount_out,
                step.fee,
                !step.exhausted
            );

            steps.push(SwapStep {
                start_tick: current_tick,
                end_tick: next_tick,
                start_sqrt_price: sqrt_price,
                end_sqrt_price: step.sqrt_price.clone(),
                liquidity_passive: active.passive,
                liquidity_jit: active.jit,
                amount_in: step.amount_in,
                amount_out: step.amount_out,
                fee: step.fee,
                crossed: !step.exhausted,
            });

            sqrt_price = step.sqrt_price;
            current_tick = next_tick;
            remaining = step.remaining;

            if !step.exhausted && at_edge && !remaining.is_zero() {
                log::debug!("reached the edge of the tick range at tick {}", current_tick);
                break SwapStatus::Starved;
            }
        };

        Ok(SwapResult {
            status,
            final_sqrt_price: sqrt_price,
            final_tick: current_tick,
            output_amount: output,
            fees_passive,
            fees_jit,
            remaining_input: remaining,
            steps,
        })
    }
}

// ------------------------------- Minimal tests -------------------------------
