use bigdecimal::BigDecimal;
use num_traits::Zero;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::engine::swap::{SwapDirection, SwapEngine, SwapResult};
use crate::error::DomainError;
use crate::math::position::Position;
use crate::math::precision::{decimal_from_f64, decimal_to_f64};

/// Monetary outcome of holding one JIT position through the trade.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct UtilityBreakdown {
    pub initial_value: BigDecimal, // position value at the start price
    pub final_value: BigDecimal,   // position value at the final price
    pub price_impact: BigDecimal,  // final_value - initial_value
    pub fee_revenue: BigDecimal,   // jit fees valued in the input token's price
    pub utility: BigDecimal,
    pub swap: SwapResult,
}

/// Prices positions against one fixed trade.
#[derive(Clone, Debug)]
pub struct Utility {
    engine: SwapEngine,
    price0: BigDecimal,
    price1: BigDecimal,
}

impl Utility {
    pub fn new(engine: SwapEngine, price0: BigDecimal, price1: BigDecimal) -> Result<Self, DomainError> {
        for (what, price) in [("token0 price", &price0), ("token1 price", &price1)] {
            if *price < BigDecimal::zero() {
                return Err(DomainError::NegativeAmount { what, value: price.to_string() });
            }
        }
        Ok(Self { engine, price0, price1 })
    }

    #[inline]
    pub fn engine(&self) -> &SwapEngine {
        &self.engine
    }

    #[inline]
    pub fn prices(&self) -> (&BigDecimal, &BigDecimal) {
        (&self.price0, &self.price1)
    }

    pub fn evaluate(&self, position: &Position) -> Result<UtilityBreakdown, DomainError> {
        let engine = &self.engine;
        let request = engine.request();
        let tick_math = engine.tick_math();
        let ctx = tick_math.precision();
        let (d0, d1) = (request.decimals0, request.decimals1);

        let initial_value =
            position.value(tick_math, &request.start_sqrt_price, &self.price0, &self.price1, d0, d1)?;
        let swap = engine.simulate(position)?;
        let final_value = position.value(tick_math, &swap.final_sqrt_price, &self.price0, &self.price1, d0, d1)?;

        let price_impact = ctx.sub(&final_value, &initial_value);
        let fee_price = match request.direction {
            SwapDirection::ZeroForOne => &self.price0,
            SwapDirection::OneForZero => &self.price1,
        };
        let fee_revenue = ctx.mul(&swap.fees_jit, fee_price);
        let utility = ctx.add(&price_impact, &fee_revenue);

        Ok(UtilityBreakdown { initial_value, final_value, price_impact, fee_revenue, utility, swap })
    }

    /// Scalar utility of `liquidity` over `[lower_tick, upper_tick)`, for the 1-D searchers.
    pub fn of_liquidity(&self, lower_tick: i32, upper_tick: i32, liquidity: f64) -> Result<f64, DomainError> {
        let liquidity = decimal_from_f64(liquidity.max(0.0))?;
        let position = Position::new(lower_tick, upper_tick, liquidity)?;
        Ok(decimal_to_f64(&self.evaluate(&position)?.utility))
    }
}
