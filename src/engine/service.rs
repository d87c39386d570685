use anyhow::Context;
use chrono::Utc;

use crate::config::{Config, SearchMethod};
use crate::engine::optimizer::{optimize, OptimizeResult};
use crate::engine::search::{AdaptiveRandomSearch, FibonacciSearch, GoldenSectionSearch, RandomSearch, TernarySearch};
use crate::engine::swap::{SwapEngine, SwapRequest};
use crate::engine::utility::Utility;
use crate::error::DomainError;
use crate::math::liquidity::LiquidityProfile;
use crate::math::position::Position;
use crate::math::precision::{decimal_from_f64, Precision};
use crate::math::tick_math::TickMath;
use crate::models::{BestRange, SimulationReport};

/// Assemble the trade, the passive pool and the valuation prices from `config`.
pub fn build_utility(config: &Config) -> Result<Utility, DomainError> {
    let tick_math = TickMath::new(Precision::new(config.precision)?)?;
    let passive = LiquidityProfile::from_f64_entries(config.tick_spacing, &config.passive_liquidity)?;
    let request = SwapRequest::from_f64(
        config.amount_in,
        config.direction,
        config.start_sqrt_price,
        config.fee_rate,
        config.decimals0,
        config.decimals1,
    )?;
    let engine = SwapEngine::new(request, passive, tick_math)?;
    Utility::new(engine, decimal_from_f64(config.price0)?, decimal_from_f64(config.price1)?)
}

pub fn run_scenario(config: &Config) -> anyhow::Result<SimulationReport> {
    let utility = build_utility(config).context("invalid scenario")?;
    let budget = decimal_from_f64(config.budget).context("invalid budget")?;

    log::info!(
        "simulating {} {:?} from sqrt price {} with {} passive ticks, {:?} search",
        config.amount_in,
        config.direction,
        config.start_sqrt_price,
        config.passive_liquidity.len(),
        config.search_method
    );

    let result: OptimizeResult = match config.search_method {
        SearchMethod::Ternary => optimize(&utility, &budget, &TernarySearch { epsilon: config.epsilon }),
        SearchMethod::GoldenSection => optimize(&utility, &budget, &GoldenSectionSearch { epsilon: config.epsilon }),
        SearchMethod::Fibonacci => optimize(&utility, &budget, &FibonacciSearch::new(config.fibonacci_steps)),
        SearchMethod::Random => optimize(&utility, &budget, &RandomSearch { samples: config.samples, seed: config.seed }),
        SearchMethod::AdaptiveRandom => {
            let search = AdaptiveRandomSearch {
                samples: config.samples,
                shrink_factor: config.shrink_factor,
                seed: config.seed,
            };
            optimize(&utility, &budget, &search)
        }
    }
    .context("optimizer failed")?;

    let best = match &result.best {
        Some(candidate) => {
            let liquidity = decimal_from_f64(candidate.liquidity)?;
            let position = Position::new(candidate.lower_tick, candidate.upper_tick, liquidity)?;
            let breakdown = utility.evaluate(&position).context("re-evaluating the best range")?;
            Some(BestRange { candidate: candidate.clone(), breakdown })
        }
        None => None,
    };

    Ok(SimulationReport {
        timestamp_utc: Utc::now(),
        request: utility.engine().request().clone(),
        tick_spacing: config.tick_spacing,
        precision_digits: config.precision,
        search_method: config.search_method,
        start_tick: result.start_tick,
        baseline: result.baseline,
        best,
        candidates: result.candidates,
    })
}
