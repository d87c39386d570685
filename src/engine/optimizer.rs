// Grid search for the most profitable JIT range
// =============================================
// 1) Run the trade without JIT liquidity to find how far the price travels.
//    A baseline that runs off the edge of the tick range only counts up to the
//    last bucket it actually traded in.
// 2) Every spacing-aligned (lower, upper) pair covering that path is a candidate.
// 3) For each candidate, the budget caps liquidity at `liquidity_from_budget`;
//    a 1-D maximizer picks the liquidity in [0, cap] with the highest utility.
//
// Candidates are independent and evaluated on the rayon pool.

use bigdecimal::BigDecimal;
use rayon::prelude::*;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::engine::search::Maximizer;
use crate::engine::swap::{SwapResult, SwapStatus};
use crate::engine::utility::Utility;
use crate::error::DomainError;
use crate::math::position::Position;
use crate::math::precision::decimal_to_f64;
use crate::math::tick_math::{rounded_tick, MAX_TICK, MIN_TICK};

/// Best liquidity found for one tick range.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RangeCandidate {
    pub lower_tick: i32,
    pub upper_tick: i32,
    pub max_liquidity: f64, // what the budget buys over this range
    pub liquidity: f64,     // argmax
    pub utility: f64,
    pub evaluations: usize,
}

/// Result of the optimizer.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OptimizeResult {
    pub start_tick: i32,
    pub baseline: SwapResult,
    pub candidates: Vec<RangeCandidate>,
    pub best: Option<RangeCandidate>,
}

/// Upper bound on grid boundaries; the grid holds `n * (n - 1) / 2` ranges.
pub const MAX_GRID_BOUNDARIES: u64 = 2_048;

/// Last tick the baseline traded in.
pub fn path_end(start_tick: i32, baseline: &SwapResult) -> i32 {
    let off_edge = baseline.final_tick == MIN_TICK || baseline.final_tick == MAX_TICK;
    if baseline.status == SwapStatus::Starved && off_edge {
        return baseline.steps.last().map_or(start_tick, |s| s.start_tick);
    }
    baseline.final_tick
}

/// Spacing-aligned `(lower, upper)` pairs spanning the ticks between `start_tick` and `end_tick`.
pub fn candidate_ranges(start_tick: i32, end_tick: i32, tick_spacing: i32) -> Result<Vec<(i32, i32)>, DomainError> {
    let first = rounded_tick(start_tick.min(end_tick), tick_spacing)?;
    let last = rounded_tick(start_tick.max(end_tick), tick_spacing)?.saturating_add(tick_spacing);

    let span = (i64::from(last.min(MAX_TICK)) - i64::from(first.max(MIN_TICK))).max(0);
    let count = (span / i64::from(tick_spacing) + 1) as u64;
    if count > MAX_GRID_BOUNDARIES {
        return Err(DomainError::CandidateGridTooLarge { boundaries: count, limit: MAX_GRID_BOUNDARIES });
    }

    let mut boundaries = Vec::new();
    let mut tick = first;
    while tick <= last && tick <= MAX_TICK {
        if tick >= MIN_TICK {
            boundaries.push(tick);
        }
        tick = tick.saturating_add(tick_spacing);
    }

    let mut ranges = Vec::with_capacity(boundaries.len() * boundaries.len().saturating_sub(1) / 2);
    for (i, &lower) in boundaries.iter().enumerate() {
        for &upper in &boundaries[i + 1..] {
            ranges.push((lower, upper));
        }
    }
    Ok(ranges)
}

// ------------------------------ Public entry ---------------------------------

pub fn optimize<M: Maximizer>(utility: &Utility, budget: &BigDecimal, maximizer: &M) -> Result<OptimizeResult, DomainError> {
    let engine = utility.engine();
    let baseline = engine.simulate_passive()?;
    let start_tick = engine.start_tick();
    let end_tick = path_end(start_tick, &baseline);
    let ranges = candidate_ranges(start_tick, end_tick, engine.tick_spacing())?;

    log::info!(
        "baseline moved tick {} -> {} ({:?}, grid ends at {}); searching {} ranges",
        start_tick,
        baseline.final_tick,
        baseline.status,
        end_tick,
        ranges.len()
    );

    let evaluated = ranges
        .par_iter()
        .map(|&(lower, upper)| evaluate_range(utility, budget, maximizer, lower, upper))
        .collect::<Result<Vec<_>, DomainError>>()?;
    let candidates: Vec<RangeCandidate> = evaluated.into_iter().flatten().collect();

    let best = candidates
        .iter()
        .max_by(|a, b| a.utility.total_cmp(&b.utility))
        .cloned();
    if let Some(b) = &best {
        log::info!("best range [{}, {}) L={} utility={}", b.lower_tick, b.upper_tick, b.liquidity, b.utility);
    } else {
        log::warn!("no candidate range could be funded from the budget");
    }

    Ok(OptimizeResult { start_tick, baseline, candidates, best })
}

// ------------------------------ Core maximize --------------------------------

fn evaluate_range<M: Maximizer>(
    utility: &Utility,
    budget: &BigDecimal,
    maximizer: &M,
    lower: i32,
    upper: i32,
) -> Result<Option<RangeCandidate>, DomainError> {
    let engine = utility.engine();
    let request = engine.request();
    let (price0, price1) = utility.prices();

    let range = Position::new(lower, upper, BigDecimal::default())?;
    let cap = match range.liquidity_from_budget(
        engine.tick_math(),
        budget,
        &request.start_sqrt_price,
        price0,
        price1,
        request.decimals0,
        request.decimals1,
    ) {
        Ok(cap) => decimal_to_f64(&cap),
        Err(DomainError::DivisionByZero) => {
            log::debug!("range [{}, {}) holds only a worthless token, skipping", lower, upper);
            return Ok(None);
        }
        Err(e) => return Err(e),
    };
    if !cap.is_finite() || cap <= 0.0 {
        log::debug!("range [{}, {}) has no usable capacity ({}), skipping", lower, upper, cap);
        return Ok(None);
    }

    let max = maximizer.maximize(|liquidity| utility.of_liquidity(lower, upper, liquidity), 0.0, cap)?;
    log::debug!(
        "range [{}, {}) cap={} L*={} utility={} ({} evaluations)",
        lower,
        upper,
        cap,
        max.argmax,
        max.value,
        max.evaluations
    );

    Ok(Some(RangeCandidate {
        lower_tick: lower,
        upper_tick: upper,
        max_liquidity: cap,
        liquidity: max.argmax,
        utility: max.value,
        evaluations: max.evaluations,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::search::FibonacciSearch;
    use crate::engine::swap::{SwapDirection, SwapEngine, SwapRequest};
    use crate::math::liquidity::LiquidityProfile;
    use crate::math::precision::Precision;
    use crate::math::tick_math::TickMath;

    fn utility(amount: f64, direction: SwapDirection, passive: &[(i32, f64)]) -> Utility {
        let request = SwapRequest::from_f64(amount, direction, 1.0, 0.003, 18, 18).unwrap();
        let profile = LiquidityProfile::from_f64_entries(10, passive).unwrap();
        let engine = SwapEngine::new(request, profile, TickMath::new(Precision::default()).unwrap()).unwrap();
        Utility::new(engine, BigDecimal::from(1), BigDecimal::from(1)).unwrap()
    }

    #[test]
    fn candidate_grid_covers_the_price_path() {
        let ranges = candidate_ranges(5, 45, 20).unwrap();
        // boundaries 0, 20, 40, 60
        assert_eq!(ranges.len(), 6);
        assert_eq!(ranges.first(), Some(&(0, 20)));
        assert_eq!(ranges.last(), Some(&(40, 60)));
        assert!(ranges.iter().all(|(l, u)| l < u));
    }

    #[test]
    fn candidate_grid_is_direction_agnostic() {
        assert_eq!(candidate_ranges(45, 5, 20).unwrap(), candidate_ranges(5, 45, 20).unwrap());
        assert_eq!(candidate_ranges(-1, -1, 10).unwrap(), vec![(-10, 0)]);
    }

    #[test]
    fn candidate_grid_stops_at_the_tick_range() {
        let ranges = candidate_ranges(MAX_TICK - 3, MAX_TICK, 10).unwrap();
        assert!(ranges.iter().all(|&(_, u)| u <= MAX_TICK));
        let ranges = candidate_ranges(MIN_TICK, MIN_TICK + 5, 10).unwrap();
        assert!(ranges.iter().all(|&(l, _)| l >= MIN_TICK));
        assert!(!ranges.is_empty());
    }

    #[test]
    fn oversized_grid_is_rejected_before_allocating() {
        assert!(matches!(
            candidate_ranges(0, MAX_TICK, 10),
            Err(DomainError::CandidateGridTooLarge { limit: MAX_GRID_BOUNDARIES, .. })
        ));
        assert!(candidate_ranges(0, 10 * (MAX_GRID_BOUNDARIES as i32 - 2), 10).is_ok());
    }

    #[test]
    fn baseline_running_off_the_edge_keeps_the_grid_small() {
        let u = utility(1e8, SwapDirection::OneForZero, &[(0, 1e-12)]);
        let baseline = u.engine().simulate_passive().unwrap();
        assert_eq!(baseline.status, SwapStatus::Starved);
        assert_eq!(baseline.final_tick, MAX_TICK);
        assert_eq!(path_end(0, &baseline), 0);

        let result = optimize(&u, &BigDecimal::from(1000), &FibonacciSearch::new(8)).unwrap();
        assert!(result.candidates.len() <= 1);
        assert!(result.candidates.iter().all(|c| (c.lower_tick, c.upper_tick) == (0, 10)));
    }

    #[test]
    fn path_end_follows_an_ordinary_baseline() {
        let u = utility(10.0, SwapDirection::OneForZero, &[(0, 1000.0), (10, 1000.0)]);
        let baseline = u.engine().simulate_passive().unwrap();
        assert_eq!(path_end(0, &baseline), baseline.final_tick);
    }
}
