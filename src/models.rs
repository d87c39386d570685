use chrono::{DateTime, Utc};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::config::SearchMethod;
use crate::engine::optimizer::RangeCandidate;
use crate::engine::swap::{SwapRequest, SwapResult};
use crate::engine::utility::UtilityBreakdown;

#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SimulationReport {
    pub timestamp_utc: DateTime<Utc>,
    pub request: SwapRequest,
    pub tick_spacing: i32,
    pub precision_digits: u64,
    pub search_method: SearchMethod,
    pub start_tick: i32,
    pub baseline: SwapResult,
    pub best: Option<BestRange>,
    pub candidates: Vec<RangeCandidate>,
}

/// Winning range re-evaluated at its optimal liquidity.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BestRange {
    pub candidate: RangeCandidate,
    pub breakdown: UtilityBreakdown,
}
