use std::env;
use std::fmt::Display;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::engine::search::DEFAULT_SHRINK_FACTOR;
use crate::engine::swap::SwapDirection;
use crate::error::DomainError;
use crate::math::precision::{Precision, DEFAULT_PRECISION};
use crate::math::tick_math::{check_tick_spacing, decimals_from_i64};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{key}={value:?} is invalid: {reason}")]
    Invalid { key: &'static str, value: String, reason: String },

    #[error(transparent)]
    Domain(#[from] DomainError),
}

/// Which 1-D searcher the optimizer runs per candidate range.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(rename_all = "snake_case"))]
pub enum SearchMethod {
    Ternary,
    GoldenSection,
    Fibonacci,
    Random,
    AdaptiveRandom,
}

impl FromStr for SearchMethod {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ternary" => Ok(SearchMethod::Ternary),
            "golden" | "golden_section" | "golden-section" => Ok(SearchMethod::GoldenSection),
            "fibonacci" | "fib" => Ok(SearchMethod::Fibonacci),
            "random" => Ok(SearchMethod::Random),
            "adaptive_random" | "adaptive-random" | "adaptive" => Ok(SearchMethod::AdaptiveRandom),
            _ => Err("expected one of ternary, golden_section, fibonacci, random, adaptive_random"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    // Trade
    pub amount_in: f64,
    pub direction: SwapDirection,
    pub start_sqrt_price: f64,
    pub fee_rate: f64,
    pub decimals0: u8,
    pub decimals1: u8,

    // Pool
    pub tick_spacing: i32,
    pub passive_liquidity: Vec<(i32, f64)>, // tick -> liquidity

    // Valuation
    pub price0: f64,
    pub price1: f64,
    pub budget: f64,

    // Search
    pub precision: u64,
    pub search_method: SearchMethod,
    pub epsilon: f64,
    pub fibonacci_steps: usize,
    pub samples: usize,
    pub shrink_factor: f64,
    pub seed: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        // Scenario file first, then the usual .env
        dotenv::from_filename("scenario.env").ok();
        dotenv::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key/value source; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let decimals0: i64 = optional(&lookup, "JIT_DECIMALS0", 18)?;
        let decimals1: i64 = optional(&lookup, "JIT_DECIMALS1", 18)?;
        let tick_spacing: i32 = required(&lookup, "JIT_TICK_SPACING")?;
        check_tick_spacing(tick_spacing)?;
        let precision: u64 = optional(&lookup, "JIT_PRECISION", DEFAULT_PRECISION)?;
        Precision::new(precision)?;
        let shrink_factor: f64 = optional(&lookup, "JIT_SHRINK_FACTOR", DEFAULT_SHRINK_FACTOR)?;
        if !(shrink_factor > 0.0 && shrink_factor <= 1.0) {
            return Err(ConfigError::Invalid {
                key: "JIT_SHRINK_FACTOR",
                value: shrink_factor.to_string(),
                reason: "must lie in (0, 1]".to_string(),
            });
        }

        Ok(Config {
            amount_in: required(&lookup, "JIT_AMOUNT_IN")?,
            direction: parse_with(&lookup, "JIT_DIRECTION", parse_direction)?,
            start_sqrt_price: required(&lookup, "JIT_START_SQRT_PRICE")?,
            fee_rate: optional(&lookup, "JIT_FEE_RATE", 0.003)?,
            decimals0: decimals_from_i64(decimals0)?,
            decimals1: decimals_from_i64(decimals1)?,

            tick_spacing,
            passive_liquidity: parse_with(&lookup, "JIT_PASSIVE_LIQUIDITY", parse_liquidity_list)?,

            price0: optional(&lookup, "JIT_PRICE0", 1.0)?,
            price1: optional(&lookup, "JIT_PRICE1", 1.0)?,
            budget: required(&lookup, "JIT_BUDGET")?,

            precision,
            search_method: optional(&lookup, "JIT_SEARCH_METHOD", SearchMethod::GoldenSection)?,
            epsilon: optional(&lookup, "JIT_EPSILON", 1e-6)?,
            fibonacci_steps: optional(&lookup, "JIT_FIBONACCI_STEPS", 30)?,
            samples: optional(&lookup, "JIT_SAMPLES", 100)?,
            shrink_factor,
            seed: optional(&lookup, "JIT_SEED", 0)?,
        })
    }
}

fn required<T, F>(lookup: &F, key: &'static str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key).ok_or(ConfigError::Missing(key))?;
    raw.trim()
        .parse()
        .map_err(|e: T::Err| ConfigError::Invalid { key, value: raw.clone(), reason: e.to_string() })
}

fn optional<T, F>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => required(lookup, key),
        _ => Ok(default),
    }
}

fn parse_with<T, F>(lookup: &F, key: &'static str, parse: fn(&str) -> Result<T, String>) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key).ok_or(ConfigError::Missing(key))?;
    parse(&raw).map_err(|reason| ConfigError::Invalid { key, value: raw.clone(), reason })
}

pub fn parse_direction(raw: &str) -> Result<SwapDirection, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "zero_for_one" | "zeroforone" | "0to1" => Ok(SwapDirection::ZeroForOne),
        "one_for_zero" | "oneforzero" | "1to0" => Ok(SwapDirection::OneForZero),
        other => Err(format!("unknown direction {:?}", other)),
    }
}

/// `"0:500000, 20:200000"` -> `[(0, 500000.0), (20, 200000.0)]`. Empty input is an empty profile.
pub fn parse_liquidity_list(raw: &str) -> Result<Vec<(i32, f64)>, String> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (tick, liquidity) = entry
                .split_once(':')
                .ok_or_else(|| format!("entry {:?} is not tick:liquidity", entry))?;
            let tick = tick.trim().parse::<i32>().map_err(|e| format!("tick in {:?}: {}", entry, e))?;
            let liquidity = liquidity
                .trim()
                .parse::<f64>()
                .map_err(|e| format!("liquidity in {:?}: {}", entry, e))?;
            Ok((tick, liquidity))
        })
        .collect()
}
