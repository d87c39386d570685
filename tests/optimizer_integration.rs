use std::collections::HashMap;

use bigdecimal::BigDecimal;
use jit_liquidity_sim::config::{Config, ConfigError, SearchMethod};
use jit_liquidity_sim::engine::optimizer::optimize;
use jit_liquidity_sim::engine::search::{FibonacciSearch, GoldenSectionSearch};
use jit_liquidity_sim::engine::service::{build_utility, run_scenario};
use jit_liquidity_sim::engine::swap::{SwapDirection, SwapStatus};
use jit_liquidity_sim::error::DomainError;

fn scenario(overrides: &[(&str, &str)]) -> HashMap<String, String> {
    let mut vars: HashMap<String, String> = [
        ("JIT_AMOUNT_IN", "2000"),
        ("JIT_DIRECTION", "one_for_zero"),
        ("JIT_START_SQRT_PRICE", "1"),
        ("JIT_TICK_SPACING", "20"),
        ("JIT_PASSIVE_LIQUIDITY", "0:500000,20:200000"),
        ("JIT_BUDGET", "1000"),
        ("JIT_SEARCH_METHOD", "fibonacci"),
        ("JIT_FIBONACCI_STEPS", "8"),
    ]
    .iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    for (k, v) in overrides {
        vars.insert(k.to_string(), v.to_string());
    }
    vars
}

fn config(overrides: &[(&str, &str)]) -> Result<Config, ConfigError> {
    let vars = scenario(overrides);
    Config::from_lookup(|key| vars.get(key).cloned())
}

#[test]
fn test_config_defaults_and_required_keys() {
    let cfg = config(&[]).unwrap();
    assert_eq!(cfg.direction, SwapDirection::OneForZero);
    assert_eq!(cfg.decimals0, 18);
    assert_eq!(cfg.fee_rate, 0.003);
    assert_eq!(cfg.precision, 34);
    assert_eq!(cfg.search_method, SearchMethod::Fibonacci);
    assert_eq!(cfg.passive_liquidity, vec![(0, 500_000.0), (20, 200_000.0)]);

    let vars = scenario(&[]);
    let missing = Config::from_lookup(|key| if key == "JIT_BUDGET" { None } else { vars.get(key).cloned() });
    assert!(matches!(missing, Err(ConfigError::Missing("JIT_BUDGET"))));
}

#[test]
fn test_config_rejects_bad_values() {
    assert!(matches!(config(&[("JIT_TICK_SPACING", "0")]), Err(ConfigError::Domain(DomainError::InvalidTickSpacing(0)))));
    assert!(matches!(config(&[("JIT_DECIMALS1", "-3")]), Err(ConfigError::Domain(DomainError::InvalidDecimals(-3)))));
    assert!(matches!(config(&[("JIT_PRECISION", "20")]), Err(ConfigError::Domain(DomainError::InsufficientPrecision { .. }))));
    assert!(matches!(config(&[("JIT_AMOUNT_IN", "lots")]), Err(ConfigError::Invalid { key: "JIT_AMOUNT_IN", .. })));
    assert!(matches!(config(&[("JIT_PASSIVE_LIQUIDITY", "0;5")]), Err(ConfigError::Invalid { .. })));
}

#[test]
fn test_optimizer_on_small_pool() {
    let cfg = config(&[]).unwrap();
    let utility = build_utility(&cfg).unwrap();
    let budget = BigDecimal::from(1000);
    let result = optimize(&utility, &budget, &FibonacciSearch::new(8)).unwrap();

    println!("baseline: tick {} -> {} ({:?})", result.start_tick, result.baseline.final_tick, result.baseline.status);
    println!("{} candidates", result.candidates.len());

    assert_eq!(result.baseline.status, SwapStatus::Exhausted);
    assert_eq!(result.baseline.fees_jit, BigDecimal::from(0));
    assert!(!result.candidates.is_empty());

    let best = result.best.clone().expect("a funded range");
    println!("best: [{}, {}) L={} utility={}", best.lower_tick, best.upper_tick, best.liquidity, best.utility);
    assert!(result.candidates.iter().all(|c| c.utility <= best.utility));
    assert!(result.candidates.iter().all(|c| c.lower_tick < c.upper_tick && c.lower_tick % 20 == 0));
    assert!(best.liquidity >= 0.0 && best.liquidity <= best.max_liquidity);

    // the reported utility is reproducible from the objective itself
    let again = utility.of_liquidity(best.lower_tick, best.upper_tick, best.liquidity).unwrap();
    assert_eq!(again, best.utility);
}

#[test]
fn test_optimizer_rejects_negative_budget() {
    let cfg = config(&[]).unwrap();
    let utility = build_utility(&cfg).unwrap();
    let err = optimize(&utility, &BigDecimal::from(-1), &GoldenSectionSearch { epsilon: 1.0 }).unwrap_err();
    assert!(matches!(err, DomainError::NegativeAmount { what: "budget", .. }));
}

#[test]
fn test_run_scenario_report_serializes() {
    let cfg = config(&[]).unwrap();
    let report = run_scenario(&cfg).unwrap();
    assert!(report.best.is_some());
    assert_eq!(report.candidates.len(), report.candidates.iter().filter(|c| c.evaluations == 8).count());

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["search_method"], "fibonacci");
    assert_eq!(json["request"]["direction"], "one_for_zero");
    assert_eq!(json["baseline"]["status"], "exhausted");
}

#[test]
fn test_random_search_methods_run_end_to_end() {
    for method in ["random", "adaptive_random"] {
        let cfg = config(&[("JIT_SEARCH_METHOD", method), ("JIT_SAMPLES", "12"), ("JIT_SEED", "11")]).unwrap();
        let first = run_scenario(&cfg).unwrap();
        let again = run_scenario(&cfg).unwrap();

        println!("{}: best {:?}", method, first.best.as_ref().map(|b| (b.candidate.lower_tick, b.candidate.upper_tick)));
        assert!(first.best.is_some());
        assert!(first.candidates.iter().all(|c| c.evaluations == 12));
        // same seed, same answer
        assert_eq!(first.candidates, again.candidates);
    }
}

#[test]
fn test_config_rejects_bad_shrink_factor() {
    assert!(matches!(config(&[("JIT_SHRINK_FACTOR", "1.5")]), Err(ConfigError::Invalid { key: "JIT_SHRINK_FACTOR", .. })));
    assert!(matches!(config(&[("JIT_SHRINK_FACTOR", "0")]), Err(ConfigError::Invalid { key: "JIT_SHRINK_FACTOR", .. })));
    let cfg = config(&[("JIT_SEARCH_METHOD", "adaptive")]).unwrap();
    assert_eq!(cfg.search_method, SearchMethod::AdaptiveRandom);
    assert_eq!((cfg.samples, cfg.shrink_factor, cfg.seed), (100, 0.8, 0));
}
