use anyhow::Context;

use jit_liquidity_sim::config::Config;
use jit_liquidity_sim::engine::service::run_scenario;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    // Load configuration
    let config = Config::from_env().context("failed to load configuration")?;

    let report = run_scenario(&config)?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
