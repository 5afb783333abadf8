//! Runs a foraging colony without a display and prints its stats as JSON.
//!
//! `FORMICA_CONFIG` names a TOML configuration file (defaults apply when
//! unset). `FORMICA_SECONDS` sets the run length, 5 seconds by default.
//! Log output is controlled through `RUST_LOG`.

use anyhow::{Context, Result};
use formica::prelude::*;
use std::time::Duration;
use tracing::info;

const DEFAULT_SECONDS: f64 = 5.0;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = match std::env::var_os("FORMICA_CONFIG") {
        Some(path) => SimulationConfig::from_toml_file(&path)
            .with_context(|| format!("loading {}", path.to_string_lossy()))?,
        None => SimulationConfig::default(),
    };
    let seconds = run_length()?;
    let seed = config.seed.unwrap_or_default();

    let sim = SimulationBuilder::new()
        .with_config(config)
        .brains(ForagerFactory::new(seed))
        .build()
        .context("building simulation")?;
    let period = sim.config().tick_period();

    info!(seconds, period_ms = period.as_millis() as u64, "starting headless run");
    let driver = SimulationDriver::spawn(sim, period);
    let shared = driver.simulation();
    tokio::time::sleep(Duration::from_secs_f64(seconds)).await;
    let driver_stats = driver.stop().await;

    let stats = shared.lock().await.stats();
    info!(
        ticks = driver_stats.ticks_run,
        skipped = driver_stats.ticks_skipped,
        failed = driver_stats.ticks_failed,
        delivered = stats.delivered,
        "run finished"
    );

    let report = serde_json::json!({
        "driver": driver_stats,
        "simulation": stats,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();
}

fn run_length() -> Result<f64> {
    let Ok(raw) = std::env::var("FORMICA_SECONDS") else {
        return Ok(DEFAULT_SECONDS);
    };
    let seconds: f64 = raw
        .trim()
        .parse()
        .with_context(|| format!("FORMICA_SECONDS is not a number: {raw:?}"))?;
    anyhow::ensure!(
        seconds.is_finite() && seconds >= 0.0,
        "FORMICA_SECONDS must be a non-negative number, got {seconds}"
    );
    Ok(seconds)
}
