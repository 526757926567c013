//! `amm-sim`: replay a JSON scenario against a fresh pool engine
//!
//! Step results and events go to stdout as JSON lines; logs go to stderr.

use anyhow::{Context, Result};
use clap::Parser;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use swap_config::{load_config, LoggingConfig};
use swap_engine::{
    Clock, ManualClock, PoolEngine, Scenario, ScenarioRunner, SystemClock, TracingSink,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "amm-sim", about = "Constant-product pool scenario runner")]
struct Args {
    /// Engine configuration (TOML); `SWAP_*` variables override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Scenario file (JSON)
    #[arg(short, long)]
    scenario: PathBuf,

    /// Restore pools from this snapshot before running
    #[arg(long)]
    snapshot_in: Option<PathBuf>,

    /// Write a bincode snapshot of all pools after the run
    #[arg(long)]
    snapshot_out: Option<PathBuf>,
}

fn init_tracing(logging: &LoggingConfig) {
    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = load_config(args.config.as_deref()).context("Failed to load engine config")?;
    init_tracing(&config.logging);

    info!("Starting amm-sim with scenario {:?}", args.scenario);

    let scenario = Scenario::load(&args.scenario)?;
    let clock = Arc::new(ManualClock::new(SystemClock.now()));
    let mut engine =
        PoolEngine::from_config(&config, clock.clone()).context("Failed to build pool engine")?;

    if let Some(path) = &args.snapshot_in {
        let bytes =
            std::fs::read(path).with_context(|| format!("Failed to read snapshot {:?}", path))?;
        engine
            .import_snapshot(&bytes)
            .with_context(|| format!("Failed to restore snapshot {:?}", path))?;
    }
    let engine = Arc::new(engine);

    engine.subscribe(Arc::new(TracingSink));
    let runner = ScenarioRunner::new(engine.clone(), clock, &scenario)?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let summary = runner.run(&scenario.steps, &mut out)?;
    out.flush().context("Failed to flush output")?;

    let snapshot_out = args
        .snapshot_out
        .or_else(|| config.persistence.snapshot_path.clone());
    if let Some(path) = snapshot_out {
        let bytes = engine.export_snapshot().context("Failed to snapshot pools")?;
        std::fs::write(&path, bytes)
            .with_context(|| format!("Failed to write snapshot {:?}", path))?;
        info!("Wrote snapshot of {} pools to {:?}", engine.pool_count(), path);
    }

    info!(
        "amm-sim done: {}/{} steps succeeded, {} events",
        summary.succeeded, summary.steps, summary.events
    );
    Ok(())
}
