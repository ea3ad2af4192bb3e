#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs a headless Skirmish scenario.

mod config;
mod render;
mod simulation;

use std::{path::PathBuf, time::Duration};

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use skirmish_world::query;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::{config::SimulationConfig, simulation::Simulation};

/// Headless grid, pathfinding and movement simulation.
#[derive(Debug, Parser)]
#[command(name = "skirmish", version)]
struct Args {
    /// Scenario file in TOML; defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Overrides the generation seed from the scenario.
    #[arg(long)]
    seed: Option<u64>,
    /// Number of ticks to simulate.
    #[arg(long, default_value_t = 40)]
    ticks: u32,
    /// Length of a tick in milliseconds.
    #[arg(long, default_value_t = 100)]
    dt_ms: u64,
    /// Reseed and rebuild the grid before this tick.
    #[arg(long)]
    reseed_at: Option<u32>,
    /// Log filter directive, e.g. `debug` or `skirmish_world=trace`.
    #[arg(long)]
    log: Option<String>,
    /// Skip the final map dump.
    #[arg(long)]
    no_map: bool,
}

/// Entry point for the Skirmish command-line interface.
fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.log.as_deref())?;

    let mut config = match &args.config {
        Some(path) => SimulationConfig::load(path)?,
        None => SimulationConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.generation.seed = seed;
    }

    let mut simulation = Simulation::new(&config).context("failed to set up scenario")?;
    println!("{}", query::welcome_banner(simulation.world()));
    info!(
        agents = simulation.agents().len(),
        ticks = args.ticks,
        "simulation started"
    );

    let dt = Duration::from_millis(args.dt_ms);
    for tick in 0..args.ticks {
        if args.reseed_at == Some(tick) {
            simulation.reseed();
        }
        simulation.tick(dt);
    }

    info!(
        seed = query::seed(simulation.world()),
        ticks = query::tick_index(simulation.world()),
        elapsed_ms = query::elapsed(simulation.world()).as_millis() as u64,
        "simulation finished"
    );

    if !args.no_map {
        if let Some(grid) = simulation.grid() {
            print!("{}", render::render_map(grid, simulation.movement()));
        }
    }
    print!("{}", render::render_summary(simulation.movement()));
    Ok(())
}

fn init_tracing(directive: Option<&str>) -> Result<()> {
    let filter = match directive {
        Some(directive) => EnvFilter::try_new(directive)
            .with_context(|| format!("invalid log filter '{directive}'"))?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| anyhow!("failed to install tracing subscriber: {error}"))
}
