#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that plays a Horde level headlessly.

mod level_config;
mod logging;
mod simulation;

use std::{path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;

use level_config::LevelFile;
use simulation::SimulationOptions;

/// Runs a level against a simulated player and prints the population summary.
#[derive(Debug, Parser)]
#[command(name = "horde", version, about)]
struct Cli {
    /// Level description in TOML; the built-in settler level when omitted.
    #[arg(long)]
    level: Option<PathBuf>,
    /// Seed for spawn placement and the simulated player.
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Longest simulated time in seconds.
    #[arg(long, default_value_t = 600.0)]
    duration: f64,
    /// Simulation step in milliseconds.
    #[arg(long, default_value_t = 100)]
    timestep: u64,
    /// Per-second probability that the player removes each live actor.
    #[arg(long, default_value_t = 0.25)]
    kill_chance: f64,
    /// Log filter used when `RUST_LOG` is unset.
    #[arg(long, default_value = "warn")]
    log: String,
}

/// Entry point for the Horde command-line interface.
fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_tracing(&cli.log);

    let file = match &cli.level {
        Some(path) => LevelFile::load(path)
            .with_context(|| format!("failed to load level {}", path.display()))?,
        None => LevelFile::builtin().context("built-in level is invalid")?,
    };
    let duration = Duration::try_from_secs_f64(cli.duration)
        .with_context(|| format!("invalid duration {}", cli.duration))?;

    let options = SimulationOptions::new(
        duration,
        Duration::from_millis(cli.timestep),
        cli.kill_chance,
        cli.seed,
    );
    let report = simulation::run(file.build(cli.seed), &options);
    print!("{report}");
    Ok(())
}
