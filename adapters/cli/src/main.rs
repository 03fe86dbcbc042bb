#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs a headless Transit Rush session.

mod autoplay;

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;
use transit_rush_core::{GameSnapshot, SimulationConfig};
use transit_rush_engine::Simulation;
use transit_rush_world::query;

use crate::autoplay::Autoplay;

/// Runs a Transit Rush session without a renderer and reports the outcome.
#[derive(Debug, Parser)]
#[command(name = "transit-rush", version)]
struct Cli {
    /// TOML file overriding the default simulation configuration.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Seconds of game time to simulate.
    #[arg(long, default_value_t = 300.0)]
    duration: f64,
    /// Milliseconds of game time advanced per tick.
    #[arg(long, default_value_t = 100)]
    step_ms: u64,
    /// Overrides the configured RNG seed.
    #[arg(long)]
    seed: Option<u64>,
    /// Connects every new station to its nearest neighbour.
    #[arg(long)]
    autoplay: bool,
    /// Prints the final snapshot as JSON instead of a summary.
    #[arg(long)]
    json: bool,
}

/// Entry point for the Transit Rush command-line interface.
fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = load_config(cli.config.as_deref())?;
    if let Some(seed) = cli.seed {
        config.seed = seed;
    }

    let duration = Duration::try_from_secs_f64(cli.duration)
        .context("--duration must be a finite, non-negative number of seconds")?;
    let step = Duration::from_millis(cli.step_ms.max(1));

    let mut simulation = Simulation::new(config).context("invalid simulation configuration")?;
    tracing::info!("{}", query::welcome_banner(simulation.world()));

    let mut autoplay = cli.autoplay.then(Autoplay::default);
    if let Some(player) = autoplay.as_mut() {
        player.start(&mut simulation);
    }

    while query::elapsed(simulation.world()) < duration && !simulation.is_game_over() {
        let events = simulation.tick(step);
        if let Some(player) = autoplay.as_mut() {
            player.handle(&events, &mut simulation);
        }
    }

    if let Some(player) = &autoplay {
        tracing::info!(connections = player.connections(), "autoplay finished");
    }

    let snapshot = simulation.snapshot();
    if cli.json {
        let json =
            serde_json::to_string_pretty(&snapshot).context("failed to serialise snapshot")?;
        println!("{json}");
    } else {
        print_summary(&snapshot);
    }
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<SimulationConfig> {
    let Some(path) = path else {
        return Ok(SimulationConfig::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    toml::from_str(&text).with_context(|| format!("failed to parse config {}", path.display()))
}

fn print_summary(snapshot: &GameSnapshot) {
    println!(
        "elapsed {:.1}s | score {} | generated {} | in transit {}",
        snapshot.elapsed.as_secs_f64(),
        snapshot.score,
        snapshot.passengers_generated,
        snapshot.passengers_in_transit(),
    );
    println!(
        "{} / {} stations, {} routes, {} trains",
        snapshot.stations.len(),
        snapshot.max_stations,
        snapshot.routes.len(),
        snapshot.trains.len(),
    );
    for station in &snapshot.stations {
        println!(
            "  {:<7} {:<12} waiting {:>3}  overload {:>5.1}s",
            station.label,
            station.city.as_deref().unwrap_or("-"),
            station.queue_length,
            station.overload.as_secs_f64(),
        );
    }
    match &snapshot.game_over {
        Some(report) => println!(
            "game over after {:.1}s: {}",
            report.elapsed.as_secs_f64(),
            report.reason
        ),
        None => println!("network still running"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_path_uses_defaults() {
        assert_eq!(load_config(None).expect("defaults"), SimulationConfig::default());
    }

    #[test]
    fn config_file_overrides_defaults() {
        let path = std::env::temp_dir().join(format!("transit-rush-{}.toml", std::process::id()));
        fs::write(&path, "max_stations = 6\ntrain_capacity = 4\n").expect("write config");

        let config = load_config(Some(&path)).expect("parsed config");
        let _ = fs::remove_file(&path);

        assert_eq!(config.max_stations, 6);
        assert_eq!(config.train_capacity, 4);
        assert_eq!(config.initial_stations, 2);
    }

    #[test]
    fn unreadable_config_reports_path() {
        let error = load_config(Some(Path::new("/nonexistent/transit-rush.toml")))
            .expect_err("missing file");
        assert!(error.to_string().contains("transit-rush.toml"));
    }

    #[test]
    fn cli_flags_parse() {
        let cli = Cli::parse_from(["transit-rush", "--duration", "60", "--autoplay", "--json"]);
        assert_eq!(cli.duration, 60.0);
        assert_eq!(cli.step_ms, 100);
        assert!(cli.autoplay && cli.json);
        assert!(cli.config.is_none() && cli.seed.is_none());
    }
}
