//! glimmer-trace: replay reveal scenarios and print layer snapshots.
//!
//! Feeds a JSON scenario (prop changes, prefetch settlements, load
//! callbacks, clock ticks, teardown) through the reveal state machine and
//! prints the commands and visible layers after every step. Useful for:
//!
//! - Checking what a sequence of prop changes renders
//! - Reproducing stale prefetch or load races
//! - Tuning fade and pulse timings
//!
//! # Usage
//!
//! ```text
//! cargo run --bin glimmer-trace -- [OPTIONS] <SCENARIO>
//! ```

#![allow(clippy::print_stdout, clippy::print_stderr)]

mod scenario;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use glimmer_reveal::RevealConfig;

use crate::scenario::{Scenario, ScenarioError};

/// Reveal scenario replay for glimmer.
///
/// Runs every step of a scenario file through the reveal machine and
/// prints the resulting commands, layers and animation opacities.
#[derive(Parser)]
#[command(name = "glimmer-trace", version)]
struct Cli {
    /// Path to the scenario JSON file.
    scenario: PathBuf,

    /// Final image fade duration in milliseconds.
    #[arg(long)]
    fade_ms: Option<u64>,

    /// Duration of one skeleton pulse leg in milliseconds.
    #[arg(long)]
    pulse_leg_ms: Option<u64>,

    /// Output snapshots as JSON instead of a human-readable report.
    #[arg(long)]
    json: bool,

    /// Full reveal config as a JSON string.
    ///
    /// When provided, `--fade-ms` and `--pulse-leg-ms` are ignored.
    /// The JSON must be a valid `RevealConfig` serialization; missing
    /// fields take their defaults.
    #[arg(long)]
    config_json: Option<String>,
}

/// Build a [`RevealConfig`] from CLI arguments.
fn config_from_cli(cli: &Cli) -> Result<RevealConfig, ScenarioError> {
    if let Some(ref json) = cli.config_json {
        return serde_json::from_str(json).map_err(ScenarioError::Config);
    }

    let mut config = RevealConfig::default();
    if let Some(ms) = cli.fade_ms {
        config.fade_duration = Duration::from_millis(ms);
    }
    if let Some(ms) = cli.pulse_leg_ms {
        config.pulse.leg_duration = Duration::from_millis(ms);
    }
    Ok(config)
}

fn load_scenario(path: &Path) -> Result<Scenario, ScenarioError> {
    let json = std::fs::read_to_string(path).map_err(|source| ScenarioError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Scenario::from_json(&json)
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    let config = match config_from_cli(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let scenario = match load_scenario(&cli.scenario) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    eprintln!(
        "Scenario: {} ({} steps)",
        cli.scenario.display(),
        scenario.steps.len(),
    );
    eprintln!("Config: {config:#?}");
    eprintln!();

    let snapshots = match scenario::run(scenario, config) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Replay error: {e}");
            return ExitCode::FAILURE;
        }
    };

    if cli.json {
        match serde_json::to_string_pretty(&snapshots) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Error serializing snapshots: {e}");
                return ExitCode::FAILURE;
            }
        }
    } else {
        for snapshot in &snapshots {
            println!("{}", snapshot.report());
        }
    }

    ExitCode::SUCCESS
}
