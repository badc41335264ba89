//! Headless fuel simulation runner.
//!
//! # Usage
//!
//! ```bash
//! # Run the built-in convoy scenario for its default length
//! cargo run -p fuel_headless -- run
//!
//! # Run a scenario file for a fixed number of ticks, JSON on stdout
//! cargo run -p fuel_headless -- run --scenario scenarios/depot_run.ron --ticks 200 --json
//!
//! # Validate a rules file
//! cargo run -p fuel_headless -- check --rules rules.ron
//! ```
//!
//! Results go to stdout, logs to stderr. `RUST_LOG` overrides the log
//! level chosen by `--verbose`.

use std::error::Error;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use fuel_headless::{scenario::load_rules, HeadlessRunner, Scenario};

#[derive(Parser)]
#[command(name = "fuel_headless")]
#[command(about = "Headless fuel simulation runner for scenario testing and CI")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scenario and print a summary
    Run {
        /// Scenario file to load (defaults to the built-in convoy)
        #[arg(short, long)]
        scenario: Option<PathBuf>,

        /// Ticks to simulate (defaults to the scenario's length)
        #[arg(short, long)]
        ticks: Option<u64>,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate a rules file
    Check {
        /// Rules file (RON)
        #[arg(short, long)]
        rules: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays clean for results
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    let result = match cli.command {
        Some(Commands::Run {
            scenario,
            ticks,
            json,
        }) => cmd_run(scenario, ticks, json),
        Some(Commands::Check { rules }) => cmd_check(&rules),
        None => cmd_run(None, None, false),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{err}");
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}

/// Run a scenario to completion and print its summary.
fn cmd_run(path: Option<PathBuf>, ticks: Option<u64>, json: bool) -> Result<(), Box<dyn Error>> {
    let scenario = match path {
        Some(path) => {
            tracing::info!(path = %path.display(), "Loading scenario");
            Scenario::load(&path)?
        }
        None => Scenario::convoy(),
    };
    let ticks = ticks.unwrap_or(scenario.ticks);

    let mut runner = HeadlessRunner::new(scenario)?;
    let summary = runner.run(ticks)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print!("{summary}");
    }
    Ok(())
}

/// Parse and validate a rules file.
fn cmd_check(path: &Path) -> Result<(), Box<dyn Error>> {
    let rules = load_rules(path)?;
    println!(
        "{}: {} actor types, player reserve {}",
        path.display(),
        rules.actors.len(),
        rules.player.reserve.capacity
    );
    Ok(())
}
