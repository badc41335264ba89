//! Headless fuel simulation runner for scenario testing and CI verification.
//!
//! The fuel world in `fuel_core` leaves movement, orders and presentation
//! to its host. This crate is a minimal host: it loads RON scenarios,
//! drives units across the grid one cell per tick, issues scripted
//! orders and reports what happened.
//!
//! # Example
//!
//! ```bash
//! # Run the built-in convoy scenario
//! cargo run -p fuel_headless -- run
//!
//! # Run a scenario file and print JSON
//! cargo run -p fuel_headless -- run --scenario scenarios/depot_run.ron --json
//!
//! # Validate a rules file
//! cargo run -p fuel_headless -- check --rules rules.ron
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod runner;
pub mod scenario;

pub use runner::{ActorSummary, HeadlessRunner, PlayerSummary, RunSummary};
pub use scenario::{Order, Roster, Scenario, ScenarioError};
