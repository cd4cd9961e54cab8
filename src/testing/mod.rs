//! Scenario runner
//!
//! Runs YAML test scenarios: start NVDA with the scenario's settings, run
//! the listed spy keywords with their expectations, then quit NVDA and
//! archive its log, whatever the outcome of the steps.

mod config;
mod runner;

pub use config::*;
pub use runner::{run_scenario, run_with_session, TestResult};
