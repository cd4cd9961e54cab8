//! CLI command definitions
//!
//! Defines the clap commands for the system-test CLI.

use clap::Subcommand;
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum Commands {
    /// Run YAML test scenarios against NVDA
    Test {
        /// Paths to the YAML test scenario files
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Directory receiving nvdaTestRunLogs/
        #[arg(long, default_value = "output")]
        output_dir: PathBuf,

        /// Verbose output
        #[arg(long, short)]
        verbose: bool,
    },

    /// Copy a settings file into the test profile and install the spy
    Prepare {
        /// Settings file name inside the settings directory
        settings: String,
    },

    /// Remove the settings file and the spy from the test profile
    Teardown,

    /// Check whether the spy's remote server is reachable
    Probe,

    /// Ask the spy's remote server to stop
    StopSpy,

    /// Show the resolved paths, commands and spy endpoint
    Config,
}
