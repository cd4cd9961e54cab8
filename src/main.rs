//! NVDA system-test CLI
//!
//! Runs system test scenarios against NVDA and manages the scratch test
//! profile for manual runs.

use std::path::PathBuf;

use clap::Parser;
use nvda_systest::common::{config::Config, logging};
use nvda_systest::{cli, commands::Commands};

#[derive(Parser)]
#[command(name = "nvda-systest", about = "NVDA system test session controller")]
#[command(version, long_about = None)]
struct Cli {
    /// Configuration file (default: platform config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log debug output, including spy keyword traffic
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    logging::init_cli(cli.debug);

    let config = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    };

    let result = match config {
        Ok(config) => cli::dispatch(cli.command, &config).await,
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
