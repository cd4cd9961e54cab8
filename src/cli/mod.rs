//! CLI command handling

use colored::Colorize;

use crate::commands::Commands;
use crate::common::config::Config;
use crate::common::{Error, Result};
use crate::process::LaunchCommands;
use crate::profile::{self, LocalFs, ProfileLayout};
use crate::spy::{RemoteSpyConnector, SpyConnector};
use crate::testing;

/// Dispatch a CLI command
pub async fn dispatch(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Test {
            paths,
            output_dir,
            verbose,
        } => {
            let mut failed = Vec::new();
            for path in &paths {
                let result = testing::run_scenario(path, config, &output_dir, verbose).await?;
                if !result.passed {
                    failed.push(result.name);
                }
            }

            println!(
                "{} passed, {} failed",
                (paths.len() - failed.len()).to_string().green(),
                failed.len().to_string().red()
            );

            if failed.is_empty() {
                Ok(())
            } else {
                Err(Error::TestAssertion(format!(
                    "{} of {} scenarios failed: {}",
                    failed.len(),
                    paths.len(),
                    failed.join(", ")
                )))
            }
        }

        Commands::Prepare { settings } => {
            let layout = ProfileLayout::from_config(config)?;
            profile::prepare_workspace(&LocalFs, &layout, &settings).await?;
            println!("Prepared NVDA profile: {}", layout.profile_dir.display());
            Ok(())
        }

        Commands::Teardown => {
            let layout = ProfileLayout::from_config(config)?;
            profile::teardown_workspace(&LocalFs, &layout).await?;
            println!("Cleaned NVDA profile: {}", layout.profile_dir.display());
            Ok(())
        }

        Commands::Probe => {
            let connector = RemoteSpyConnector::from_config(&config.spy)?;
            if connector.probe().await {
                println!("nvdaSpy is reachable at {}", connector.uri());
                Ok(())
            } else {
                Err(Error::SpyNotReachable {
                    uri: connector.uri().to_string(),
                })
            }
        }

        Commands::StopSpy => {
            let connector = RemoteSpyConnector::from_config(&config.spy)?;
            if connector.stop().await {
                println!("Stopped nvdaSpy at {}", connector.uri());
            } else {
                println!("nvdaSpy was not running at {}", connector.uri());
            }
            Ok(())
        }

        Commands::Config => {
            let layout = ProfileLayout::from_config(config)?;
            let commands = LaunchCommands::from_config(config)?;
            let start = commands.start(&layout.profile_dir);

            println!("Settings files: {}", layout.settings_dir.display());
            println!("Spy sources:    {}", layout.libraries_dir.display());
            println!("Profile:        {}", layout.profile_dir.display());
            println!("Start command:  {} (in {})", start.line, start.cwd.display());
            println!("Quit command:   {}", commands.quit().line);
            println!("Spy endpoint:   {}", config.spy.uri());
            Ok(())
        }
    }
}
