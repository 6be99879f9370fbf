// SPDX-FileCopyrightText: 2026 Workpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Workpulse - daily work-update summaries over Slack and Telegram.
//!
//! This is the binary entry point.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod prometheus;
mod serve;
mod shutdown;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use workpulse_config::{ConfigError, WorkpulseConfig};

/// Workpulse - daily work-update summaries over Slack and Telegram.
#[derive(Parser, Debug)]
#[command(name = "workpulse", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the XDG hierarchy.
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the webhook gateway and the daily scheduler.
    Serve,
    /// Run the fan-out job once and print the run summary as JSON.
    RunOnce,
    /// Load and validate configuration, then exit.
    CheckConfig,
}

fn load(path: Option<&PathBuf>) -> Result<WorkpulseConfig, Vec<ConfigError>> {
    match path {
        Some(path) => workpulse_config::load_and_validate_path(path),
        None => workpulse_config::load_and_validate(),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load(cli.config.as_ref()) {
        Ok(config) => config,
        Err(errors) => {
            workpulse_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Serve => serve::run_serve(config).await,
        Commands::RunOnce => serve::run_once(config).await,
        Commands::CheckConfig => {
            println!(
                "workpulse: configuration ok (slack={}, telegram={}, schedule=`{}`)",
                config.slack.is_enabled(),
                config.telegram.is_enabled(),
                config.schedule.cron_expression()
            );
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("workpulse: {e}");
        std::process::exit(1);
    }
}
