// SPDX-FileCopyrightText: 2026 Leadhound Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Leadhound - finds freelance and hiring leads in Discord channels.
//!
//! This is the binary entry point.

mod backfill;
mod check;
mod export;
mod live;
mod stats;
mod wiring;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use leadhound_core::LeadhoundError;

/// Leadhound - finds freelance and hiring leads in Discord channels.
#[derive(Parser, Debug)]
#[command(name = "leadhound", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Listen for new messages and record leads as they arrive.
    Live,
    /// Crawl recent channel history and record leads in one batch.
    Backfill {
        /// Also write the run summary as JSON to this file.
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Write every stored opportunity to a CSV file.
    Export {
        #[arg(long, short, default_value = "leadhound-export.csv")]
        output: PathBuf,
    },
    /// Show lead counts and conversion rates per server and keyword.
    Stats {
        /// Print JSON instead of tables.
        #[arg(long)]
        json: bool,
    },
    /// Check configuration, database, classifier and Discord accounts.
    Check {
        /// Disable colored output.
        #[arg(long)]
        plain: bool,
    },
    /// Set the manual review status of a stored opportunity.
    Review {
        /// Message link of the opportunity.
        permalink: String,
        /// New status, e.g. approved or rejected.
        status: String,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match leadhound_config::load_and_validate(cli.config.as_deref()) {
        Ok(config) => config,
        Err(errors) => {
            leadhound_config::render_errors(&errors);
            std::process::exit(1);
        }
    };
    init_tracing(&config.app.log_level);

    let result: Result<(), LeadhoundError> = match cli.command {
        Commands::Live => live::run_live(config).await,
        Commands::Backfill { report } => backfill::run_backfill(config, report).await,
        Commands::Export { output } => export::run_export(&config, &output).await,
        Commands::Stats { json } => stats::run_stats(&config, json).await,
        Commands::Check { plain } => check::run_check(&config, plain).await,
        Commands::Review { permalink, status } => {
            export::run_review(&config, &permalink, &status).await
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("leadhound={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_backfill_report_path() {
        let cli = Cli::parse_from(["leadhound", "backfill", "--report", "run.json"]);
        match cli.command {
            Commands::Backfill { report } => assert_eq!(report, Some(PathBuf::from("run.json"))),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn config_flag_is_global() {
        let cli = Cli::parse_from(["leadhound", "stats", "--config", "/tmp/lh.toml"]);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/lh.toml")));
    }

    #[test]
    fn review_takes_permalink_and_status() {
        let cli = Cli::parse_from([
            "leadhound",
            "review",
            "https://discord.com/channels/1/2/3",
            "approved",
        ]);
        match cli.command {
            Commands::Review { permalink, status } => {
                assert_eq!(permalink, "https://discord.com/channels/1/2/3");
                assert_eq!(status, "approved");
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
