//! aoc-share - share Advent of Code solutions within a private leaderboard
//!
//! Keeps a local copy of the leaderboard and lets members exchange solution
//! files for the parts they have solved themselves.

mod cli;
mod commands;
mod error;

use aoc_share_core::Puzzle;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};
use crate::commands::check::run_check;
use crate::commands::common::resolve_config;
use crate::commands::day::run_day;
use crate::commands::download::run_download;
use crate::commands::init::run_init;
use crate::commands::leaderboard::run_leaderboard;
use crate::commands::login::run_login;
use crate::commands::retract::run_retract;
use crate::commands::sync::run_sync;
use crate::commands::updates::run_updates;
use crate::commands::upload::run_upload;
use crate::error::CliError;

const DEFAULT_LOG_FILTER: &str = "aoc_share_core=info,aoc_share_cli=info";

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = resolve_config(cli.data_dir, cli.offline, cli.live)?;
    tracing::debug!("Using {config:?}");

    match cli.command {
        Commands::Init => run_init(config).await,
        Commands::Sync { cached, label } => run_sync(config, cached, label.as_deref()).await,
        Commands::Leaderboard { json } => run_leaderboard(config, json).await,
        Commands::Day { day, json } => run_day(config, day, json).await,
        Commands::Login { username } => run_login(config, &username).await,
        Commands::Upload {
            user,
            day,
            part,
            visibility,
            file,
        } => {
            let puzzle = Puzzle::new(day, part)?;
            run_upload(config, &user, puzzle, visibility.into(), file.as_deref()).await
        }
        Commands::Retract { user, day, part } => {
            run_retract(config, &user, Puzzle::new(day, part)?).await
        }
        Commands::Download {
            user,
            solution_id,
            output,
        } => run_download(config, &user, solution_id, output.as_deref()).await,
        Commands::Check {
            user,
            solution_id,
            action,
        } => run_check(config, &user, solution_id, action.into()).await,
        Commands::Updates { limit, json } => run_updates(config, limit, json).await,
    }
}
