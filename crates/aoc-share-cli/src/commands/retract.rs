use aoc_share_core::config::AppConfig;
use aoc_share_core::Puzzle;

use crate::commands::common::{normalize_username, open_initialized_context};
use crate::error::CliError;

pub async fn run_retract(config: AppConfig, username: &str, puzzle: Puzzle) -> Result<(), CliError> {
    let username = normalize_username(username)?;
    let context = open_initialized_context(config).await?;

    let slot = context.service.own_solution(&username, puzzle).await?;
    context.service.retract(&username, slot.id).await?;

    println!("Retracted solution #{} for {puzzle}", slot.id);
    Ok(())
}
