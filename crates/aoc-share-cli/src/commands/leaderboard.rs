use aoc_share_core::config::AppConfig;

use crate::commands::common::{format_leaderboard_lines, open_initialized_context};
use crate::error::CliError;

pub async fn run_leaderboard(config: AppConfig, as_json: bool) -> Result<(), CliError> {
    let context = open_initialized_context(config).await?;
    let entries = context.service.leaderboard().await?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else if entries.is_empty() {
        println!("No members yet.");
    } else {
        for line in format_leaderboard_lines(&entries) {
            println!("{line}");
        }
    }
    Ok(())
}
