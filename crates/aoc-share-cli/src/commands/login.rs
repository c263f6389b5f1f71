use aoc_share_core::config::AppConfig;

use crate::commands::common::{normalize_username, open_initialized_context};
use crate::error::CliError;

pub async fn run_login(config: AppConfig, username: &str) -> Result<(), CliError> {
    let username = normalize_username(username)?;
    let context = open_initialized_context(config).await?;

    let user = context
        .service
        .find_user(&username)
        .await?
        .ok_or(CliError::UnknownUser(username))?;
    let unlocked = context.service.own_solutions(&user.username).await?.len();

    println!(
        "Logged in as {} ({} points, {unlocked} solved parts)",
        user.username, user.points
    );
    Ok(())
}
