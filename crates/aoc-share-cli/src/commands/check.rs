use aoc_share_core::config::AppConfig;
use aoc_share_core::{Action, Decision};

use crate::commands::common::{normalize_username, open_initialized_context, parse_solution_id};
use crate::error::CliError;

pub async fn run_check(
    config: AppConfig,
    username: &str,
    solution_id: i64,
    action: Action,
) -> Result<(), CliError> {
    let username = normalize_username(username)?;
    let solution_id = parse_solution_id(solution_id)?;
    let context = open_initialized_context(config).await?;

    match context
        .service
        .authorize(&username, solution_id, action)
        .await?
    {
        Decision::Allow => println!("allowed"),
        Decision::Deny(denial) => println!("denied: {denial}"),
    }
    Ok(())
}
