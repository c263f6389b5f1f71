use aoc_share_core::config::AppConfig;

use crate::commands::common::{format_day_lines, open_initialized_context};
use crate::error::CliError;

pub async fn run_day(config: AppConfig, day: u8, as_json: bool) -> Result<(), CliError> {
    let context = open_initialized_context(config).await?;
    let listing = context.service.day_listing(day).await?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&listing)?);
    } else {
        for line in format_day_lines(&listing) {
            println!("{line}");
        }
    }
    Ok(())
}
