use aoc_share_core::config::AppConfig;

use crate::commands::common::{
    format_update_lines, open_initialized_context, update_to_item, UpdateItem,
};
use crate::error::CliError;

pub async fn run_updates(config: AppConfig, limit: usize, as_json: bool) -> Result<(), CliError> {
    let context = open_initialized_context(config).await?;
    let updates = context.service.updates(limit).await?;

    if as_json {
        let items = updates.iter().map(update_to_item).collect::<Vec<UpdateItem>>();
        println!("{}", serde_json::to_string_pretty(&items)?);
    } else if updates.is_empty() {
        println!("No syncs recorded.");
    } else {
        for line in format_update_lines(&updates) {
            println!("{line}");
        }
    }
    Ok(())
}
