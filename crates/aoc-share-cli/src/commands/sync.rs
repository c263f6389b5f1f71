use aoc_share_core::config::AppConfig;
use aoc_share_core::snapshot::FetchMode;

use crate::commands::common::{default_sync_label, open_context};
use crate::error::CliError;

pub async fn run_sync(config: AppConfig, cached: bool, label: Option<&str>) -> Result<(), CliError> {
    let context = open_context(config).await?;
    let mode = if cached {
        FetchMode::Cached
    } else {
        context.config.fetch_mode()
    };

    if mode == FetchMode::Live && !context.fetcher.source().is_remote_configured() {
        return Err(CliError::RemoteNotConfigured);
    }

    let label = label
        .map(str::trim)
        .filter(|label| !label.is_empty())
        .map_or_else(default_sync_label, ToString::to_string);
    let report = context.service.sync(&context.fetcher, mode, &label).await?;

    println!(
        "Sync #{} completed: {} new members, {} updated, {} newly unlocked solutions",
        report.update.id, report.users_created, report.users_updated, report.solutions_unlocked
    );
    Ok(())
}
