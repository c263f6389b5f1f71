use aoc_share_core::config::AppConfig;

use crate::commands::common::open_context;
use crate::error::CliError;

pub async fn run_init(config: AppConfig) -> Result<(), CliError> {
    let context = open_context(config).await?;
    let mode = context.config.fetch_mode();

    match context.service.initialize(&context.fetcher, mode).await? {
        Some(report) => println!(
            "Initialized {} with {} members and {} unlocked solutions",
            context.config.data_dir().display(),
            report.users_created,
            report.solutions_unlocked
        ),
        None => println!("Already initialized; use `aoc-share sync` to refresh"),
    }
    Ok(())
}
