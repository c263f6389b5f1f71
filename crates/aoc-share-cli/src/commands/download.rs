use std::io::Write;
use std::path::Path;

use aoc_share_core::config::AppConfig;

use crate::commands::common::{normalize_username, open_initialized_context, parse_solution_id};
use crate::error::CliError;

pub async fn run_download(
    config: AppConfig,
    username: &str,
    solution_id: i64,
    output: Option<&Path>,
) -> Result<(), CliError> {
    let username = normalize_username(username)?;
    let solution_id = parse_solution_id(solution_id)?;
    let context = open_initialized_context(config).await?;

    let file = context.service.download(&username, solution_id).await?;

    if let Some(path) = output {
        std::fs::write(path, &file.bytes)?;
        println!(
            "Saved {} ({} bytes) to {}",
            file.name,
            file.bytes.len(),
            path.display()
        );
    } else {
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(&file.bytes)?;
        stdout.flush()?;
    }
    Ok(())
}
