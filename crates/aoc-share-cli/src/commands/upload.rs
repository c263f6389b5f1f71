use std::path::Path;

use aoc_share_core::config::AppConfig;
use aoc_share_core::solutions::SolutionFile;
use aoc_share_core::{Puzzle, Visibility};

use crate::commands::common::{normalize_username, open_initialized_context};
use crate::error::CliError;

pub async fn run_upload(
    config: AppConfig,
    username: &str,
    puzzle: Puzzle,
    visibility: Visibility,
    file: Option<&Path>,
) -> Result<(), CliError> {
    let username = normalize_username(username)?;
    let file = file.map(read_solution_file).transpose()?;

    let context = open_initialized_context(config).await?;
    let slot = context.service.own_solution(&username, puzzle).await?;
    let updated = context
        .service
        .upload(&username, slot.id, file, visibility)
        .await?;

    println!(
        "Solution #{} for {puzzle} is now {}",
        updated.id, updated.visibility
    );
    Ok(())
}

pub fn read_solution_file(path: &Path) -> Result<SolutionFile, CliError> {
    let bytes = std::fs::read(path)?;
    if bytes.is_empty() {
        return Err(CliError::EmptyFile(path.to_path_buf()));
    }
    let name = path
        .file_name()
        .map_or_else(String::new, |name| name.to_string_lossy().to_string());
    Ok(SolutionFile::new(name, bytes))
}
