use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] aoc_share_core::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Username cannot be empty")]
    EmptyUsername,
    #[error("Unknown leaderboard member: {0}")]
    UnknownUser(String),
    #[error("Solution id must be positive, got {0}")]
    InvalidSolutionId(i64),
    #[error("Solution file is empty: {}", .0.display())]
    EmptyFile(PathBuf),
    #[error(
        "The leaderboard API is not configured. Set AOC_SESSION, AOC_YEAR and AOC_LEADERBOARD, or use `--cached`."
    )]
    RemoteNotConfigured,
}
