//! Error types for aoc-share-core

use thiserror::Error;

use crate::access::Denial;

/// Result type alias using aoc-share-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in aoc-share-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Database error
    #[error("Database error: {0}")]
    Database(String),

    /// libSQL error
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Row not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Solution file storage error
    #[error("Storage error: {0}")]
    Storage(String),

    /// No cached snapshot and no way to fetch one
    #[error("Leaderboard data unavailable: {0}")]
    DataUnavailable(String),

    /// Remote leaderboard call failed or returned an unusable payload
    #[error("Remote leaderboard error: {0}")]
    Remote(String),

    /// The actor is not allowed to perform the requested operation
    #[error("Access denied: {0}")]
    Denied(Denial),

    /// First upload for a slot without a file
    #[error("A solution file is required for the first upload")]
    MissingFile,
}

impl From<reqwest::Error> for Error {
    fn from(error: reqwest::Error) -> Self {
        Self::Remote(error.to_string())
    }
}

impl From<Denial> for Error {
    fn from(denial: Denial) -> Self {
        Self::Denied(denial)
    }
}
