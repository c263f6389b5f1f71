//! Database layer for aoc-share

mod connection;
mod migrations;
mod repository;

pub use connection::Database;
pub use repository::{LeaderboardRepository, LibSqlLeaderboardRepository, UpsertOutcome};
