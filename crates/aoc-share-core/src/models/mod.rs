//! Data models for aoc-share

mod puzzle;
mod solution;
mod update;
mod user;

pub use puzzle::{validate_day, Puzzle, LAST_DAY, PARTS};
pub use solution::{Solution, SolutionId, Visibility};
pub use update::Update;
pub use user::{User, UserId};
