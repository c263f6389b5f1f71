//! aoc-share-core - Core library for aoc-share
//!
//! This crate contains the models, database layer, leaderboard reconciliation,
//! solution lifecycle and access rules used by every aoc-share front end.

pub mod access;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod reconcile;
pub mod services;
pub mod snapshot;
pub mod solutions;
pub mod storage;
pub mod util;

pub use access::{authorize, Action, Actor, Decision, Denial};
pub use error::{Error, Result};
pub use models::{Puzzle, Solution, SolutionId, Update, User, UserId, Visibility};
