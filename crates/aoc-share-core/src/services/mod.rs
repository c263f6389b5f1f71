//! Service layer shared by aoc-share front ends.

mod share;

pub use share::{DayEntry, DayListing, LeaderboardEntry, ShareService, STARTUP_UPDATE_LABEL};
