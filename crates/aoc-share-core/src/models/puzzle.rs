//! Puzzle coordinates

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};

/// Last day of the event
pub const LAST_DAY: u8 = 25;

/// Parts of every day's puzzle
pub const PARTS: [u8; 2] = [1, 2];

/// A `(day, part)` pair, validated to lie inside the event calendar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Puzzle {
    day: u8,
    part: u8,
}

impl Puzzle {
    /// Build a puzzle coordinate, rejecting days outside 1–25 and parts other than 1 or 2
    pub fn new(day: u8, part: u8) -> Result<Self> {
        validate_day(day)?;
        if !PARTS.contains(&part) {
            return Err(Error::InvalidInput(format!("Invalid part: {part}")));
        }
        Ok(Self { day, part })
    }

    pub const fn day(self) -> u8 {
        self.day
    }

    pub const fn part(self) -> u8 {
        self.part
    }
}

impl fmt::Display for Puzzle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "day {} part {}", self.day, self.part)
    }
}

/// Reject days outside the event calendar
pub fn validate_day(day: u8) -> Result<()> {
    if (1..=LAST_DAY).contains(&day) {
        Ok(())
    } else {
        Err(Error::InvalidInput(format!("Invalid day: {day}")))
    }
}
