//! Leaderboard member model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A member's id as assigned by the leaderboard site. Never generated locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(i64);

impl UserId {
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    pub const fn get(self) -> i64 {
        self.0
    }

    /// Name the leaderboard site shows for a member without a public name
    pub fn anonymous_name(self) -> String {
        format!("anonymous user #{}", self.0)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for UserId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.trim().parse()?))
    }
}

/// A leaderboard member
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// External id
    pub id: UserId,
    /// Unique display name
    pub username: String,
    /// Local score on the private leaderboard
    pub points: i64,
    /// Update under which this member was last synchronized
    pub last_update_id: Option<i64>,
}
