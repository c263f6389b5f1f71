//! Solution slot model

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{Puzzle, UserId};
use crate::error::{Error, Result};

/// Store-assigned id of a solution slot; also the key of its backing file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SolutionId(i64);

impl SolutionId {
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    pub const fn get(self) -> i64 {
        self.0
    }

    /// Key under which the uploaded file is stored
    #[must_use]
    pub fn storage_key(self) -> String {
        self.0.to_string()
    }
}

impl fmt::Display for SolutionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Upload state of a solution slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    /// Puzzle unlocked, nothing uploaded
    #[default]
    NotUploaded,
    /// Uploaded, author only
    Private,
    /// Uploaded, visible to anyone who solved the same part
    Public,
}

impl Visibility {
    /// Stored integer code
    pub const fn code(self) -> i64 {
        match self {
            Self::NotUploaded => 0,
            Self::Private => 1,
            Self::Public => 2,
        }
    }

    pub fn from_code(code: i64) -> Result<Self> {
        match code {
            0 => Ok(Self::NotUploaded),
            1 => Ok(Self::Private),
            2 => Ok(Self::Public),
            other => Err(Error::Database(format!("Unknown visibility code: {other}"))),
        }
    }

    /// Whether a file backs this state
    pub const fn is_uploaded(self) -> bool {
        !matches!(self, Self::NotUploaded)
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::NotUploaded => "not uploaded",
            Self::Private => "private",
            Self::Public => "public",
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One `(author, day, part)` completion slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Solution {
    pub id: SolutionId,
    pub author_id: UserId,
    pub puzzle: Puzzle,
    pub visibility: Visibility,
    /// Display name of the uploaded file
    pub file_name: Option<String>,
}

impl Solution {
    pub const fn day(&self) -> u8 {
        self.puzzle.day()
    }

    pub const fn part(&self) -> u8 {
        self.puzzle.part()
    }
}
