//! Authorization rules for solution reads and writes.
//!
//! Spoilers are gated by the actor's own progress: another member's solution
//! is only reachable once the actor has completed the same `(day, part)`.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::{Puzzle, Solution, UserId, Visibility};

/// Operation requested on a solution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    View,
    Download,
    Upload,
    Retract,
}

/// Reason an operation was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Denial {
    /// Only the author may change a solution
    NotAuthor,
    /// The actor has not completed this puzzle part yet
    NotUnlocked,
    /// The author keeps this solution to themselves
    Private,
    /// Nothing has been uploaded for this slot
    NotUploaded,
}

impl fmt::Display for Denial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NotAuthor => "only the author can change this solution",
            Self::NotUnlocked => "complete this puzzle part first",
            Self::Private => "this solution is private",
            Self::NotUploaded => "no solution has been uploaded",
        })
    }
}

/// Outcome of an authorization check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(Denial),
}

impl Decision {
    /// Convert a denial into an error
    pub const fn into_result(self) -> Result<(), Denial> {
        match self {
            Self::Allow => Ok(()),
            Self::Deny(denial) => Err(denial),
        }
    }
}

/// The member on whose behalf an operation runs, with their completion set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub user_id: UserId,
    pub completed: HashSet<Puzzle>,
}

impl Actor {
    pub fn new(user_id: UserId, completed: impl IntoIterator<Item = Puzzle>) -> Self {
        Self {
            user_id,
            completed: completed.into_iter().collect(),
        }
    }

    pub fn has_completed(&self, puzzle: Puzzle) -> bool {
        self.completed.contains(&puzzle)
    }
}

/// Decide whether `actor` may perform `action` on `solution`.
pub fn authorize(actor: &Actor, solution: &Solution, action: Action) -> Decision {
    let is_author = actor.user_id == solution.author_id;

    match action {
        Action::Upload | Action::Retract => {
            if is_author {
                Decision::Allow
            } else {
                Decision::Deny(Denial::NotAuthor)
            }
        }
        Action::View | Action::Download => {
            if !is_author && !actor.has_completed(solution.puzzle) {
                return Decision::Deny(Denial::NotUnlocked);
            }
            match solution.visibility {
                Visibility::NotUploaded => Decision::Deny(Denial::NotUploaded),
                Visibility::Private if !is_author => Decision::Deny(Denial::Private),
                Visibility::Private | Visibility::Public => Decision::Allow,
            }
        }
    }
}
