//! Reconciliation audit log entry

use serde::{Deserialize, Serialize};

/// Append-only record of one reconciliation pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Update {
    pub id: i64,
    /// Short description, e.g. "Server started"
    pub data: String,
    /// Creation timestamp (Unix ms)
    pub created_at: i64,
}
