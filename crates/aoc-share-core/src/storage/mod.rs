//! Storage for uploaded solution files.
//!
//! Files are addressed by solution id only. The display name a member chose
//! is kept in the database and never reaches the file system.

mod local;

pub use local::LocalFileStore;

use crate::models::SolutionId;
use crate::Result;

/// Byte store keyed by solution id
pub trait FileStore: Send + Sync {
    /// Store `bytes` under `key`, replacing any previous content
    fn put(&self, key: SolutionId, bytes: &[u8]) -> Result<()>;

    /// Content stored under `key`, or `None` when nothing is stored
    fn get(&self, key: SolutionId) -> Result<Option<Vec<u8>>>;

    /// Remove the content under `key`. Removing a missing key succeeds.
    fn delete(&self, key: SolutionId) -> Result<()>;
}
