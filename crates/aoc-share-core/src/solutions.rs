//! Solution upload lifecycle.
//!
//! ```text
//! NotUploaded --upload(file)--> Private | Public
//! Private/Public --upload(file?)--> Private | Public
//! Private/Public --retract--> NotUploaded
//! ```
//!
//! A backing file exists exactly when the slot is not `NotUploaded`. Callers
//! must serialize transitions on the same slot; `ShareService` does so by
//! holding its database lock across the whole transition.

use std::sync::LazyLock;

use libsql::Connection;
use regex::Regex;

use crate::access::{authorize, Action, Actor, Denial};
use crate::db::{LeaderboardRepository, LibSqlLeaderboardRepository};
use crate::error::{Error, Result};
use crate::models::{Solution, Visibility};
use crate::storage::FileStore;

const MAX_FILE_NAME_CHARS: usize = 100;
const FALLBACK_FILE_NAME: &str = "solution";

static UNSAFE_FILE_NAME_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9._-]+").expect("Invalid regex"));

/// An uploaded file: its display name and content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolutionFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl SolutionFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }
}

/// Reduce a client-supplied file name to a safe display name.
///
/// Only the last path component is kept and anything outside
/// `[A-Za-z0-9._-]` becomes `_`.
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned = UNSAFE_FILE_NAME_CHARS.replace_all(base.trim(), "_");
    let cleaned = cleaned.trim_start_matches('.');
    let cleaned: String = cleaned.chars().take(MAX_FILE_NAME_CHARS).collect();

    if cleaned.is_empty() || cleaned.chars().all(|c| c == '_') {
        FALLBACK_FILE_NAME.to_string()
    } else {
        cleaned
    }
}

/// Upload a file for `solution`, or change the visibility of an existing upload.
///
/// The first upload of a slot requires a non-empty file. Later uploads may
/// omit it to only change visibility. If the row cannot be updated, the
/// previous file content is put back.
pub async fn upload(
    conn: &Connection,
    files: &dyn FileStore,
    actor: &Actor,
    solution: &Solution,
    file: Option<SolutionFile>,
    visibility: Visibility,
) -> Result<Solution> {
    authorize(actor, solution, Action::Upload).into_result()?;

    if !visibility.is_uploaded() {
        return Err(Error::InvalidInput(
            "an upload must be private or public".to_string(),
        ));
    }

    let repo = LibSqlLeaderboardRepository::new(conn);
    let file = file.filter(|file| !file.bytes.is_empty());

    let Some(file) = file else {
        if !solution.visibility.is_uploaded() {
            return Err(Error::MissingFile);
        }
        let updated = repo.set_solution_upload(solution.id, visibility, None).await?;
        tracing::info!(
            solution_id = solution.id.get(),
            "Changed visibility of {} to {visibility}",
            solution.puzzle
        );
        return Ok(updated);
    };

    let display_name = sanitize_file_name(&file.name);
    let previous = if solution.visibility.is_uploaded() {
        files.get(solution.id)?
    } else {
        None
    };
    files.put(solution.id, &file.bytes)?;

    match repo
        .set_solution_upload(solution.id, visibility, Some(&display_name))
        .await
    {
        Ok(updated) => {
            tracing::info!(
                solution_id = solution.id.get(),
                bytes = file.bytes.len(),
                "Stored {display_name} for {} as {visibility}",
                solution.puzzle
            );
            Ok(updated)
        }
        Err(error) => {
            // The row is unchanged, so the file must be too.
            let restored = match &previous {
                Some(bytes) => files.put(solution.id, bytes),
                None => files.delete(solution.id),
            };
            if let Err(cleanup) = restored {
                tracing::warn!(
                    "Failed to restore file of solution {} after error: {cleanup}",
                    solution.id
                );
            }
            Err(error)
        }
    }
}

/// Withdraw an upload, resetting the slot to `NotUploaded`.
///
/// The state change always wins; deleting the file is best-effort.
pub async fn retract(
    conn: &Connection,
    files: &dyn FileStore,
    actor: &Actor,
    solution: &Solution,
) -> Result<Solution> {
    authorize(actor, solution, Action::Retract).into_result()?;

    if !solution.visibility.is_uploaded() {
        return Err(Error::Denied(Denial::NotUploaded));
    }

    let repo = LibSqlLeaderboardRepository::new(conn);
    let updated = repo.clear_solution_upload(solution.id).await?;

    if let Err(error) = files.delete(solution.id) {
        tracing::warn!("Failed to delete file of solution {}: {error}", solution.id);
    }

    tracing::info!(
        solution_id = solution.id.get(),
        "Retracted solution for {}",
        solution.puzzle
    );
    Ok(updated)
}

/// Read the uploaded file of `solution` on behalf of `actor`
pub fn download(files: &dyn FileStore, actor: &Actor, solution: &Solution) -> Result<SolutionFile> {
    authorize(actor, solution, Action::Download).into_result()?;

    let bytes = files
        .get(solution.id)?
        .ok_or_else(|| Error::NotFound(format!("file of solution {}", solution.id)))?;
    let name = solution
        .file_name
        .clone()
        .unwrap_or_else(|| solution.id.storage_key());

    Ok(SolutionFile { name, bytes })
}
