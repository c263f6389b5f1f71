//! Thread-safe facade over the store, the file store and the solution rules.

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;

use crate::access::{authorize, Action, Actor, Decision, Denial};
use crate::config::AppConfig;
use crate::db::{Database, LeaderboardRepository, LibSqlLeaderboardRepository};
use crate::error::{Error, Result};
use crate::models::{validate_day, Puzzle, Solution, SolutionId, Update, User, Visibility, PARTS};
use crate::reconcile::{reconcile, ReconcileReport};
use crate::snapshot::{FetchMode, Snapshot, SnapshotFetcher};
use crate::solutions::{self, SolutionFile};
use crate::storage::{FileStore, LocalFileStore};

/// Sync log label of the pass that populates an empty store
pub const STARTUP_UPDATE_LABEL: &str = "Server started";

/// One row of the points leaderboard
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeaderboardEntry {
    pub username: String,
    pub points: i64,
}

/// One member's slot in a day listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayEntry {
    pub username: String,
    pub visibility: Visibility,
    /// `0` while nothing is uploaded
    pub solution_id: i64,
}

/// Every member's slot for both parts of a day, by username
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayListing {
    pub day: u8,
    pub part_1: Vec<DayEntry>,
    pub part_2: Vec<DayEntry>,
}

impl DayListing {
    pub fn part(&self, part: u8) -> &[DayEntry] {
        if part == 1 {
            &self.part_1
        } else {
            &self.part_2
        }
    }
}

/// Serializes every write (reconciliation passes and solution transitions)
/// behind one lock so a transition's file and row change together.
#[derive(Clone)]
pub struct ShareService {
    db: Arc<Mutex<Database>>,
    files: Arc<dyn FileStore>,
}

impl ShareService {
    /// Open the database and solution directory described by `config`.
    pub async fn open(config: &AppConfig) -> Result<Self> {
        let files = LocalFileStore::open(config.solutions_dir())?;
        Self::open_path(config.database_path(), Arc::new(files)).await
    }

    /// Open a service over the database at `db_path`.
    pub async fn open_path(db_path: impl Into<PathBuf>, files: Arc<dyn FileStore>) -> Result<Self> {
        let db_path = db_path.into();
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let db = Database::open(&db_path).await?;
        tracing::debug!("Opened database at {}", db_path.display());
        Ok(Self {
            db: Arc::new(Mutex::new(db)),
            files,
        })
    }

    /// Open an in-memory service (primarily for tests).
    pub async fn open_in_memory(files: Arc<dyn FileStore>) -> Result<Self> {
        let db = Database::open_in_memory().await?;
        Ok(Self {
            db: Arc::new(Mutex::new(db)),
            files,
        })
    }

    /// Whether at least one reconciliation pass has run.
    pub async fn is_populated(&self) -> Result<bool> {
        let db = self.db.lock().await;
        let repo = LibSqlLeaderboardRepository::new(db.connection());
        Ok(repo.latest_update().await?.is_some())
    }

    /// Populate an empty store with one fetch and reconciliation pass.
    ///
    /// Returns `None` when the store already holds data.
    pub async fn initialize(
        &self,
        fetcher: &SnapshotFetcher,
        mode: FetchMode,
    ) -> Result<Option<ReconcileReport>> {
        if self.is_populated().await? {
            tracing::debug!("Store already populated, skipping initial sync");
            return Ok(None);
        }

        let snapshot = fetcher.fetch(mode).await?;

        let db = self.db.lock().await;
        let repo = LibSqlLeaderboardRepository::new(db.connection());
        if repo.latest_update().await?.is_some() {
            return Ok(None);
        }
        reconcile(db.connection(), &snapshot, STARTUP_UPDATE_LABEL)
            .await
            .map(Some)
    }

    /// Fetch a snapshot and reconcile it, recording the pass as `label`.
    pub async fn sync(
        &self,
        fetcher: &SnapshotFetcher,
        mode: FetchMode,
        label: &str,
    ) -> Result<ReconcileReport> {
        let snapshot = fetcher.fetch(mode).await?;
        self.apply_snapshot(&snapshot, label).await
    }

    /// Reconcile an already obtained snapshot.
    pub async fn apply_snapshot(&self, snapshot: &Snapshot, label: &str) -> Result<ReconcileReport> {
        let db = self.db.lock().await;
        reconcile(db.connection(), snapshot, label).await
    }

    /// Members by points descending, ties in arrival order.
    pub async fn leaderboard(&self) -> Result<Vec<LeaderboardEntry>> {
        let db = self.db.lock().await;
        let repo = LibSqlLeaderboardRepository::new(db.connection());
        Ok(repo
            .list_leaderboard()
            .await?
            .into_iter()
            .map(|user| LeaderboardEntry {
                username: user.username,
                points: user.points,
            })
            .collect())
    }

    /// Slots of every member who completed a part of `day`.
    pub async fn day_listing(&self, day: u8) -> Result<DayListing> {
        validate_day(day)?;

        let db = self.db.lock().await;
        let repo = LibSqlLeaderboardRepository::new(db.connection());

        let mut parts = Vec::with_capacity(PARTS.len());
        for part in PARTS {
            let entries = repo
                .list_solutions_for_puzzle(Puzzle::new(day, part)?)
                .await?
                .into_iter()
                .map(|(username, solution)| DayEntry {
                    username,
                    visibility: solution.visibility,
                    solution_id: if solution.visibility.is_uploaded() {
                        solution.id.get()
                    } else {
                        0
                    },
                })
                .collect::<Vec<_>>();
            parts.push(entries);
        }

        let part_2 = parts.pop().unwrap_or_default();
        let part_1 = parts.pop().unwrap_or_default();
        Ok(DayListing {
            day,
            part_1,
            part_2,
        })
    }

    /// Look up a member by username.
    pub async fn find_user(&self, username: &str) -> Result<Option<User>> {
        let db = self.db.lock().await;
        let repo = LibSqlLeaderboardRepository::new(db.connection());
        repo.get_user_by_username(username).await
    }

    /// Sync log, newest first.
    pub async fn updates(&self, limit: usize) -> Result<Vec<Update>> {
        let db = self.db.lock().await;
        let repo = LibSqlLeaderboardRepository::new(db.connection());
        repo.list_updates(limit).await
    }

    /// Fetch a solution slot by id.
    pub async fn solution(&self, id: SolutionId) -> Result<Solution> {
        let db = self.db.lock().await;
        let repo = LibSqlLeaderboardRepository::new(db.connection());
        require_solution(&repo, id).await
    }

    /// All slots unlocked by `username`.
    pub async fn own_solutions(&self, username: &str) -> Result<Vec<Solution>> {
        let db = self.db.lock().await;
        let repo = LibSqlLeaderboardRepository::new(db.connection());
        let user = require_user(&repo, username).await?;
        repo.list_solutions_by_author(user.id).await
    }

    /// The slot of `username` for `puzzle`; denied until the part is completed.
    pub async fn own_solution(&self, username: &str, puzzle: Puzzle) -> Result<Solution> {
        let db = self.db.lock().await;
        let repo = LibSqlLeaderboardRepository::new(db.connection());
        let user = require_user(&repo, username).await?;
        repo.find_solution(user.id, puzzle)
            .await?
            .ok_or(Error::Denied(Denial::NotUnlocked))
    }

    /// Decide whether `username` may perform `action` on a solution.
    pub async fn authorize(
        &self,
        username: &str,
        solution_id: SolutionId,
        action: Action,
    ) -> Result<Decision> {
        let db = self.db.lock().await;
        let repo = LibSqlLeaderboardRepository::new(db.connection());
        let actor = load_actor(&repo, username).await?;
        let solution = require_solution(&repo, solution_id).await?;
        Ok(authorize(&actor, &solution, action))
    }

    /// Upload a file or change visibility on behalf of `username`.
    pub async fn upload(
        &self,
        username: &str,
        solution_id: SolutionId,
        file: Option<SolutionFile>,
        visibility: Visibility,
    ) -> Result<Solution> {
        let db = self.db.lock().await;
        let repo = LibSqlLeaderboardRepository::new(db.connection());
        let actor = load_actor(&repo, username).await?;
        let solution = require_solution(&repo, solution_id).await?;
        solutions::upload(
            db.connection(),
            self.files.as_ref(),
            &actor,
            &solution,
            file,
            visibility,
        )
        .await
    }

    /// Withdraw an upload on behalf of `username`.
    pub async fn retract(&self, username: &str, solution_id: SolutionId) -> Result<Solution> {
        let db = self.db.lock().await;
        let repo = LibSqlLeaderboardRepository::new(db.connection());
        let actor = load_actor(&repo, username).await?;
        let solution = require_solution(&repo, solution_id).await?;
        solutions::retract(db.connection(), self.files.as_ref(), &actor, &solution).await
    }

    /// Read an uploaded file on behalf of `username`.
    pub async fn download(&self, username: &str, solution_id: SolutionId) -> Result<SolutionFile> {
        let db = self.db.lock().await;
        let repo = LibSqlLeaderboardRepository::new(db.connection());
        let actor = load_actor(&repo, username).await?;
        let solution = require_solution(&repo, solution_id).await?;
        solutions::download(self.files.as_ref(), &actor, &solution)
    }
}

async fn require_user(repo: &LibSqlLeaderboardRepository<'_>, username: &str) -> Result<User> {
    repo.get_user_by_username(username)
        .await?
        .ok_or_else(|| Error::NotFound(format!("user {username:?}")))
}

async fn require_solution(
    repo: &LibSqlLeaderboardRepository<'_>,
    id: SolutionId,
) -> Result<Solution> {
    repo.get_solution(id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("solution {id}")))
}

async fn load_actor(repo: &LibSqlLeaderboardRepository<'_>, username: &str) -> Result<Actor> {
    let user = require_user(repo, username).await?;
    let completed = repo
        .list_solutions_by_author(user.id)
        .await?
        .into_iter()
        .map(|solution| solution.puzzle);
    Ok(Actor::new(user.id, completed))
}
