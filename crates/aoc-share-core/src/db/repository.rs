//! Leaderboard repository implementation

use crate::error::{Error, Result};
use crate::models::{Puzzle, Solution, SolutionId, Update, User, UserId, Visibility};
use libsql::{params, Connection, Row};

const SOLUTION_COLUMNS: &str = "s.id, s.author_id, s.day, s.part, s.visibility, s.file_name";

/// Whether an upsert created a new member row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    Updated,
}

/// Trait for leaderboard storage operations (async)
#[allow(async_fn_in_trait)]
pub trait LeaderboardRepository {
    /// Append an entry to the sync log
    async fn insert_update(&self, data: &str) -> Result<Update>;

    /// Most recent sync log entry, if any
    async fn latest_update(&self) -> Result<Option<Update>>;

    /// Sync log, newest first
    async fn list_updates(&self, limit: usize) -> Result<Vec<Update>>;

    /// Get a member by external id
    async fn get_user(&self, id: UserId) -> Result<Option<User>>;

    /// Get a member by username
    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>>;

    /// Insert or overwrite a member's username, points and sync marker
    async fn upsert_user(
        &self,
        id: UserId,
        username: &str,
        points: i64,
        update_id: i64,
    ) -> Result<UpsertOutcome>;

    /// Move a member's username out of the way so another member can take it.
    /// The member is left with its anonymous name until it is renamed again.
    async fn release_username(&self, id: UserId) -> Result<()>;

    /// Members by points descending, ties in arrival order
    async fn list_leaderboard(&self) -> Result<Vec<User>>;

    /// Insert an empty slot for `(author, puzzle)` unless one exists.
    /// Returns `true` when a row was inserted.
    async fn ensure_solution(&self, author: UserId, puzzle: Puzzle) -> Result<bool>;

    /// Get a solution slot by id
    async fn get_solution(&self, id: SolutionId) -> Result<Option<Solution>>;

    /// Get the slot of `author` for `puzzle`
    async fn find_solution(&self, author: UserId, puzzle: Puzzle) -> Result<Option<Solution>>;

    /// All slots of a member, ordered by day and part
    async fn list_solutions_by_author(&self, author: UserId) -> Result<Vec<Solution>>;

    /// All slots for a puzzle part with their author's username, by username
    async fn list_solutions_for_puzzle(&self, puzzle: Puzzle) -> Result<Vec<(String, Solution)>>;

    /// Record an upload. A `None` file name keeps the stored one.
    async fn set_solution_upload(
        &self,
        id: SolutionId,
        visibility: Visibility,
        file_name: Option<&str>,
    ) -> Result<Solution>;

    /// Reset a slot to `NotUploaded` and forget its file name
    async fn clear_solution_upload(&self, id: SolutionId) -> Result<Solution>;
}

/// libSQL implementation of `LeaderboardRepository`
pub struct LibSqlLeaderboardRepository<'a> {
    conn: &'a Connection,
}

impl<'a> LibSqlLeaderboardRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn parse_update(row: &Row) -> Result<Update> {
        Ok(Update {
            id: row.get(0)?,
            data: row.get(1)?,
            created_at: row.get(2)?,
        })
    }

    fn parse_user(row: &Row) -> Result<User> {
        Ok(User {
            id: UserId::new(row.get(0)?),
            username: row.get(1)?,
            points: row.get(2)?,
            last_update_id: row.get(3)?,
        })
    }

    fn parse_solution(row: &Row) -> Result<Solution> {
        let day = u8::try_from(row.get::<i64>(2)?)
            .map_err(|_| Error::Database("Solution day out of range".into()))?;
        let part = u8::try_from(row.get::<i64>(3)?)
            .map_err(|_| Error::Database("Solution part out of range".into()))?;

        Ok(Solution {
            id: SolutionId::new(row.get(0)?),
            author_id: UserId::new(row.get(1)?),
            puzzle: Puzzle::new(day, part)?,
            visibility: Visibility::from_code(row.get(4)?)?,
            file_name: row.get(5)?,
        })
    }

    async fn query_user(&self, sql: &str, params: impl libsql::params::IntoParams) -> Result<Option<User>> {
        let mut rows = self.conn.query(sql, params).await?;
        match rows.next().await? {
            Some(row) => Ok(Some(Self::parse_user(&row)?)),
            None => Ok(None),
        }
    }

    async fn query_solution(
        &self,
        sql: &str,
        params: impl libsql::params::IntoParams,
    ) -> Result<Option<Solution>> {
        let mut rows = self.conn.query(sql, params).await?;
        match rows.next().await? {
            Some(row) => Ok(Some(Self::parse_solution(&row)?)),
            None => Ok(None),
        }
    }

    async fn require_solution(&self, id: SolutionId) -> Result<Solution> {
        self.get_solution(id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("solution {id}")))
    }
}

impl LeaderboardRepository for LibSqlLeaderboardRepository<'_> {
    async fn insert_update(&self, data: &str) -> Result<Update> {
        let now = chrono::Utc::now().timestamp_millis();
        let mut rows = self
            .conn
            .query(
                "INSERT INTO updates (data, created_at) VALUES (?, ?) RETURNING id, data, created_at",
                params![data, now],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Self::parse_update(&row),
            None => Err(Error::Database("Insert into updates returned no row".into())),
        }
    }

    async fn latest_update(&self) -> Result<Option<Update>> {
        Ok(self.list_updates(1).await?.into_iter().next())
    }

    async fn list_updates(&self, limit: usize) -> Result<Vec<Update>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let mut rows = self
            .conn
            .query(
                "SELECT id, data, created_at FROM updates ORDER BY id DESC LIMIT ?",
                params![limit],
            )
            .await?;

        let mut updates = Vec::new();
        while let Some(row) = rows.next().await? {
            updates.push(Self::parse_update(&row)?);
        }
        Ok(updates)
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>> {
        self.query_user(
            "SELECT id, username, points, last_update_id FROM users WHERE id = ?",
            params![id.get()],
        )
        .await
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.query_user(
            "SELECT id, username, points, last_update_id FROM users WHERE username = ?",
            params![username],
        )
        .await
    }

    async fn upsert_user(
        &self,
        id: UserId,
        username: &str,
        points: i64,
        update_id: i64,
    ) -> Result<UpsertOutcome> {
        let existed = self.get_user(id).await?.is_some();

        self.conn
            .execute(
                "INSERT INTO users (id, username, points, last_update_id) VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(id) DO UPDATE SET
                     username = excluded.username,
                     points = excluded.points,
                     last_update_id = excluded.last_update_id",
                params![id.get(), username, points, update_id],
            )
            .await?;

        Ok(if existed {
            UpsertOutcome::Updated
        } else {
            UpsertOutcome::Created
        })
    }

    async fn release_username(&self, id: UserId) -> Result<()> {
        self.conn
            .execute(
                "UPDATE users SET username = ? WHERE id = ?",
                params![id.anonymous_name(), id.get()],
            )
            .await?;
        Ok(())
    }

    async fn list_leaderboard(&self) -> Result<Vec<User>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, username, points, last_update_id FROM users ORDER BY points DESC, seq ASC",
                (),
            )
            .await?;

        let mut users = Vec::new();
        while let Some(row) = rows.next().await? {
            users.push(Self::parse_user(&row)?);
        }
        Ok(users)
    }

    async fn ensure_solution(&self, author: UserId, puzzle: Puzzle) -> Result<bool> {
        let inserted = self
            .conn
            .execute(
                "INSERT INTO solutions (author_id, day, part, visibility, file_name)
                 VALUES (?, ?, ?, 0, NULL)
                 ON CONFLICT(author_id, day, part) DO NOTHING",
                params![
                    author.get(),
                    i64::from(puzzle.day()),
                    i64::from(puzzle.part())
                ],
            )
            .await?;
        Ok(inserted > 0)
    }

    async fn get_solution(&self, id: SolutionId) -> Result<Option<Solution>> {
        self.query_solution(
            &format!("SELECT {SOLUTION_COLUMNS} FROM solutions s WHERE s.id = ?"),
            params![id.get()],
        )
        .await
    }

    async fn find_solution(&self, author: UserId, puzzle: Puzzle) -> Result<Option<Solution>> {
        self.query_solution(
            &format!(
                "SELECT {SOLUTION_COLUMNS} FROM solutions s
                 WHERE s.author_id = ? AND s.day = ? AND s.part = ?"
            ),
            params![
                author.get(),
                i64::from(puzzle.day()),
                i64::from(puzzle.part())
            ],
        )
        .await
    }

    async fn list_solutions_by_author(&self, author: UserId) -> Result<Vec<Solution>> {
        let mut rows = self
            .conn
            .query(
                &format!(
                    "SELECT {SOLUTION_COLUMNS} FROM solutions s
                     WHERE s.author_id = ?
                     ORDER BY s.day ASC, s.part ASC"
                ),
                params![author.get()],
            )
            .await?;

        let mut solutions = Vec::new();
        while let Some(row) = rows.next().await? {
            solutions.push(Self::parse_solution(&row)?);
        }
        Ok(solutions)
    }

    async fn list_solutions_for_puzzle(&self, puzzle: Puzzle) -> Result<Vec<(String, Solution)>> {
        let mut rows = self
            .conn
            .query(
                &format!(
                    "SELECT {SOLUTION_COLUMNS}, u.username
                     FROM solutions s
                     JOIN users u ON u.id = s.author_id
                     WHERE s.day = ? AND s.part = ?
                     ORDER BY u.username ASC"
                ),
                params![i64::from(puzzle.day()), i64::from(puzzle.part())],
            )
            .await?;

        let mut solutions = Vec::new();
        while let Some(row) = rows.next().await? {
            let username: String = row.get(6)?;
            solutions.push((username, Self::parse_solution(&row)?));
        }
        Ok(solutions)
    }

    async fn set_solution_upload(
        &self,
        id: SolutionId,
        visibility: Visibility,
        file_name: Option<&str>,
    ) -> Result<Solution> {
        let rows = self
            .conn
            .execute(
                "UPDATE solutions SET visibility = ?, file_name = COALESCE(?, file_name) WHERE id = ?",
                params![visibility.code(), file_name.map(str::to_string), id.get()],
            )
            .await?;

        if rows == 0 {
            return Err(Error::NotFound(format!("solution {id}")));
        }
        self.require_solution(id).await
    }

    async fn clear_solution_upload(&self, id: SolutionId) -> Result<Solution> {
        let rows = self
            .conn
            .execute(
                "UPDATE solutions SET visibility = ?, file_name = NULL WHERE id = ?",
                params![Visibility::NotUploaded.code(), id.get()],
            )
            .await?;

        if rows == 0 {
            return Err(Error::NotFound(format!("solution {id}")));
        }
        self.require_solution(id).await
    }
}
