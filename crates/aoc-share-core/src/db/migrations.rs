//! Database migrations

use crate::error::Result;
use libsql::Connection;

/// Current schema version
const CURRENT_VERSION: i32 = 1;

/// Run all pending migrations
pub async fn run(conn: &Connection) -> Result<()> {
    let version = get_version(conn).await?;

    if version < 1 {
        migrate_v1(conn).await?;
    }

    Ok(())
}

/// Get the current schema version
async fn get_version(conn: &Connection) -> Result<i32> {
    let mut rows = conn
        .query(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
            (),
        )
        .await?;

    let exists: bool = if let Some(row) = rows.next().await? {
        row.get::<i32>(0)? != 0
    } else {
        false
    };

    if !exists {
        return Ok(0);
    }

    let mut rows = conn
        .query("SELECT COALESCE(MAX(version), 0) FROM schema_version", ())
        .await?;

    let version: i32 = if let Some(row) = rows.next().await? {
        row.get(0)?
    } else {
        0
    };

    Ok(version)
}

/// Execute `statements` inside one transaction
async fn apply(conn: &Connection, statements: &[&str]) -> Result<()> {
    conn.execute("BEGIN TRANSACTION", ()).await?;

    for stmt in statements {
        if let Err(e) = conn.execute(stmt, ()).await {
            conn.execute("ROLLBACK", ()).await.ok();
            return Err(e.into());
        }
    }

    if let Err(e) = conn.execute("COMMIT", ()).await {
        conn.execute("ROLLBACK", ()).await.ok();
        return Err(e.into());
    }

    Ok(())
}

/// Migration to version 1: leaderboard, solution slots, sync log and indexes
async fn migrate_v1(conn: &Connection) -> Result<()> {
    apply(
        conn,
        &[
            "CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY
            )",
            "CREATE TABLE IF NOT EXISTS updates (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                data TEXT NOT NULL,
                created_at INTEGER NOT NULL
            )",
            // `seq` records arrival order; `id` is the leaderboard site's member id.
            "CREATE TABLE IF NOT EXISTS users (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id INTEGER NOT NULL UNIQUE,
                username TEXT NOT NULL UNIQUE,
                points INTEGER NOT NULL,
                last_update_id INTEGER REFERENCES updates(id)
            )",
            // AUTOINCREMENT keeps solution ids (and therefore file keys) from being reused.
            "CREATE TABLE IF NOT EXISTS solutions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                author_id INTEGER NOT NULL REFERENCES users(id),
                day INTEGER NOT NULL CHECK (day BETWEEN 1 AND 25),
                part INTEGER NOT NULL CHECK (part IN (1, 2)),
                visibility INTEGER NOT NULL DEFAULT 0 CHECK (visibility IN (0, 1, 2)),
                file_name TEXT
            )",
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_solutions_slot ON solutions(author_id, day, part)",
            "CREATE INDEX IF NOT EXISTS idx_solutions_puzzle ON solutions(day, part)",
            "CREATE INDEX IF NOT EXISTS idx_users_points ON users(points DESC, seq ASC)",
            "INSERT INTO schema_version (version) VALUES (1)",
        ],
    )
    .await?;

    tracing::info!("Migrated database to version {CURRENT_VERSION}");
    Ok(())
}
