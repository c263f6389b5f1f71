//! Merge leaderboard snapshots into the local store.
//!
//! The leaderboard site is authoritative for usernames, points and
//! completions. Everything added locally (uploads, visibility, file names,
//! solution ids) survives every pass. Completions only ever accumulate: a
//! member or slot missing from a later snapshot is kept. A departed member
//! whose username is reported for someone else falls back to its anonymous
//! name.

use libsql::Connection;

use crate::db::{LeaderboardRepository, LibSqlLeaderboardRepository, UpsertOutcome};
use crate::error::{Error, Result};
use crate::models::Update;
use crate::snapshot::Snapshot;

/// What a reconciliation pass changed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Sync log entry written by this pass
    pub update: Update,
    pub users_created: usize,
    pub users_updated: usize,
    pub solutions_unlocked: usize,
}

/// Apply `snapshot` in a single transaction, recording the pass as `label`.
///
/// Either the whole snapshot is applied or nothing is.
pub async fn reconcile(
    conn: &Connection,
    snapshot: &Snapshot,
    label: &str,
) -> Result<ReconcileReport> {
    conn.execute("BEGIN IMMEDIATE", ()).await?;

    let report = match apply(conn, snapshot, label).await {
        Ok(report) => report,
        Err(error) => {
            conn.execute("ROLLBACK", ()).await.ok();
            return Err(error);
        }
    };

    if let Err(error) = conn.execute("COMMIT", ()).await {
        conn.execute("ROLLBACK", ()).await.ok();
        return Err(error.into());
    }

    tracing::info!(
        update_id = report.update.id,
        users_created = report.users_created,
        users_updated = report.users_updated,
        solutions_unlocked = report.solutions_unlocked,
        "Reconciled leaderboard snapshot ({})",
        report.update.data
    );
    Ok(report)
}

async fn apply(conn: &Connection, snapshot: &Snapshot, label: &str) -> Result<ReconcileReport> {
    let repo = LibSqlLeaderboardRepository::new(conn);
    let update = repo.insert_update(label).await?;

    // Renamed members give up their old name first so names can change hands
    // within one snapshot.
    for member in snapshot.members.values() {
        if let Some(user) = repo.get_user(member.id).await? {
            if user.username != member.username {
                repo.release_username(member.id).await?;
            }
        }
    }

    let mut report = ReconcileReport {
        update,
        users_created: 0,
        users_updated: 0,
        solutions_unlocked: 0,
    };

    for member in snapshot.members.values() {
        if let Some(holder) = repo.get_user_by_username(&member.username).await? {
            if holder.id != member.id {
                // A holder still in the snapshot reports the same name itself.
                if snapshot.member(holder.id).is_some() {
                    return Err(Error::InvalidInput(format!(
                        "username {:?} is reported for both member {} and member {}",
                        member.username, holder.id, member.id
                    )));
                }
                tracing::info!(
                    "Member {} left the leaderboard; giving {:?} to member {}",
                    holder.id,
                    member.username,
                    member.id
                );
                repo.release_username(holder.id).await?;
            }
        }

        match repo
            .upsert_user(member.id, &member.username, member.points, report.update.id)
            .await?
        {
            UpsertOutcome::Created => report.users_created += 1,
            UpsertOutcome::Updated => report.users_updated += 1,
        }

        for puzzle in &member.completed {
            if repo.ensure_solution(member.id, *puzzle).await? {
                report.solutions_unlocked += 1;
            }
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::models::{Puzzle, Solution, User, UserId, Visibility};
    use crate::snapshot::Member;
    use pretty_assertions::assert_eq;

    type MemberSpec<'a> = (i64, &'a str, i64, &'a [(u8, u8)]);

    fn snapshot(members: &[MemberSpec<'_>]) -> Snapshot {
        let mut snapshot = Snapshot::default();
        for &(id, username, points, completed) in members {
            let member = Member {
                id: UserId::new(id),
                username: username.to_string(),
                points,
                completed: completed
                    .iter()
                    .map(|&(day, part)| Puzzle::new(day, part).unwrap())
                    .collect(),
            };
            snapshot.members.insert(member.id, member);
        }
        snapshot
    }

    async fn state(conn: &Connection) -> (Vec<User>, Vec<Solution>) {
        let repo = LibSqlLeaderboardRepository::new(conn);
        let users = repo.list_leaderboard().await.unwrap();
        let mut solutions = Vec::new();
        for user in &users {
            solutions.extend(repo.list_solutions_by_author(user.id).await.unwrap());
        }
        (users, solutions)
    }

    fn strip_update_refs(users: Vec<User>) -> Vec<User> {
        users
            .into_iter()
            .map(|user| User {
                last_update_id: None,
                ..user
            })
            .collect()
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_reconcile_into_empty_store() {
        let db = Database::open_in_memory().await.unwrap();
        let conn = db.connection();

        let report = reconcile(conn, &snapshot(&[(1, "alice", 10, &[(1, 1)])]), "Server started")
            .await
            .unwrap();
        assert_eq!(report.users_created, 1);
        assert_eq!(report.users_updated, 0);
        assert_eq!(report.solutions_unlocked, 1);
        assert_eq!(report.update.data, "Server started");

        let (users, solutions) = state(conn).await;
        assert_eq!(
            users,
            vec![User {
                id: UserId::new(1),
                username: "alice".to_string(),
                points: 10,
                last_update_id: Some(report.update.id),
            }]
        );
        assert_eq!(solutions.len(), 1);
        assert_eq!(solutions[0].puzzle, Puzzle::new(1, 1).unwrap());
        assert_eq!(solutions[0].visibility, Visibility::NotUploaded);
        assert_eq!(solutions[0].file_name, None);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_reconcile_is_idempotent() {
        let db = Database::open_in_memory().await.unwrap();
        let conn = db.connection();
        let snap = snapshot(&[
            (1, "alice", 10, &[(1, 1), (1, 2)]),
            (2, "bob", 4, &[(1, 1)]),
        ]);

        reconcile(conn, &snap, "first").await.unwrap();
        let (users_before, solutions_before) = state(conn).await;

        let report = reconcile(conn, &snap, "second").await.unwrap();
        assert_eq!(report.users_created, 0);
        assert_eq!(report.solutions_unlocked, 0);

        let (users_after, solutions_after) = state(conn).await;
        assert_eq!(solutions_after, solutions_before);
        assert_eq!(strip_update_refs(users_after), strip_update_refs(users_before));

        let repo = LibSqlLeaderboardRepository::new(conn);
        let updates = repo.list_updates(10).await.unwrap();
        assert_eq!(updates.len(), 2);
        assert_eq!(updates[0].data, "second");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_reconcile_preserves_uploads() {
        let db = Database::open_in_memory().await.unwrap();
        let conn = db.connection();
        let snap = snapshot(&[(1, "alice", 10, &[(1, 1)])]);
        reconcile(conn, &snap, "first").await.unwrap();

        let repo = LibSqlLeaderboardRepository::new(conn);
        let slot = repo
            .find_solution(UserId::new(1), Puzzle::new(1, 1).unwrap())
            .await
            .unwrap()
            .unwrap();
        let uploaded = repo
            .set_solution_upload(slot.id, Visibility::Public, Some("day1.rs"))
            .await
            .unwrap();

        let superset = snapshot(&[(1, "alice", 30, &[(1, 1), (1, 2), (2, 1)])]);
        let report = reconcile(conn, &superset, "second").await.unwrap();
        assert_eq!(report.solutions_unlocked, 2);

        assert_eq!(repo.get_solution(slot.id).await.unwrap(), Some(uploaded));
        let user = repo.get_user(UserId::new(1)).await.unwrap().unwrap();
        assert_eq!(user.points, 30);
        assert_eq!(user.last_update_id, Some(report.update.id));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_unlocks_never_shrink() {
        let db = Database::open_in_memory().await.unwrap();
        let conn = db.connection();

        reconcile(
            conn,
            &snapshot(&[(1, "alice", 10, &[(1, 1), (2, 1)]), (2, "bob", 3, &[(1, 1)])]),
            "first",
        )
        .await
        .unwrap();
        let (_, before) = state(conn).await;

        // A glitchy snapshot drops bob and one of alice's completions.
        reconcile(conn, &snapshot(&[(1, "alice", 12, &[(1, 1)])]), "glitch")
            .await
            .unwrap();
        let (users, after) = state(conn).await;

        assert_eq!(users.len(), 2);
        assert_eq!(after, before);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_usernames_can_change_hands() {
        let db = Database::open_in_memory().await.unwrap();
        let conn = db.connection();

        reconcile(conn, &snapshot(&[(1, "alice", 1, &[]), (2, "bob", 2, &[])]), "first")
            .await
            .unwrap();
        reconcile(conn, &snapshot(&[(1, "bob", 1, &[]), (2, "alice", 2, &[])]), "swap")
            .await
            .unwrap();

        let repo = LibSqlLeaderboardRepository::new(conn);
        let alice = repo.get_user_by_username("alice").await.unwrap().unwrap();
        let bob = repo.get_user_by_username("bob").await.unwrap().unwrap();
        assert_eq!(alice.id, UserId::new(2));
        assert_eq!(bob.id, UserId::new(1));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_failed_pass_applies_nothing() {
        let db = Database::open_in_memory().await.unwrap();
        let conn = db.connection();
        reconcile(conn, &snapshot(&[(1, "alice", 1, &[(1, 1)]), (2, "bob", 2, &[])]), "first")
            .await
            .unwrap();
        let before = state(conn).await;

        // Two members of one snapshot report the same name.
        let result = reconcile(
            conn,
            &snapshot(&[(1, "alice", 50, &[(1, 1), (1, 2)]), (3, "alice", 9, &[(4, 1)])]),
            "conflict",
        )
        .await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));

        assert_eq!(state(conn).await, before);
        let repo = LibSqlLeaderboardRepository::new(conn);
        assert_eq!(repo.list_updates(10).await.unwrap().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_departed_member_gives_up_username() {
        let db = Database::open_in_memory().await.unwrap();
        let conn = db.connection();
        reconcile(conn, &snapshot(&[(1, "sam", 5, &[(1, 1)]), (2, "kim", 1, &[])]), "first")
            .await
            .unwrap();

        // Member 1 left; a newcomer now goes by "sam".
        let next = snapshot(&[(2, "kim", 4, &[(1, 1)]), (3, "sam", 2, &[])]);
        let report = reconcile(conn, &next, "second").await.unwrap();
        assert_eq!(report.users_created, 1);
        assert_eq!(report.solutions_unlocked, 1);
        reconcile(conn, &next, "third").await.unwrap();

        let repo = LibSqlLeaderboardRepository::new(conn);
        let sam = repo.get_user_by_username("sam").await.unwrap().unwrap();
        assert_eq!(sam.id, UserId::new(3));

        let kim = repo.get_user(UserId::new(2)).await.unwrap().unwrap();
        assert_eq!(kim.points, 4);
        assert_eq!(repo.list_solutions_by_author(kim.id).await.unwrap().len(), 1);

        let departed = repo.get_user(UserId::new(1)).await.unwrap().unwrap();
        assert_eq!(departed.username, "anonymous user #1");
        assert_eq!(departed.points, 5);
        assert_eq!(repo.list_solutions_by_author(departed.id).await.unwrap().len(), 1);
    }
}
