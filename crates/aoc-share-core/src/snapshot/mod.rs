//! Leaderboard snapshots: the payload of the private leaderboard API and the
//! fetcher that obtains it.

mod fetcher;

pub use fetcher::{FetchMode, SnapshotFetcher, SnapshotSource, DEFAULT_API_BASE_URL};

use std::collections::{BTreeMap, BTreeSet};

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::models::{Puzzle, UserId};

/// One member of a leaderboard snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub id: UserId,
    pub username: String,
    pub points: i64,
    pub completed: BTreeSet<Puzzle>,
}

/// A point-in-time read of the leaderboard, keyed by member id
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub members: BTreeMap<UserId, Member>,
}

impl Snapshot {
    pub fn member(&self, id: UserId) -> Option<&Member> {
        self.members.get(&id)
    }
}

/// Parse a leaderboard payload.
///
/// Public so payloads can be checked without network access.
pub fn parse_snapshot(payload: &str) -> Result<Snapshot> {
    let raw: RawLeaderboard = serde_json::from_str(payload)
        .map_err(|error| Error::Remote(format!("invalid leaderboard JSON: {error}")))?;
    raw.try_into()
}

// ---------------------------------------------------------------------------
// Private
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct RawLeaderboard {
    members: BTreeMap<String, RawMember>,
}

#[derive(Debug, Deserialize)]
struct RawMember {
    id: RawId,
    name: Option<String>,
    local_score: i64,
    #[serde(default)]
    completion_day_level: BTreeMap<String, BTreeMap<String, serde_json::Value>>,
}

/// Member ids have been served both as numbers and as strings.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawId {
    Number(i64),
    Text(String),
}

impl RawId {
    fn into_user_id(self) -> Result<UserId> {
        match self {
            Self::Number(id) => Ok(UserId::new(id)),
            Self::Text(text) => text
                .parse()
                .map_err(|_| Error::Remote(format!("invalid member id: {text:?}"))),
        }
    }
}

impl TryFrom<RawLeaderboard> for Snapshot {
    type Error = Error;

    fn try_from(raw: RawLeaderboard) -> Result<Self> {
        let mut members = BTreeMap::new();

        for (key, raw_member) in raw.members {
            let member = Member::try_from(raw_member)?;
            if key.trim() != member.id.to_string() {
                return Err(Error::Remote(format!(
                    "member key {key:?} does not match id {}",
                    member.id
                )));
            }
            members.insert(member.id, member);
        }

        Ok(Self { members })
    }
}

impl TryFrom<RawMember> for Member {
    type Error = Error;

    fn try_from(raw: RawMember) -> Result<Self> {
        let id = raw.id.into_user_id()?;
        let username = raw
            .name
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| id.anonymous_name());

        let mut completed = BTreeSet::new();
        for (day, parts) in raw.completion_day_level {
            let day = parse_level(&day, "day")?;
            for part in parts.keys() {
                let part = parse_level(part, "part")?;
                let puzzle = Puzzle::new(day, part)
                    .map_err(|error| Error::Remote(format!("member {id}: {error}")))?;
                completed.insert(puzzle);
            }
        }

        Ok(Self {
            id,
            username,
            points: raw.local_score,
            completed,
        })
    }
}

fn parse_level(value: &str, what: &str) -> Result<u8> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::Remote(format!("invalid {what} key: {value:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn puzzle(day: u8, part: u8) -> Puzzle {
        Puzzle::new(day, part).unwrap()
    }

    #[test]
    fn parses_members_and_completions() {
        let payload = r#"{
            "event": "2024",
            "owner_id": 1,
            "members": {
                "1": {
                    "id": 1,
                    "name": "alice",
                    "local_score": 10,
                    "stars": 3,
                    "completion_day_level": {
                        "1": {"1": {"get_star_ts": 1}, "2": {"get_star_ts": 2}},
                        "2": {"1": {"get_star_ts": 3}}
                    }
                },
                "2": {
                    "id": "2",
                    "name": "bob",
                    "local_score": 0,
                    "completion_day_level": {}
                }
            }
        }"#;

        let snapshot = parse_snapshot(payload).unwrap();
        assert_eq!(snapshot.members.len(), 2);

        let alice = snapshot.member(UserId::new(1)).unwrap();
        assert_eq!(alice.username, "alice");
        assert_eq!(alice.points, 10);
        assert_eq!(
            alice.completed.iter().copied().collect::<Vec<_>>(),
            vec![puzzle(1, 1), puzzle(1, 2), puzzle(2, 1)]
        );

        let bob = snapshot.member(UserId::new(2)).unwrap();
        assert!(bob.completed.is_empty());
    }

    #[test]
    fn anonymous_members_get_a_stable_name() {
        let payload = r#"{"members": {"42": {"id": 42, "name": null, "local_score": 3}}}"#;
        let snapshot = parse_snapshot(payload).unwrap();
        assert_eq!(
            snapshot.member(UserId::new(42)).unwrap().username,
            "anonymous user #42"
        );
    }

    #[test]
    fn rejects_out_of_calendar_levels() {
        let payload = r#"{"members": {"1": {"id": 1, "name": "a", "local_score": 0,
            "completion_day_level": {"26": {"1": {}}}}}}"#;
        assert!(matches!(parse_snapshot(payload), Err(Error::Remote(_))));

        let payload = r#"{"members": {"1": {"id": 1, "name": "a", "local_score": 0,
            "completion_day_level": {"3": {"x": {}}}}}}"#;
        assert!(matches!(parse_snapshot(payload), Err(Error::Remote(_))));
    }

    #[test]
    fn rejects_malformed_payloads() {
        assert!(matches!(parse_snapshot("<html>"), Err(Error::Remote(_))));
        assert!(matches!(parse_snapshot(r#"{"event": "2024"}"#), Err(Error::Remote(_))));
        assert!(matches!(
            parse_snapshot(r#"{"members": {"1": {"id": 2, "name": "a", "local_score": 0}}}"#),
            Err(Error::Remote(_))
        ));
    }
}
