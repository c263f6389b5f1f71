//! Runtime configuration loaded from environment variables.

use std::env;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::snapshot::{FetchMode, SnapshotSource, DEFAULT_API_BASE_URL};
use crate::util::{is_http_url, normalize_text_option, parse_flag};
use crate::{Error, Result};

const ENV_SESSION: &str = "AOC_SESSION";
const ENV_YEAR: &str = "AOC_YEAR";
const ENV_LEADERBOARD: &str = "AOC_LEADERBOARD";
const ENV_OFFLINE: &str = "AOC_OFFLINE";
const ENV_DATA_DIR: &str = "AOC_SHARE_DATA_DIR";
const ENV_API_BASE_URL: &str = "AOC_API_BASE_URL";

const DATABASE_FILE_NAME: &str = "aoc_share.db";
const SOLUTIONS_DIR_NAME: &str = "solutions";
const CACHE_FILE_NAME: &str = "data.json";

/// Application configuration
#[derive(Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Directory holding the database, solution files and snapshot cache.
    pub data_dir: PathBuf,
    /// Event year of the private leaderboard.
    pub year: Option<u16>,
    /// Private leaderboard id.
    pub leaderboard_id: Option<u64>,
    /// Session cookie for the leaderboard API.
    pub session: Option<String>,
    /// Prefer the cached snapshot over live fetches.
    pub offline: bool,
    pub api_base_url: String,
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("AppConfig")
            .field("data_dir", &self.data_dir)
            .field("year", &self.year)
            .field("leaderboard_id", &self.leaderboard_id)
            .field("session", &self.session.as_ref().map(|_| "[REDACTED]"))
            .field("offline", &self.offline)
            .field("api_base_url", &self.api_base_url)
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// `default_data_dir` is used when `AOC_SHARE_DATA_DIR` is unset.
    pub fn from_env(default_data_dir: impl Into<PathBuf>) -> Result<Self> {
        parse_config(|key| env::var(key).ok(), default_data_dir.into())
    }

    /// Configuration with no remote leaderboard, rooted at `data_dir`.
    pub fn local(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            year: None,
            leaderboard_id: None,
            session: None,
            offline: true,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
        }
    }

    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(DATABASE_FILE_NAME)
    }

    #[must_use]
    pub fn solutions_dir(&self) -> PathBuf {
        self.data_dir.join(SOLUTIONS_DIR_NAME)
    }

    #[must_use]
    pub fn cache_path(&self) -> PathBuf {
        self.data_dir.join(CACHE_FILE_NAME)
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Mode used for startup population and default syncs.
    pub const fn fetch_mode(&self) -> FetchMode {
        if self.offline {
            FetchMode::Cached
        } else {
            FetchMode::Live
        }
    }

    /// Snapshot source for this configuration.
    ///
    /// Offline setups keep the cache fresh after explicit live syncs; online
    /// setups only seed it when cached mode has to fall back to the API.
    pub fn snapshot_source(&self) -> SnapshotSource {
        SnapshotSource {
            api_base_url: self.api_base_url.clone(),
            year: self.year,
            leaderboard_id: self.leaderboard_id,
            session: self.session.clone(),
            cache_path: self.cache_path(),
            remote_fallback: true,
            persist_live: self.offline,
        }
    }
}

fn parse_config(
    lookup: impl Fn(&str) -> Option<String>,
    default_data_dir: PathBuf,
) -> Result<AppConfig> {
    let session = normalize_text_option(lookup(ENV_SESSION));
    let year = normalize_text_option(lookup(ENV_YEAR))
        .map(|value| parse_number::<u16>(ENV_YEAR, &value))
        .transpose()?;
    let leaderboard_id = normalize_text_option(lookup(ENV_LEADERBOARD))
        .map(|value| parse_number::<u64>(ENV_LEADERBOARD, &value))
        .transpose()?;

    match (year, leaderboard_id) {
        (Some(_), None) => {
            return Err(Error::InvalidInput(format!(
                "Leaderboard configuration is incomplete. Missing: {ENV_LEADERBOARD}"
            )));
        }
        (None, Some(_)) => {
            return Err(Error::InvalidInput(format!(
                "Leaderboard configuration is incomplete. Missing: {ENV_YEAR}"
            )));
        }
        _ => {}
    }

    let offline = lookup(ENV_OFFLINE).is_some_and(|value| parse_flag(&value));
    let data_dir = normalize_text_option(lookup(ENV_DATA_DIR))
        .map_or(default_data_dir, PathBuf::from);

    let api_base_url = match normalize_text_option(lookup(ENV_API_BASE_URL)) {
        Some(url) if is_http_url(&url) => url.trim_end_matches('/').to_string(),
        Some(_) => {
            return Err(Error::InvalidInput(format!(
                "{ENV_API_BASE_URL} must start with http:// or https://"
            )));
        }
        None => DEFAULT_API_BASE_URL.to_string(),
    };

    Ok(AppConfig {
        data_dir,
        year,
        leaderboard_id,
        session,
        offline,
        api_base_url,
    })
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| Error::InvalidInput(format!("{key} must be a number, got {value:?}")))
}
