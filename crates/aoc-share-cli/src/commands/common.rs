use std::path::PathBuf;

use aoc_share_core::config::AppConfig;
use aoc_share_core::services::{DayListing, LeaderboardEntry, ShareService};
use aoc_share_core::snapshot::SnapshotFetcher;
use aoc_share_core::{SolutionId, Update, Visibility};
use serde::Serialize;

use crate::error::CliError;

/// Opened store plus the fetcher configured for it
pub struct AppContext {
    pub config: AppConfig,
    pub service: ShareService,
    pub fetcher: SnapshotFetcher,
}

#[derive(Debug, Serialize)]
pub struct UpdateItem {
    pub id: i64,
    pub data: String,
    pub created_at: i64,
    pub created_at_iso: String,
}

pub fn resolve_config(
    data_dir: Option<PathBuf>,
    offline: bool,
    live: bool,
) -> Result<AppConfig, CliError> {
    let mut config = AppConfig::from_env(default_data_dir())?;
    if let Some(data_dir) = data_dir {
        config.data_dir = data_dir;
    }
    if offline {
        config.offline = true;
    } else if live {
        config.offline = false;
    }
    Ok(config)
}

pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("aoc-share")
}

/// Open the store without populating it.
pub async fn open_context(config: AppConfig) -> Result<AppContext, CliError> {
    let service = ShareService::open(&config).await?;
    let fetcher = SnapshotFetcher::new(config.snapshot_source())?;
    Ok(AppContext {
        config,
        service,
        fetcher,
    })
}

/// Open the store and populate it first if it is still empty.
pub async fn open_initialized_context(config: AppConfig) -> Result<AppContext, CliError> {
    let context = open_context(config).await?;
    if let Some(report) = context
        .service
        .initialize(&context.fetcher, context.config.fetch_mode())
        .await?
    {
        tracing::info!(
            "Populated store with {} members from the leaderboard",
            report.users_created
        );
    }
    Ok(context)
}

pub fn normalize_username(username: &str) -> Result<String, CliError> {
    let username = username.trim();
    if username.is_empty() {
        return Err(CliError::EmptyUsername);
    }
    Ok(username.to_string())
}

pub fn parse_solution_id(raw: i64) -> Result<SolutionId, CliError> {
    if raw <= 0 {
        return Err(CliError::InvalidSolutionId(raw));
    }
    Ok(SolutionId::new(raw))
}

pub fn format_leaderboard_lines(entries: &[LeaderboardEntry]) -> Vec<String> {
    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| format!("{:>3}) {:>5}  {}", index + 1, entry.points, entry.username))
        .collect()
}

pub fn format_day_lines(listing: &DayListing) -> Vec<String> {
    let mut lines = Vec::new();
    for part in [1, 2] {
        lines.push(format!("Day {} part {part}", listing.day));
        let entries = listing.part(part);
        if entries.is_empty() {
            lines.push("  (no one yet)".to_string());
        }
        for entry in entries {
            let status = match entry.visibility {
                Visibility::NotUploaded => "not uploaded".to_string(),
                visibility => format!("{visibility} #{}", entry.solution_id),
            };
            lines.push(format!("  {:<24}  {status}", entry.username));
        }
    }
    lines
}

pub fn update_to_item(update: &Update) -> UpdateItem {
    UpdateItem {
        id: update.id,
        data: update.data.clone(),
        created_at: update.created_at,
        created_at_iso: format_timestamp(update.created_at),
    }
}

pub fn format_update_lines(updates: &[Update]) -> Vec<String> {
    updates
        .iter()
        .map(|update| {
            format!(
                "{:>5}  {}  {}",
                update.id,
                format_timestamp(update.created_at),
                update.data
            )
        })
        .collect()
}

pub fn format_timestamp(timestamp_ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(timestamp_ms).map_or_else(
        || timestamp_ms.to_string(),
        |date_time| date_time.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    )
}

pub fn default_sync_label() -> String {
    format!("Sync at {}", format_timestamp(chrono::Utc::now().timestamp_millis()))
}
