use std::path::PathBuf;

use aoc_share_core::{Action, Visibility};
use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "aoc-share")]
#[command(about = "Share Advent of Code solutions within a private leaderboard")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Directory holding the database, solution files and snapshot cache
    #[arg(long, global = true, value_name = "PATH")]
    pub data_dir: Option<PathBuf>,

    /// Prefer the cached leaderboard snapshot (overrides AOC_OFFLINE)
    #[arg(long, global = true, conflicts_with = "live")]
    pub offline: bool,

    /// Fetch the leaderboard from the API (overrides AOC_OFFLINE)
    #[arg(long, global = true)]
    pub live: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Populate an empty store from the leaderboard
    Init,
    /// Fetch the leaderboard and merge it into the store
    Sync {
        /// Read the cached snapshot instead of calling the API
        #[arg(long)]
        cached: bool,
        /// Label recorded in the sync log
        #[arg(long)]
        label: Option<String>,
    },
    /// Show members ranked by points
    #[command(alias = "lb")]
    Leaderboard {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show every member's solutions for a day
    Day {
        /// Day of the event (1-25)
        day: u8,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Check that a username belongs to the leaderboard
    Login {
        /// Leaderboard username
        username: String,
    },
    /// Upload a solution file or change its visibility
    Upload {
        /// Uploading member
        #[arg(long, short)]
        user: String,
        #[arg(long, short)]
        day: u8,
        #[arg(long, short)]
        part: u8,
        /// Who may read the upload
        #[arg(long, value_enum)]
        visibility: UploadVisibility,
        /// Solution file (omit to only change visibility)
        #[arg(long, short, value_name = "PATH")]
        file: Option<PathBuf>,
    },
    /// Withdraw an uploaded solution
    Retract {
        #[arg(long, short)]
        user: String,
        #[arg(long, short)]
        day: u8,
        #[arg(long, short)]
        part: u8,
    },
    /// Save an uploaded solution to disk or stdout
    Download {
        /// Reading member
        #[arg(long, short)]
        user: String,
        /// Solution id from `aoc-share day`
        solution_id: i64,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
    /// Explain whether a member may act on a solution
    Check {
        #[arg(long, short)]
        user: String,
        solution_id: i64,
        #[arg(long, value_enum, default_value_t = CheckAction::View)]
        action: CheckAction,
    },
    /// Show the sync log, newest first
    Updates {
        /// Number of entries to show
        #[arg(short, long, default_value = "10")]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum UploadVisibility {
    Private,
    Public,
}

impl From<UploadVisibility> for Visibility {
    fn from(value: UploadVisibility) -> Self {
        match value {
            UploadVisibility::Private => Self::Private,
            UploadVisibility::Public => Self::Public,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CheckAction {
    View,
    Download,
    Upload,
    Retract,
}

impl From<CheckAction> for Action {
    fn from(value: CheckAction) -> Self {
        match value {
            CheckAction::View => Self::View,
            CheckAction::Download => Self::Download,
            CheckAction::Upload => Self::Upload,
            CheckAction::Retract => Self::Retract,
        }
    }
}
