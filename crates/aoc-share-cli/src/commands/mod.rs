pub mod check;
pub mod common;
pub mod day;
pub mod download;
pub mod init;
pub mod leaderboard;
pub mod login;
pub mod retract;
pub mod sync;
pub mod updates;
pub mod upload;
