//! Shared utility functions used across multiple modules.

use std::fs;
use std::io::Write;
use std::path::Path;

use uuid::Uuid;

/// Normalize optional text by trimming whitespace and removing empties.
///
/// Returns `None` when the input is `None` or the trimmed value is empty.
pub fn normalize_text_option(value: Option<String>) -> Option<String> {
    let value = value?;
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Check if a string starts with `http://` or `https://`.
pub fn is_http_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}

/// Truncate text to at most 180 characters for error messages.
pub fn compact_text(value: &str) -> String {
    value.trim().chars().take(180).collect()
}

/// Interpret common truthy spellings (`1`, `true`, `yes`, `on`).
pub fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Replace `path` with `bytes` so readers never observe a partial write.
pub fn write_atomically(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    let file_name = path
        .file_name()
        .map_or_else(String::new, |name| name.to_string_lossy().to_string());
    let tmp_path = parent.join(format!(".{file_name}.{}.tmp", Uuid::now_v7()));

    let result = write_and_sync(&tmp_path, bytes).and_then(|()| fs::rename(&tmp_path, path));
    if result.is_err() {
        fs::remove_file(&tmp_path).ok();
    }
    result
}

fn write_and_sync(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}
