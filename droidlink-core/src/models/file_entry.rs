//! Remote filesystem entries

use chrono::DateTime;
use serde::{Deserialize, Serialize};

/// One row of a remote directory listing
///
/// Values are immutable once parsed; every listing request produces a fresh
/// sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    /// Entry name as printed by `ls`
    pub name: String,
    /// Absolute path (parent joined with name)
    pub path: String,
    /// Whether the permission string marks a directory
    pub is_directory: bool,
    /// Size in bytes (0 when not numeric)
    pub size: u64,
    /// Last modification as Unix seconds (0 when the date could not be parsed)
    pub modified: i64,
    /// Permission string, e.g. `-rw-r--r--`
    pub permissions: String,
    /// Owning user
    pub owner: String,
    /// Owning group
    pub group: String,
}

impl FileEntry {
    /// Lower-cased extension, `None` for directories and dot-files
    #[must_use]
    pub fn extension(&self) -> Option<String> {
        if self.is_directory {
            return None;
        }
        let (stem, ext) = self.name.rsplit_once('.')?;
        if stem.is_empty() || ext.is_empty() {
            return None;
        }
        Some(ext.to_lowercase())
    }

    /// Size formatted with a 1024 base
    #[must_use]
    pub fn human_size(&self) -> String {
        format_size(self.size)
    }

    /// Modification time as `YYYY-MM-DD HH:MM`, empty when unknown
    #[must_use]
    pub fn human_modified(&self) -> String {
        if self.modified == 0 {
            return String::new();
        }
        DateTime::from_timestamp(self.modified, 0)
            .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default()
    }
}

/// Formats a byte count for display
#[must_use]
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{bytes} B")
    }
}

/// Joins a remote directory and an entry name with exactly one `/`
#[must_use]
pub fn join_remote_path(dir: &str, name: &str) -> String {
    format!("{}/{}", dir.trim_end_matches('/'), name)
}

/// Returns the parent of a remote path; the root is its own parent
#[must_use]
pub fn parent_remote_path(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    match trimmed.rsplit_once('/') {
        Some(("", _)) | None => "/".to_string(),
        Some((parent, _)) => parent.to_string(),
    }
}
