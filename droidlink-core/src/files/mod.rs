//! Remote filesystem operations
//!
//! Listings are fetched fresh on every call; nothing is cached here.

use std::cmp::Ordering;
use std::path::Path;

use crate::error::{TransportError, TransportResult};
use crate::models::FileEntry;
use crate::parser::parse_listing;
use crate::transport::Transport;

/// Path listed when a device is first selected
pub const ROOT_PATH: &str = "/";

/// Lists `path` on `device`, directories first, then by name.
///
/// `ls` exits non-zero when some entries are unreadable but still prints the
/// rest, so such output is parsed rather than discarded.
///
/// # Errors
///
/// Returns an error if the bridge call itself fails.
pub async fn list_directory(
    transport: &dyn Transport,
    device: &str,
    path: &str,
) -> TransportResult<Vec<FileEntry>> {
    // a trailing slash makes `ls` list the target of a symlinked directory
    let target = if path.ends_with('/') {
        path.to_string()
    } else {
        format!("{path}/")
    };

    let output = match transport.shell(device, &["ls", "-la", target.as_str()]).await {
        Ok(output) | Err(TransportError::CommandFailed { output, .. }) => output,
        Err(e) => return Err(e),
    };

    let mut entries = parse_listing(path, &output);
    sort_entries(&mut entries);
    tracing::debug!(device, path, count = entries.len(), "Directory listed");
    Ok(entries)
}

/// Directories before files, then case-insensitive by name
pub fn sort_entries(entries: &mut [FileEntry]) {
    entries.sort_by(|a, b| match (a.is_directory, b.is_directory) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        _ => a
            .name
            .to_lowercase()
            .cmp(&b.name.to_lowercase())
            .then_with(|| a.name.cmp(&b.name)),
    });
}

/// Contents of a remote text file
///
/// # Errors
///
/// Returns an error if `cat` fails (missing file, permission denied) or the
/// bridge call fails.
pub async fn read_file(transport: &dyn Transport, device: &str, path: &str) -> TransportResult<String> {
    transport.shell(device, &["cat", path]).await
}

/// Copies a remote file to the host
///
/// # Errors
///
/// Returns an error if the transfer fails.
pub async fn pull(
    transport: &dyn Transport,
    device: &str,
    remote: &str,
    local: &Path,
) -> TransportResult<String> {
    let output = transport
        .execute(
            Some(device),
            &[
                "pull".to_string(),
                remote.to_string(),
                local.display().to_string(),
            ],
        )
        .await?;
    tracing::info!(device, remote, local = %local.display(), "File pulled");
    Ok(output)
}

/// Copies a host file to the device
///
/// # Errors
///
/// Returns an error if the transfer fails.
pub async fn push(
    transport: &dyn Transport,
    device: &str,
    local: &Path,
    remote: &str,
) -> TransportResult<String> {
    let output = transport
        .execute(
            Some(device),
            &[
                "push".to_string(),
                local.display().to_string(),
                remote.to_string(),
            ],
        )
        .await?;
    tracing::info!(device, remote, local = %local.display(), "File pushed");
    Ok(output)
}
