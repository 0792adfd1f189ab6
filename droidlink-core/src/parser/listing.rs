//! Parser for `ls -la` long-format listings
//!
//! Expected row shape:
//! `<permissions> <links> <owner> <group> <size> <month> <day> <time-or-year> <name...>`
//!
//! Toybox on recent Android prints an ISO date instead
//! (`<size> <YYYY-MM-DD> <HH:MM> <name...>`); rows in that shape are accepted
//! as well.

use chrono::{Datelike, NaiveDate, NaiveDateTime, Utc};

use crate::models::{FileEntry, join_remote_path};

/// Minimum tokens in a classic long-format row
const MIN_CLASSIC_TOKENS: usize = 9;
/// Minimum tokens in an ISO-dated toybox row
const MIN_ISO_TOKENS: usize = 8;

/// Parses a long-format listing of `current_dir`.
///
/// Never fails: blank lines, the leading `total` line, rows that are too
/// short, and the `.`/`..` entries are skipped. Non-numeric sizes become 0;
/// dates that do not parse become 0.
#[must_use]
pub fn parse_listing(current_dir: &str, output: &str) -> Vec<FileEntry> {
    output
        .lines()
        .filter(|line| !line.trim().is_empty() && !line.trim_start().starts_with("total"))
        .filter_map(|line| parse_row(current_dir, line))
        .collect()
}

fn parse_row(current_dir: &str, line: &str) -> Option<FileEntry> {
    let parts: Vec<&str> = line.split_whitespace().collect();

    let (date_text, name_start) = if parts.len() >= MIN_ISO_TOKENS && is_iso_date(parts[5]) {
        (format!("{} {}", parts[5], parts[6]), 7)
    } else if parts.len() >= MIN_CLASSIC_TOKENS {
        (parts[5..8].join(" "), 8)
    } else {
        return None;
    };

    let name = parts[name_start..].join(" ");
    if name == "." || name == ".." {
        return None;
    }

    let permissions = parts[0];
    Some(FileEntry {
        path: join_remote_path(current_dir, &name),
        name,
        is_directory: permissions.starts_with('d'),
        size: parts[4].parse().unwrap_or(0),
        modified: parse_listing_date(&date_text),
        permissions: permissions.to_string(),
        owner: parts[2].to_string(),
        group: parts[3].to_string(),
    })
}

fn is_iso_date(token: &str) -> bool {
    NaiveDate::parse_from_str(token, "%Y-%m-%d").is_ok()
}

/// Parses the date columns of a listing row into Unix seconds.
///
/// Accepts `Mon D HH:MM` (current year assumed), `Mon D YYYY` and
/// `YYYY-MM-DD HH:MM`. Returns 0 when nothing matches.
#[must_use]
pub fn parse_listing_date(text: &str) -> i64 {
    if let Ok(dt) = NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M") {
        return dt.and_utc().timestamp();
    }

    let with_year = format!("{} {text}", Utc::now().year());
    if let Ok(dt) = NaiveDateTime::parse_from_str(&with_year, "%Y %b %d %H:%M") {
        return dt.and_utc().timestamp();
    }

    if let Ok(date) = NaiveDate::parse_from_str(text, "%b %d %Y")
        && let Some(dt) = date.and_hms_opt(0, 0, 0)
    {
        return dt.and_utc().timestamp();
    }

    tracing::debug!(date = %text, "Unrecognised listing date, using 0");
    0
}
