//! Parsers for process bookkeeping output (`echo $!`, `ps -p`)

/// Extracts the process id echoed by a detached launch.
///
/// The id is the last non-blank line; anything else printed before it
/// (e.g. `nohup` notices) is ignored.
#[must_use]
pub fn parse_pid(output: &str) -> Option<u32> {
    output
        .lines()
        .rev()
        .map(str::trim)
        .find(|l| !l.is_empty())?
        .parse()
        .ok()
}

/// Whether `ps -p <pid>` output still lists `pid`.
///
/// The header row is skipped; any later row containing the pid as a
/// whitespace-separated token counts as alive.
#[must_use]
pub fn is_process_listed(output: &str, pid: u32) -> bool {
    let needle = pid.to_string();
    output
        .lines()
        .skip(1)
        .any(|line| line.split_whitespace().any(|token| token == needle))
}
