//! Remote shell command composition
//!
//! `adb shell` joins its arguments with spaces and hands the result to the
//! device's `sh`, so every word that is not a plain token has to be quoted
//! before it leaves the host. Quoting uses POSIX single quotes: inside them
//! only `'` itself is special, and it is written as `'\''`. Backslashes,
//! newlines, `$`, backticks and the like are carried through literally.

/// Characters that never need quoting in a shell word
fn is_plain(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '/' | ':' | '=' | '+' | ',' | '@' | '%')
}

/// Wraps `value` in single quotes, escaping embedded single quotes.
///
/// Always quotes, even plain tokens.
#[must_use]
pub fn single_quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('\'');
    for c in value.chars() {
        if c == '\'' {
            out.push_str("'\\''");
        } else {
            out.push(c);
        }
    }
    out.push('\'');
    out
}

/// Quotes `value` only if it contains anything besides plain characters
#[must_use]
pub fn quote(value: &str) -> String {
    if !value.is_empty() && value.chars().all(is_plain) {
        value.to_string()
    } else {
        single_quote(value)
    }
}

/// Joins words into one shell command line, quoting each as needed
#[must_use]
pub fn join<S: AsRef<str>>(words: &[S]) -> String {
    words
        .iter()
        .map(|w| quote(w.as_ref()))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Builds the bridge argv for running `words` through the remote shell
#[must_use]
pub fn shell_argv<S: AsRef<str>>(words: &[S]) -> Vec<String> {
    vec!["shell".to_string(), join(words)]
}

/// Builds the bridge argv for a raw, already composed command line
#[must_use]
pub fn shell_raw(command_line: &str) -> Vec<String> {
    vec!["shell".to_string(), command_line.to_string()]
}

/// Composes the detached form of `command`.
///
/// The remote shell starts `command` under `nohup`, sends its combined
/// output to `scratch_file` and prints the background process id.
#[must_use]
pub fn detached(command: &str, scratch_file: &str) -> String {
    format!(
        "nohup sh -c {} > {} 2>&1 & echo $!",
        single_quote(command),
        quote(scratch_file)
    )
}

/// Remote file name used as scratch space for `device_id`'s long-running command
#[must_use]
pub fn scratch_file_for(scratch_dir: &str, device_id: &str) -> String {
    let sanitized: String = device_id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!(
        "{}/droidlink_{sanitized}.log",
        scratch_dir.trim_end_matches('/')
    )
}
