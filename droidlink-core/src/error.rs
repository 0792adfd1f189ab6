//! Error types for `DroidLink`
//!
//! Each concern has its own error enum and result alias. Transport and parse
//! problems are normally absorbed close to where they happen (diagnostic text,
//! zeroed values); these types exist for the paths that report a failure to
//! the caller, such as starting a long-running command or loading settings.

use std::path::PathBuf;

use thiserror::Error;

/// Failure of a single bridge invocation
#[derive(Debug, Error)]
pub enum TransportError {
    /// The bridge executable could not be started
    #[error("Failed to spawn '{program}': {source}")]
    Spawn {
        /// Program that was launched
        program: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The invocation did not finish within the configured timeout
    #[error("Bridge command timed out after {0}s")]
    Timeout(u64),

    /// The invocation ran but reported failure
    #[error("Bridge command failed ({status}): {output}")]
    CommandFailed {
        /// Exit status as reported by the OS
        status: String,
        /// Combined stdout and stderr
        output: String,
    },

    /// The device is not (or no longer) reachable
    #[error("Device not available: {0}")]
    DeviceUnavailable(String),
}

impl TransportError {
    /// Returns the combined output captured with the failure, if any
    #[must_use]
    pub fn output(&self) -> Option<&str> {
        match self {
            Self::CommandFailed { output, .. } => Some(output),
            _ => None,
        }
    }
}

/// Result type for transport operations
pub type TransportResult<T> = Result<T, TransportError>;

/// Errors raised by the command execution engine
#[derive(Debug, Error)]
pub enum ExecError {
    /// The underlying bridge call failed
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The detached command did not echo back a usable process id
    #[error("Could not capture remote process id from output: {0:?}")]
    PidNotCaptured(String),

    /// No long-running command is active for the device
    #[error("No active command session for device {0}")]
    NoSession(String),
}

/// Result type for execution engine operations
pub type ExecResult<T> = Result<T, ExecError>;

/// Errors raised by the session controller
#[derive(Debug, Error)]
pub enum SessionError {
    /// An operation needs a selected device and none is selected
    #[error("No device selected")]
    NoDeviceSelected,

    /// The requested device is not among the discovered devices
    #[error("Unknown device: {0}")]
    UnknownDevice(String),

    /// The long-running command failed
    #[error(transparent)]
    Exec(#[from] ExecError),

    /// A bridge call made on the controller's behalf failed
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Result type for session operations
pub type SessionResult<T> = Result<T, SessionError>;

/// Errors raised while loading or saving settings
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No platform configuration directory could be determined
    #[error("Could not determine configuration directory")]
    NoConfigDir,

    /// Reading or writing the settings file failed
    #[error("I/O error on '{path}': {source}")]
    Io {
        /// File or directory involved
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The settings file is not valid TOML for [`crate::config::AppSettings`]
    #[error("Failed to parse '{path}': {message}")]
    Parse {
        /// File being parsed
        path: PathBuf,
        /// Parser message
        message: String,
    },

    /// Settings could not be serialized
    #[error("Failed to serialize settings: {0}")]
    Serialize(String),
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Crate-level error wrapping every concern
#[derive(Debug, Error)]
pub enum DroidLinkError {
    /// Bridge invocation failed
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Execution engine failure
    #[error("Execution error: {0}")]
    Exec(#[from] ExecError),

    /// Session controller failure
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Settings failure
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Local I/O failure
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type using the crate-level error
pub type DroidLinkResult<T> = Result<T, DroidLinkError>;
