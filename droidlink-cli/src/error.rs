//! CLI error types and exit codes.

use droidlink_core::{ConfigError, ExecError, SessionError, TransportError};

/// Exit codes for CLI operations
pub mod exit_codes {
    /// General error - configuration, validation, or other non-device errors
    pub const GENERAL_ERROR: i32 = 1;
    /// Device failure - the bridge or the device could not be reached or
    /// refused the operation
    pub const DEVICE_FAILURE: i32 = 2;
}

/// CLI error type
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// No device matched the request
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    /// More than one device is attached and none was named
    #[error("Several devices attached ({0}); pick one with --device")]
    AmbiguousDevice(String),

    /// Bridge or device failure
    #[error("Device error: {0}")]
    Device(String),

    /// Remote command failure
    #[error("Command error: {0}")]
    Command(String),

    /// Output formatting error
    #[error("Output error: {0}")]
    Output(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<TransportError> for CliError {
    fn from(err: TransportError) -> Self {
        Self::Device(err.to_string())
    }
}

impl From<ExecError> for CliError {
    fn from(err: ExecError) -> Self {
        match err {
            ExecError::Transport(e) => e.into(),
            other => Self::Command(other.to_string()),
        }
    }
}

impl From<SessionError> for CliError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::UnknownDevice(id) => Self::DeviceNotFound(id),
            SessionError::Transport(e) => e.into(),
            SessionError::Exec(e) => e.into(),
            other => Self::Device(other.to_string()),
        }
    }
}

impl CliError {
    /// Returns the appropriate exit code for this error type.
    ///
    /// Exit codes:
    /// - 0: Success (not an error)
    /// - 1: General error (configuration, output, IO, ambiguous selection)
    /// - 2: Device failure (unknown device, bridge error, command error)
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::DeviceNotFound(_) | Self::Device(_) | Self::Command(_) => {
                exit_codes::DEVICE_FAILURE
            }
            Self::Config(_) | Self::AmbiguousDevice(_) | Self::Output(_) | Self::Io(_) => {
                exit_codes::GENERAL_ERROR
            }
        }
    }
}
