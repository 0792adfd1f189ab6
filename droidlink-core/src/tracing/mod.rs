//! Structured logging setup
//!
//! Front ends call [`init_tracing`] once at startup. Events go to stderr, or
//! to a log file without ANSI colouring. Filter precedence: an explicit
//! filter string, then `RUST_LOG`, then the configured level applied to the
//! crate's own targets.

use std::fs::File;
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

static INSTALLED: AtomicBool = AtomicBool::new(false);

/// Errors raised while installing the subscriber
#[derive(Debug, Error)]
pub enum TracingError {
    /// A subscriber was already installed by this module
    #[error("Logging has already been initialized")]
    AlreadyInitialized,

    /// The filter string is not valid `EnvFilter` syntax
    #[error("Invalid log filter '{filter}': {message}")]
    InvalidFilter {
        /// Filter as given
        filter: String,
        /// Parser message
        message: String,
    },

    /// The log file could not be created
    #[error("Cannot create log file '{}': {source}", path.display())]
    LogFile {
        /// Requested file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Another global subscriber is already in place
    #[error("Failed to install subscriber: {0}")]
    Install(String),
}

/// Result type for tracing setup
pub type TracingResult<T> = Result<T, TracingError>;

/// Verbosity of the crate's own targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TracingLevel {
    /// Only errors
    Error,
    /// Errors and warnings
    #[default]
    Warn,
    /// Lifecycle events: selection changes, loop start/stop
    Info,
    /// Per-poll details and parse fallbacks
    Debug,
    /// Every bridge invocation
    Trace,
}

impl TracingLevel {
    /// Maps a `-v` count to a level
    #[must_use]
    pub const fn from_verbosity(count: u8) -> Self {
        match count {
            0 => Self::Warn,
            1 => Self::Info,
            2 => Self::Debug,
            _ => Self::Trace,
        }
    }

    /// Directive spelling of the level
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

impl std::fmt::Display for TracingLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where events are written
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LogDestination {
    /// Standard error, with ANSI colours
    #[default]
    Stderr,
    /// A file, truncated when logging starts
    File(PathBuf),
}

/// Logging options chosen by the front end
#[derive(Debug, Clone, Default)]
pub struct TracingConfig {
    /// Level for the crate's own targets
    pub level: TracingLevel,
    /// Where events are written
    pub destination: LogDestination,
    /// Explicit `EnvFilter` directives, overriding level and `RUST_LOG`
    pub filter: Option<String>,
}

impl TracingConfig {
    /// Stderr at the default level
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the level
    #[must_use]
    pub const fn with_level(mut self, level: TracingLevel) -> Self {
        self.level = level;
        self
    }

    /// Writes events to `path` instead of stderr
    #[must_use]
    pub fn with_log_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.destination = LogDestination::File(path.into());
        self
    }

    /// Sets explicit filter directives
    #[must_use]
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// Directives derived from the level alone
    #[must_use]
    pub fn default_directive(&self) -> String {
        format!("droidlink_core={0},droidlink={0}", self.level)
    }

    fn env_filter(&self) -> TracingResult<EnvFilter> {
        if let Some(filter) = &self.filter {
            return EnvFilter::try_new(filter).map_err(|e| TracingError::InvalidFilter {
                filter: filter.clone(),
                message: e.to_string(),
            });
        }
        Ok(EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(self.default_directive()))
            .unwrap_or_else(|_| EnvFilter::new("warn")))
    }

    fn writer(&self) -> TracingResult<BoxMakeWriter> {
        match &self.destination {
            LogDestination::Stderr => Ok(BoxMakeWriter::new(std::io::stderr)),
            LogDestination::File(path) => {
                let file = File::create(path).map_err(|source| TracingError::LogFile {
                    path: path.clone(),
                    source,
                })?;
                Ok(BoxMakeWriter::new(Mutex::new(file)))
            }
        }
    }
}

/// Installs the global subscriber
///
/// # Errors
///
/// Returns an error if logging was already initialized, the filter is
/// invalid, or the log file cannot be created. Nothing is installed in the
/// last two cases and a later call may succeed.
pub fn init_tracing(config: &TracingConfig) -> TracingResult<()> {
    let filter = config.env_filter()?;
    let writer = config.writer()?;

    if INSTALLED.swap(true, Ordering::SeqCst) {
        return Err(TracingError::AlreadyInitialized);
    }

    let to_file = matches!(config.destination, LogDestination::File(_));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_ansi(!to_file)
                .with_writer(writer),
        )
        .try_init()
        .map_err(|e| TracingError::Install(e.to_string()))?;

    tracing::debug!(level = %config.level, destination = ?config.destination, "Logging initialized");
    Ok(())
}

/// Span names shared by the crate's background loops
pub mod span_names {
    /// Device discovery
    pub const DEVICE_SCAN: &str = "device.scan";
    /// Device selection change
    pub const SESSION_SELECT: &str = "session.select";
    /// Long-running command output loop
    pub const COMMAND_STREAM: &str = "command.stream";
    /// Telemetry poll loop
    pub const TELEMETRY_POLL: &str = "telemetry.poll";
}
