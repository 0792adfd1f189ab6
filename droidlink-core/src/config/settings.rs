//! Application settings
//!
//! Every field carries a serde default so partially written files load.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::monitoring::MonitoringSettings;
use crate::transport::DEFAULT_TIMEOUT_SECS;

/// Shortest accepted output poll interval
const MIN_POLL_MS: u64 = 10;
/// Longest accepted output poll interval
const MAX_POLL_MS: u64 = 1_000;

/// Top-level settings (`config.toml`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppSettings {
    /// Bridge executable settings
    #[serde(default)]
    pub adb: AdbSettings,
    /// Command execution settings
    #[serde(default)]
    pub exec: ExecSettings,
    /// Telemetry polling settings
    #[serde(default)]
    pub monitoring: MonitoringSettings,
}

/// `[adb]` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdbSettings {
    /// Path or name of the `adb` executable
    #[serde(default = "default_executable")]
    pub executable: String,
    /// Timeout for one bridge invocation in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_executable() -> String {
    "adb".to_string()
}

const fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for AdbSettings {
    fn default() -> Self {
        Self {
            executable: default_executable(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// `[exec]` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecSettings {
    /// How often a long-running command's output is polled (milliseconds)
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Remote directory for scratch files
    #[serde(default = "default_scratch_dir")]
    pub scratch_dir: String,
    /// Consecutive transport failures tolerated before a session is dropped
    #[serde(default = "default_max_transport_failures")]
    pub max_transport_failures: u32,
}

const fn default_poll_interval_ms() -> u64 {
    500
}

fn default_scratch_dir() -> String {
    "/data/local/tmp".to_string()
}

const fn default_max_transport_failures() -> u32 {
    3
}

impl Default for ExecSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            scratch_dir: default_scratch_dir(),
            max_transport_failures: default_max_transport_failures(),
        }
    }
}

impl ExecSettings {
    /// Poll interval clamped to 10 ms – 1 s
    #[must_use]
    pub fn effective_poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.clamp(MIN_POLL_MS, MAX_POLL_MS))
    }

    /// Sets the poll interval
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval_ms = u64::try_from(interval.as_millis()).unwrap_or(MAX_POLL_MS);
        self
    }

    /// Failure budget, at least one
    #[must_use]
    pub fn effective_max_failures(&self) -> u32 {
        self.max_transport_failures.max(1)
    }
}
