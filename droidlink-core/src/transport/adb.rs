//! `adb` process transport
//!
//! Spawns the bridge executable once per call, merges stdout and stderr and
//! enforces a timeout. Server lifecycle and installation of the executable
//! are left to the user's environment.

use std::path::PathBuf;
use std::process::{Output, Stdio};
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use super::Transport;
use crate::config::AdbSettings;
use crate::error::{TransportError, TransportResult};

/// Default timeout for a single bridge invocation (seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Runs commands through the `adb` executable
#[derive(Debug, Clone)]
pub struct AdbTransport {
    program: PathBuf,
    timeout_secs: u64,
}

impl Default for AdbTransport {
    fn default() -> Self {
        Self::new("adb")
    }
}

impl AdbTransport {
    /// Creates a transport for the given executable
    #[must_use]
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Creates a transport from the `[adb]` settings section
    #[must_use]
    pub fn from_settings(settings: &AdbSettings) -> Self {
        Self::new(&settings.executable).with_timeout_secs(settings.timeout_secs)
    }

    /// Sets the per-call timeout
    #[must_use]
    pub const fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = if secs == 0 { 1 } else { secs };
        self
    }

    /// Executable in use
    #[must_use]
    pub fn program(&self) -> &std::path::Path {
        &self.program
    }

    fn build_command(&self, device: Option<&str>, args: &[String]) -> Command {
        let mut cmd = Command::new(&self.program);
        if let Some(serial) = device {
            cmd.arg("-s").arg(serial);
        }
        cmd.args(args);
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.kill_on_drop(true);
        cmd
    }
}

#[async_trait]
impl Transport for AdbTransport {
    async fn execute(&self, device: Option<&str>, args: &[String]) -> TransportResult<String> {
        let output = self.run(device, args).await?;
        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));
        self.check_status(device, &output)?;
        Ok(combined)
    }

    async fn execute_bytes(
        &self,
        device: Option<&str>,
        args: &[String],
    ) -> TransportResult<Vec<u8>> {
        let output = self.run(device, args).await?;
        self.check_status(device, &output)?;
        let mut combined = output.stdout;
        combined.extend_from_slice(&output.stderr);
        Ok(combined)
    }
}

impl AdbTransport {
    /// Spawns the bridge and collects its output under the timeout
    async fn run(&self, device: Option<&str>, args: &[String]) -> TransportResult<Output> {
        let mut cmd = self.build_command(device, args);
        let timeout = Duration::from_secs(self.timeout_secs);

        tracing::trace!(device = ?device, args = ?args, "adb invocation");

        match tokio::time::timeout(timeout, cmd.output()).await {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(source)) => Err(TransportError::Spawn {
                program: self.program.display().to_string(),
                source,
            }),
            Err(_) => Err(TransportError::Timeout(self.timeout_secs)),
        }
    }

    /// Maps a non-zero exit to the matching error
    fn check_status(&self, device: Option<&str>, output: &Output) -> TransportResult<()> {
        if output.status.success() {
            return Ok(());
        }

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));

        if let Some(serial) = device
            && is_device_missing(&combined)
        {
            return Err(TransportError::DeviceUnavailable(serial.to_string()));
        }

        Err(TransportError::CommandFailed {
            status: output.status.to_string(),
            output: combined.trim().to_string(),
        })
    }
}

/// Whether bridge stderr says the target device is gone
fn is_device_missing(output: &str) -> bool {
    let lower = output.to_lowercase();
    (lower.contains("device '") && lower.contains("not found"))
        || lower.contains("device offline")
        || lower.contains("no devices/emulators found")
}
