//! Command transport to devices
//!
//! The rest of the crate sees the debug bridge as one capability: run an
//! argv against a named device and get back its combined text output, or a
//! failure. There is no live handle and no streaming; every call is a fresh
//! round trip. Callers that count bytes of remote files use the raw form,
//! [`Transport::execute_bytes`], so decoding never shifts their offsets.

mod adb;

use async_trait::async_trait;

use crate::error::TransportResult;
use crate::shell;

pub use adb::{AdbTransport, DEFAULT_TIMEOUT_SECS};

/// Request/response access to the bridge
#[async_trait]
pub trait Transport: Send + Sync {
    /// Runs `args` against `device`, or against the bridge itself when
    /// `device` is `None` (e.g. `devices -l`, `connect`).
    ///
    /// # Errors
    ///
    /// Returns a [`crate::error::TransportError`] when the bridge cannot be
    /// launched, times out, or reports failure.
    async fn execute(&self, device: Option<&str>, args: &[String]) -> TransportResult<String>;

    /// Like [`Transport::execute`], but returns the output bytes undecoded
    ///
    /// # Errors
    ///
    /// See [`Transport::execute`].
    async fn execute_bytes(
        &self,
        device: Option<&str>,
        args: &[String],
    ) -> TransportResult<Vec<u8>> {
        self.execute(device, args).await.map(String::into_bytes)
    }

    /// Runs `words` through the device shell, quoting each word
    ///
    /// # Errors
    ///
    /// See [`Transport::execute`].
    async fn shell(&self, device: &str, words: &[&str]) -> TransportResult<String> {
        self.execute(Some(device), &shell::shell_argv(words)).await
    }

    /// Runs an already composed command line through the device shell
    ///
    /// # Errors
    ///
    /// See [`Transport::execute`].
    async fn shell_raw(&self, device: &str, command_line: &str) -> TransportResult<String> {
        self.execute(Some(device), &shell::shell_raw(command_line)).await
    }
}
