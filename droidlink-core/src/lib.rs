//! `DroidLink` Core Library
//!
//! Remote sessions with Android devices over the debug bridge: discovery,
//! directory browsing, one-shot and long-running shell commands, and
//! telemetry polling, all bound to a single selected device.
//!
//! # Crate Structure
//!
//! - [`transport`] - The bridge as a request/response capability (`adb` process or scripted)
//! - [`parser`] - Total parsers for device lists, listings, process and telemetry output
//! - [`exec`] - Synchronous execution and polled long-running commands
//! - [`monitoring`] - Per-device telemetry poll loop
//! - [`session`] - Selected-device lifecycle and command history
//! - [`device`] / [`files`] - Discovery, network attach, remote filesystem
//! - [`config`] - `config.toml` settings
//! - [`shell`] - Remote shell quoting and command composition

#![warn(missing_docs)]

pub mod config;
pub mod device;
pub mod error;
pub mod exec;
pub mod files;
pub mod models;
pub mod monitoring;
pub mod parser;
pub mod session;
pub mod shell;
pub mod testing;
pub mod tracing;
pub mod transport;

pub use config::{AdbSettings, AppSettings, ConfigManager, ExecSettings, MonitoringSettings};
pub use error::{
    ConfigError, ConfigResult, DroidLinkError, DroidLinkResult, ExecError, ExecResult,
    SessionError, SessionResult, TransportError, TransportResult,
};
pub use exec::{CommandEvent, CommandHandle, ExecutionEngine, FinishReason};
pub use models::{
    BatteryReading, ConnectionKind, Device, FileEntry, MemoryReading, NetworkKind,
    NetworkReading, TelemetrySnapshot,
};
pub use monitoring::{PollerHandle, poll_once, start_poller};
pub use session::{CommandHistory, HistoryEntry, HistoryKind, SessionController};
pub use transport::{AdbTransport, Transport};
