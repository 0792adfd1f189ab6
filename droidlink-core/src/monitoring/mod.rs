//! Device telemetry polling
//!
//! A background loop per selected device reads CPU, memory, battery and
//! network state on a fixed interval and publishes one
//! [`crate::models::TelemetrySnapshot`] per tick, latest value wins.

mod poller;
mod settings;

pub use poller::{
    BATTERY_CAPACITY_PATH, BATTERY_STATUS_PATH, CPU_COMMAND, PollerHandle, interface_command,
    poll_once, start_poller,
};
pub use settings::MonitoringSettings;
