//! Core data structures: devices, file entries, telemetry

mod device;
mod file_entry;
mod telemetry;

pub use device::{ConnectionKind, Device};
pub use file_entry::{FileEntry, format_size, join_remote_path, parent_remote_path};
pub use telemetry::{
    BatteryReading, MemoryReading, NetworkKind, NetworkReading, TelemetrySnapshot,
};
