//! Device telemetry readings
//!
//! A [`TelemetrySnapshot`] is replaced wholesale on every poll tick, so
//! consumers never observe a partially updated reading.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of the active network link
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum NetworkKind {
    /// WiFi interface has an IPv4 address
    Wifi,
    /// Mobile data interface has an IPv4 address
    Mobile,
    /// Neither interface has an address
    None,
    /// The probe itself failed
    #[default]
    Unknown,
}

impl NetworkKind {
    /// Returns the display label
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Wifi => "WIFI",
            Self::Mobile => "MOBILE",
            Self::None => "NONE",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl std::fmt::Display for NetworkKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Active network kind and its address (or a placeholder)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkReading {
    /// Link kind
    pub kind: NetworkKind,
    /// IPv4 address, or an explanatory placeholder
    pub address: String,
}

impl Default for NetworkReading {
    fn default() -> Self {
        Self {
            kind: NetworkKind::Unknown,
            address: "Unknown".to_string(),
        }
    }
}

/// Memory usage in megabytes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryReading {
    /// Used memory (MB)
    pub used_mb: u64,
    /// Total memory (MB)
    pub total_mb: u64,
}

impl MemoryReading {
    /// Returns memory usage as a percentage (0.0–100.0)
    #[must_use]
    pub fn percent(&self) -> f32 {
        if self.total_mb == 0 {
            return 0.0;
        }
        (self.used_mb as f32 / self.total_mb as f32) * 100.0
    }
}

/// Battery level and charging state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatteryReading {
    /// Capacity percentage
    pub percent: u8,
    /// Whether the status reads "Charging"
    pub charging: bool,
}

/// One consolidated reading for a device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySnapshot {
    /// Device this reading belongs to
    pub device_id: String,
    /// CPU usage (user + kernel) as a percentage
    pub cpu_percent: f32,
    /// Memory usage
    pub memory: MemoryReading,
    /// Battery state
    pub battery: BatteryReading,
    /// Network state
    pub network: NetworkReading,
    /// When the poll tick that produced this snapshot finished
    pub captured_at: DateTime<Utc>,
}

impl TelemetrySnapshot {
    /// A zeroed snapshot for `device_id`
    #[must_use]
    pub fn empty(device_id: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            cpu_percent: 0.0,
            memory: MemoryReading::default(),
            battery: BatteryReading::default(),
            network: NetworkReading::default(),
            captured_at: Utc::now(),
        }
    }
}
