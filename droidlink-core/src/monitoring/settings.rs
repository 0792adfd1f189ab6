//! Telemetry polling settings
//!
//! Stored in `config.toml` under `[monitoring]`.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Shortest accepted polling interval
const MIN_INTERVAL_MS: u64 = 50;
/// Longest accepted polling interval
const MAX_INTERVAL_MS: u64 = 60_000;

/// Telemetry poller settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitoringSettings {
    /// Whether a poller is started when a device is selected (default: true)
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Polling interval in milliseconds (default: 5000)
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    /// Interface probed first for a WiFi address
    #[serde(default = "default_wifi_interface")]
    pub wifi_interface: String,
    /// Interface probed second for a mobile data address
    #[serde(default = "default_mobile_interface")]
    pub mobile_interface: String,
}

const fn default_true() -> bool {
    true
}

const fn default_interval_ms() -> u64 {
    5_000
}

fn default_wifi_interface() -> String {
    "wlan0".to_string()
}

fn default_mobile_interface() -> String {
    "rmnet_data0".to_string()
}

impl Default for MonitoringSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_ms: default_interval_ms(),
            wifi_interface: default_wifi_interface(),
            mobile_interface: default_mobile_interface(),
        }
    }
}

impl MonitoringSettings {
    /// Returns the interval clamped to the valid range (50 ms – 60 s)
    #[must_use]
    pub fn effective_interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms.clamp(MIN_INTERVAL_MS, MAX_INTERVAL_MS))
    }

    /// Sets the polling interval
    #[must_use]
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval_ms = u64::try_from(interval.as_millis()).unwrap_or(MAX_INTERVAL_MS);
        self
    }
}
