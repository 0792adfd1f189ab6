//! Android device records

use std::collections::HashMap;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// How a device is attached to the bridge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ConnectionKind {
    /// Attached over USB, identified by serial number
    Usb,
    /// Attached over TCP/IP, identified by `host:port`
    Network,
}

impl ConnectionKind {
    /// Infers the connection kind from a device identifier.
    ///
    /// Identifiers containing a colon are network addresses.
    #[must_use]
    pub fn from_identifier(id: &str) -> Self {
        if id.contains(':') {
            Self::Network
        } else {
            Self::Usb
        }
    }

    /// Returns the display label
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Usb => "USB",
            Self::Network => "NETWORK",
        }
    }
}

impl std::fmt::Display for ConnectionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A device reported by discovery
///
/// Identity is the serial or `host:port` string: equality and hashing only
/// look at [`Device::id`]. Re-scans produce new values rather than mutating
/// existing ones.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Device {
    /// Serial number or `host:port`
    pub id: String,
    /// Marketing model name
    pub model: String,
    /// Manufacturer
    pub manufacturer: String,
    /// Product name
    pub name: String,
    /// Android release string (e.g. "14")
    pub android_version: String,
    /// USB or network
    pub connection: ConnectionKind,
    /// Host part of a network identifier
    pub host: Option<String>,
    /// Port part of a network identifier
    pub port: Option<u16>,
    /// Cleared when the device is disconnected
    pub connected: bool,
}

impl Device {
    /// Creates a connected device record from its identifier
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        let connection = ConnectionKind::from_identifier(&id);
        let (host, port) = match connection {
            ConnectionKind::Network => split_address(&id),
            ConnectionKind::Usb => (None, None),
        };

        Self {
            id,
            model: String::new(),
            manufacturer: String::new(),
            name: String::new(),
            android_version: String::new(),
            connection,
            host,
            port,
            connected: true,
        }
    }

    /// Returns a copy filled in from `getprop` properties.
    ///
    /// Properties that are missing or empty keep the current value.
    #[must_use]
    pub fn with_properties(&self, props: &HashMap<String, String>) -> Self {
        let pick = |key: &str, current: &str| {
            props
                .get(key)
                .filter(|v| !v.is_empty())
                .cloned()
                .unwrap_or_else(|| current.to_string())
        };

        Self {
            model: pick("ro.product.model", &self.model),
            manufacturer: pick("ro.product.manufacturer", &self.manufacturer),
            name: pick("ro.product.name", &self.name),
            android_version: pick("ro.build.version.release", &self.android_version),
            ..self.clone()
        }
    }

    /// Returns a copy marked as disconnected
    #[must_use]
    pub fn disconnected(&self) -> Self {
        Self {
            connected: false,
            ..self.clone()
        }
    }

    /// Human-friendly name, falling back to the identifier
    #[must_use]
    pub fn display_name(&self) -> String {
        match (self.manufacturer.is_empty(), self.model.is_empty()) {
            (false, false) => format!("{} {}", self.manufacturer, self.model),
            (true, false) => self.model.clone(),
            _ => self.id.clone(),
        }
    }
}

impl PartialEq for Device {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Device {}

impl Hash for Device {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

fn split_address(id: &str) -> (Option<String>, Option<u16>) {
    match id.rsplit_once(':') {
        Some((host, port)) => (Some(host.to_string()), port.parse().ok()),
        None => (None, None),
    }
}
