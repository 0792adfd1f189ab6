//! Parsers for telemetry probe output
//!
//! Each probe is parsed on its own and falls back to a zeroed value when the
//! output does not have the expected shape, so one bad probe never spoils
//! the rest of a snapshot.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::{BatteryReading, MemoryReading, NetworkKind, NetworkReading};

/// `CPU: 10% user + 5% kernel ...` as printed by older `top`
static CPU_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"CPU:\s*(\d+)%\s*user\s*\+\s*(\d+)%\s*kernel")
        .expect("CPU_REGEX is a valid regex pattern")
});

/// `inet 192.168.1.5/24` (ip) or `inet addr:192.168.1.5` (ifconfig)
static INET_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"inet\s+(?:addr:)?(\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3})")
        .expect("INET_REGEX is a valid regex pattern")
});

/// Address shown when neither interface has an IPv4 address
pub const NO_NETWORK_PLACEHOLDER: &str = "Not connected";

/// Stateless parser for telemetry probes
pub struct TelemetryParser;

impl TelemetryParser {
    /// Sum of user and kernel percentages from a `top` CPU line, 0 if absent
    #[must_use]
    pub fn parse_cpu(output: &str) -> f32 {
        output
            .lines()
            .find_map(|line| {
                let caps = CPU_REGEX.captures(line)?;
                let user: u32 = caps[1].parse().ok()?;
                let kernel: u32 = caps[2].parse().ok()?;
                Some(user.saturating_add(kernel) as f32)
            })
            .unwrap_or(0.0)
    }

    /// Total and used megabytes from the second line of `free -m`.
    ///
    /// Line 0 is the column header; line 1 must carry at least three tokens
    /// (`Mem: <total> <used> ...`). Anything else yields zeros.
    #[must_use]
    pub fn parse_memory(output: &str) -> MemoryReading {
        let Some(line) = output.lines().filter(|l| !l.trim().is_empty()).nth(1) else {
            return MemoryReading::default();
        };
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 3 {
            return MemoryReading::default();
        }

        match (parts[1].parse::<u64>(), parts[2].parse::<u64>()) {
            (Ok(total_mb), Ok(used_mb)) => MemoryReading { used_mb, total_mb },
            _ => MemoryReading::default(),
        }
    }

    /// Battery capacity percentage, clamped to 100; 0 when not numeric
    #[must_use]
    pub fn parse_battery_capacity(output: &str) -> u8 {
        output
            .trim()
            .parse::<u32>()
            .map(|v| v.min(100) as u8)
            .unwrap_or(0)
    }

    /// Whether the battery status text is "Charging" (any case)
    #[must_use]
    pub fn parse_charging(output: &str) -> bool {
        output.trim().eq_ignore_ascii_case("Charging")
    }

    /// Combines capacity and status probe output
    #[must_use]
    pub fn parse_battery(capacity: &str, status: &str) -> BatteryReading {
        BatteryReading {
            percent: Self::parse_battery_capacity(capacity),
            charging: Self::parse_charging(status),
        }
    }

    /// First IPv4 address following `inet` in interface output
    #[must_use]
    pub fn parse_inet_address(output: &str) -> Option<String> {
        INET_REGEX
            .captures(output)
            .map(|caps| caps[1].to_string())
    }

    /// Builds the network reading from the WiFi and mobile probes.
    ///
    /// `None` means the probe itself failed. WiFi wins over mobile; when
    /// neither has an address the kind is [`NetworkKind::None`], unless both
    /// probes failed, in which case it is [`NetworkKind::Unknown`].
    #[must_use]
    pub fn network_reading(wifi: Option<&str>, mobile: Option<&str>) -> NetworkReading {
        if let Some(address) = wifi.and_then(Self::parse_inet_address) {
            return NetworkReading {
                kind: NetworkKind::Wifi,
                address,
            };
        }
        if let Some(address) = mobile.and_then(Self::parse_inet_address) {
            return NetworkReading {
                kind: NetworkKind::Mobile,
                address,
            };
        }
        if wifi.is_none() && mobile.is_none() {
            return NetworkReading::default();
        }
        NetworkReading {
            kind: NetworkKind::None,
            address: NO_NETWORK_PLACEHOLDER.to_string(),
        }
    }
}
