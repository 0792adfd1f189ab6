//! Parsers for `devices -l` and `getprop` output

use std::collections::HashMap;

use crate::models::Device;

/// Status token the bridge prints for a ready device
const READY_STATUS: &str = "device";

/// Parses `devices -l` output into ready devices.
///
/// The first line is the "List of devices attached" header and is skipped.
/// Rows need at least an identifier and a status; only rows whose status is
/// exactly `device` are returned. `offline`, `unauthorized`, `no device` and
/// anything else are dropped. `model:` and `product:` qualifiers, when
/// present, seed the model and product name.
#[must_use]
pub fn parse_device_list(output: &str) -> Vec<Device> {
    let mut devices = Vec::new();

    for line in output.lines().skip(1) {
        if line.trim().is_empty() {
            continue;
        }
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 2 || parts[1] != READY_STATUS {
            continue;
        }

        let mut device = Device::new(parts[0]);
        for qualifier in &parts[2..] {
            if let Some(model) = qualifier.strip_prefix("model:") {
                device.model = model.replace('_', " ");
            } else if let Some(product) = qualifier.strip_prefix("product:") {
                device.name = product.to_string();
            }
        }
        devices.push(device);
    }

    devices
}

/// Parses `getprop` output (`[key]: [value]` per line) into a map.
///
/// Lines that do not follow the bracketed shape are ignored.
#[must_use]
pub fn parse_properties(output: &str) -> HashMap<String, String> {
    output
        .lines()
        .filter_map(|line| {
            let (key, value) = line.trim().split_once("]: [")?;
            let key = key.strip_prefix('[')?;
            let value = value.strip_suffix(']')?;
            Some((key.to_string(), value.to_string()))
        })
        .collect()
}
