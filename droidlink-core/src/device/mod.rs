//! Device discovery and network attachment
//!
//! Discovery runs `devices -l`, keeps the ready rows and then fills in
//! details from each device's `getprop`, concurrently.

use std::collections::HashMap;

use futures::future::join_all;
use tracing::Instrument;

use crate::error::{TransportError, TransportResult};
use crate::models::Device;
use crate::parser::{parse_device_list, parse_properties};
use crate::tracing::span_names;
use crate::transport::Transport;

/// Port `adb connect` assumes when none is given
pub const DEFAULT_TCP_PORT: u16 = 5555;

/// Marker present in `adb connect` output on success (also "already connected to")
const CONNECTED_MARKER: &str = "connected to";

/// Lists ready devices, enriched with their properties.
///
/// # Errors
///
/// Returns an error if the `devices -l` call itself fails. A device whose
/// property query fails is kept with the fields discovery gave it.
pub async fn scan_devices(transport: &dyn Transport) -> TransportResult<Vec<Device>> {
    async {
        let output = transport
            .execute(None, &["devices".to_string(), "-l".to_string()])
            .await?;
        let devices = parse_device_list(&output);
        tracing::debug!(count = devices.len(), "Devices discovered");
        Ok(enrich_devices(transport, devices).await)
    }
    .instrument(tracing::info_span!(span_names::DEVICE_SCAN))
    .await
}

/// Like [`scan_devices`] but a failed discovery reads as no devices
pub async fn discover(transport: &dyn Transport) -> Vec<Device> {
    scan_devices(transport).await.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Device discovery failed");
        Vec::new()
    })
}

/// Queries `getprop` on every device at once and applies the results
pub async fn enrich_devices(transport: &dyn Transport, devices: Vec<Device>) -> Vec<Device> {
    let lookups = devices.iter().map(|d| fetch_properties(transport, &d.id));
    let properties = join_all(lookups).await;

    devices
        .into_iter()
        .zip(properties)
        .map(|(device, props)| match props {
            Ok(props) => device.with_properties(&props),
            Err(e) => {
                tracing::debug!(device = %device.id, error = %e, "Property query failed");
                device
            }
        })
        .collect()
}

/// All system properties of `device`
///
/// # Errors
///
/// Returns an error if the `getprop` call fails.
pub async fn fetch_properties(
    transport: &dyn Transport,
    device: &str,
) -> TransportResult<HashMap<String, String>> {
    let output = transport.shell(device, &["getprop"]).await?;
    Ok(parse_properties(&output))
}

/// `host:port`, using [`DEFAULT_TCP_PORT`] when `port` is `None`
#[must_use]
pub fn network_address(host: &str, port: Option<u16>) -> String {
    format!("{host}:{}", port.unwrap_or(DEFAULT_TCP_PORT))
}

/// Attaches a device over TCP/IP.
///
/// Succeeds when the bridge reports `connected to` (including `already
/// connected to`); the returned record has only its identifier filled in.
///
/// # Errors
///
/// Returns the bridge output as [`TransportError::CommandFailed`] when the
/// connection was refused, or any transport failure.
pub async fn connect(transport: &dyn Transport, address: &str) -> TransportResult<Device> {
    let output = transport
        .execute(None, &["connect".to_string(), address.to_string()])
        .await?;

    if output.contains(CONNECTED_MARKER) {
        tracing::info!(address, "Device connected");
        Ok(Device::new(address))
    } else {
        tracing::warn!(address, output = output.trim(), "Connect refused");
        Err(TransportError::CommandFailed {
            status: "not connected".to_string(),
            output: output.trim().to_string(),
        })
    }
}

/// Detaches a TCP/IP device
///
/// # Errors
///
/// Returns an error if the bridge call fails.
pub async fn disconnect(transport: &dyn Transport, device: &str) -> TransportResult<()> {
    transport
        .execute(None, &["disconnect".to_string(), device.to_string()])
        .await?;
    tracing::info!(device, "Device disconnected");
    Ok(())
}
