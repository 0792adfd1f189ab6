//! Telemetry poll loop
//!
//! One loop runs per selected device. Each tick issues the CPU, memory,
//! battery and network probes in sequence and publishes a complete
//! [`TelemetrySnapshot`] on a `watch` channel. The loop owns nothing but its
//! device id: it exits as soon as the shared selection names another device,
//! when its handle asks it to stop, or when the selection channel closes.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::Instrument;

use super::settings::MonitoringSettings;
use crate::error::TransportError;
use crate::models::TelemetrySnapshot;
use crate::parser::TelemetryParser;
use crate::shell;
use crate::tracing::span_names;
use crate::transport::Transport;

/// Battery capacity in percent
pub const BATTERY_CAPACITY_PATH: &str = "/sys/class/power_supply/battery/capacity";
/// Battery charging status text
pub const BATTERY_STATUS_PATH: &str = "/sys/class/power_supply/battery/status";
/// CPU summary line from a single `top` iteration
pub const CPU_COMMAND: &str = "top -n 1 | grep 'CPU:'";

/// Handle to a running poll loop
#[derive(Debug)]
pub struct PollerHandle {
    device_id: String,
    stop_tx: mpsc::Sender<()>,
    task: JoinHandle<()>,
}

impl PollerHandle {
    /// Device this loop polls
    #[must_use]
    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    /// Whether the loop has already exited on its own
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stops the loop and waits until it has fully exited
    pub async fn stop(self) {
        let _ = self.stop_tx.try_send(());
        drop(self.stop_tx);
        if let Err(e) = self.task.await {
            tracing::warn!(device = %self.device_id, error = %e, "Telemetry loop ended abnormally");
        }
    }
}

/// Starts polling `device_id`.
///
/// `selection` is the controller's selected-device channel; the loop runs
/// only while it holds `Some(device_id)`. Snapshots replace the value in
/// `snapshots` wholesale. The first poll happens immediately.
pub fn start_poller(
    transport: Arc<dyn Transport>,
    device_id: impl Into<String>,
    settings: &MonitoringSettings,
    mut selection: watch::Receiver<Option<String>>,
    snapshots: watch::Sender<Option<TelemetrySnapshot>>,
) -> PollerHandle {
    let device_id = device_id.into();
    let (stop_tx, mut stop_rx) = mpsc::channel::<()>(1);
    let interval = settings.effective_interval();
    let settings = settings.clone();
    let device = device_id.clone();
    let span = tracing::info_span!(span_names::TELEMETRY_POLL, device = %device_id);

    let task = tokio::spawn(
        async move {
            tracing::debug!(interval = ?interval, "Telemetry loop started");
            loop {
                if !is_selected(&selection, &device) {
                    tracing::debug!("Device no longer selected");
                    break;
                }

                let snapshot = tokio::select! {
                    _ = stop_rx.recv() => break,
                    snapshot = poll_once(transport.as_ref(), &device, &settings) => snapshot,
                };

                // a superseded loop must not overwrite the new device's reading
                if !is_selected(&selection, &device) {
                    break;
                }
                snapshots.send_replace(Some(snapshot));

                tokio::select! {
                    _ = stop_rx.recv() => break,
                    changed = selection.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                    () = tokio::time::sleep(interval) => {}
                }
            }
            tracing::debug!("Telemetry loop stopped");
        }
        .instrument(span),
    );

    PollerHandle {
        device_id,
        stop_tx,
        task,
    }
}

fn is_selected(selection: &watch::Receiver<Option<String>>, device: &str) -> bool {
    selection.borrow().as_deref() == Some(device)
}

/// Runs every probe once and assembles a snapshot.
///
/// Each probe falls back independently: a failed read yields the zeroed
/// value for that field only. The mobile interface is only read when WiFi
/// has no address.
pub async fn poll_once(
    transport: &dyn Transport,
    device: &str,
    settings: &MonitoringSettings,
) -> TelemetrySnapshot {
    let cpu = probe_raw(transport, device, CPU_COMMAND).await;
    let memory = probe(transport, device, &["free", "-m"]).await;
    let capacity = probe(transport, device, &["cat", BATTERY_CAPACITY_PATH]).await;
    let status = probe(transport, device, &["cat", BATTERY_STATUS_PATH]).await;
    let wifi = probe_raw(transport, device, &interface_command(&settings.wifi_interface)).await;
    // WiFi wins whenever it has an address
    let mobile = if wifi
        .as_deref()
        .and_then(TelemetryParser::parse_inet_address)
        .is_some()
    {
        None
    } else {
        probe_raw(transport, device, &interface_command(&settings.mobile_interface)).await
    };

    TelemetrySnapshot {
        device_id: device.to_string(),
        cpu_percent: cpu.as_deref().map_or(0.0, TelemetryParser::parse_cpu),
        memory: memory
            .as_deref()
            .map(TelemetryParser::parse_memory)
            .unwrap_or_default(),
        battery: TelemetryParser::parse_battery(
            capacity.as_deref().unwrap_or_default(),
            status.as_deref().unwrap_or_default(),
        ),
        network: TelemetryParser::network_reading(wifi.as_deref(), mobile.as_deref()),
        captured_at: chrono::Utc::now(),
    }
}

/// `ifconfig`, falling back to `ip addr show` on devices without it
#[must_use]
pub fn interface_command(interface: &str) -> String {
    let iface = shell::quote(interface);
    format!("ifconfig {iface} || ip addr show {iface}")
}

async fn probe(transport: &dyn Transport, device: &str, words: &[&str]) -> Option<String> {
    probe_output(transport.shell(device, words).await, words.first().copied())
}

async fn probe_raw(transport: &dyn Transport, device: &str, command: &str) -> Option<String> {
    probe_output(transport.shell_raw(device, command).await, Some(command))
}

/// A probe that ran but exited non-zero still produced usable output
fn probe_output(
    result: Result<String, TransportError>,
    label: Option<&str>,
) -> Option<String> {
    match result {
        Ok(output) | Err(TransportError::CommandFailed { output, .. }) => Some(output),
        Err(e) => {
            tracing::debug!(probe = label.unwrap_or_default(), error = %e, "Telemetry probe failed");
            None
        }
    }
}
