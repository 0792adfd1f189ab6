//! Selected-device lifecycle
//!
//! The controller is the single owner of device-scoped state: which device is
//! selected, its telemetry loop, its long-running command, the last directory
//! listing and the command history. Selection changes are serialized, and
//! each one fully tears down the previous device's loops before the next
//! device's are started.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;
use tracing::Instrument;

use super::history::{CommandHistory, HistoryEntry, HistoryKind};
use crate::config::{AppSettings, MonitoringSettings};
use crate::device;
use crate::error::{SessionError, SessionResult};
use crate::exec::{CommandHandle, ExecutionEngine};
use crate::files::{self, ROOT_PATH};
use crate::models::{Device, FileEntry, TelemetrySnapshot, parent_remote_path};
use crate::monitoring::{PollerHandle, start_poller};
use crate::tracing::span_names;
use crate::transport::Transport;

/// Device-scoped view state, cleared on every reset
#[derive(Debug)]
struct DeviceView {
    current_path: String,
    listing: Vec<FileEntry>,
    history: CommandHistory,
}

impl Default for DeviceView {
    fn default() -> Self {
        Self {
            current_path: ROOT_PATH.to_string(),
            listing: Vec::new(),
            history: CommandHistory::default(),
        }
    }
}

/// Owns the selected device and everything bound to it
pub struct SessionController {
    transport: Arc<dyn Transport>,
    engine: ExecutionEngine,
    monitoring: MonitoringSettings,
    selection: watch::Sender<Option<String>>,
    snapshots: watch::Sender<Option<TelemetrySnapshot>>,
    devices: watch::Sender<Vec<Device>>,
    // held for the whole of a selection change
    poller: tokio::sync::Mutex<Option<PollerHandle>>,
    view: Mutex<DeviceView>,
}

impl std::fmt::Debug for SessionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionController")
            .field("selected", &self.selected())
            .field("engine", &self.engine)
            .finish_non_exhaustive()
    }
}

impl SessionController {
    /// Creates a controller with nothing selected
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>, settings: &AppSettings) -> Self {
        let engine = ExecutionEngine::new(Arc::clone(&transport), settings.exec.clone());
        Self {
            transport,
            engine,
            monitoring: settings.monitoring.clone(),
            selection: watch::Sender::new(None),
            snapshots: watch::Sender::new(None),
            devices: watch::Sender::new(Vec::new()),
            poller: tokio::sync::Mutex::new(None),
            view: Mutex::new(DeviceView::default()),
        }
    }

    /// The execution engine
    #[must_use]
    pub const fn engine(&self) -> &ExecutionEngine {
        &self.engine
    }

    // --- observable state ---

    /// Currently selected device id
    #[must_use]
    pub fn selected(&self) -> Option<String> {
        self.selection.borrow().clone()
    }

    /// Watches the selected device id
    #[must_use]
    pub fn subscribe_selection(&self) -> watch::Receiver<Option<String>> {
        self.selection.subscribe()
    }

    /// Latest telemetry snapshot of the selected device
    #[must_use]
    pub fn snapshot(&self) -> Option<TelemetrySnapshot> {
        self.snapshots.borrow().clone()
    }

    /// Watches telemetry snapshots, latest value wins
    #[must_use]
    pub fn subscribe_snapshots(&self) -> watch::Receiver<Option<TelemetrySnapshot>> {
        self.snapshots.subscribe()
    }

    /// Devices from the last scan
    #[must_use]
    pub fn devices(&self) -> Vec<Device> {
        self.devices.borrow().clone()
    }

    /// Watches the device list
    #[must_use]
    pub fn subscribe_devices(&self) -> watch::Receiver<Vec<Device>> {
        self.devices.subscribe()
    }

    /// Directory shown for the selected device
    #[must_use]
    pub fn current_path(&self) -> String {
        self.lock_view().current_path.clone()
    }

    /// Last listing of [`Self::current_path`]
    #[must_use]
    pub fn listing(&self) -> Vec<FileEntry> {
        self.lock_view().listing.clone()
    }

    /// Command history of the selected device, oldest first
    #[must_use]
    pub fn history(&self) -> Vec<HistoryEntry> {
        self.lock_view().history.entries().to_vec()
    }

    // --- discovery ---

    /// Re-runs discovery and publishes the result.
    ///
    /// A selected device that is no longer reported is deselected. A failed
    /// discovery counts as an empty result.
    pub async fn rescan(&self) -> Vec<Device> {
        let found = device::discover(self.transport.as_ref()).await;
        self.devices.send_replace(found.clone());

        if let Some(selected) = self.selected()
            && !found.iter().any(|d| d.id == selected)
        {
            tracing::info!(device = %selected, "Selected device disappeared");
            self.deselect_if(&selected).await;
        }
        found
    }

    /// Attaches a TCP/IP device and rescans
    ///
    /// # Errors
    ///
    /// Returns an error when the bridge refuses the connection.
    pub async fn connect(&self, address: &str) -> SessionResult<Device> {
        let connected = device::connect(self.transport.as_ref(), address).await?;
        let devices = self.rescan().await;
        Ok(devices
            .into_iter()
            .find(|d| d.id == connected.id)
            .unwrap_or(connected))
    }

    /// Detaches a device, deselecting it if it is the selected one
    ///
    /// # Errors
    ///
    /// Returns an error if the bridge call fails; the device is still
    /// deselected and marked disconnected in that case.
    pub async fn disconnect(&self, device_id: &str) -> SessionResult<()> {
        let result = device::disconnect(self.transport.as_ref(), device_id).await;

        self.devices.send_modify(|devices| {
            for d in devices.iter_mut() {
                if d.id == device_id {
                    *d = d.disconnected();
                }
            }
        });

        self.deselect_if(device_id).await;
        result.map_err(SessionError::from)
    }

    // --- selection ---

    /// Selects `device_id` and loads its root listing.
    ///
    /// Selecting a different device first resets everything bound to the
    /// previous one. Re-selecting the current device only reloads the listing.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::UnknownDevice`] if the id is not among the
    /// connected devices of the last scan.
    pub async fn select(&self, device_id: &str) -> SessionResult<Vec<FileEntry>> {
        let known = self
            .devices
            .borrow()
            .iter()
            .any(|d| d.id == device_id && d.connected);
        if !known {
            return Err(SessionError::UnknownDevice(device_id.to_string()));
        }

        let span = tracing::info_span!(span_names::SESSION_SELECT, device = device_id);
        async {
            let mut poller = self.poller.lock().await;

            if self.selected().as_deref() == Some(device_id) {
                drop(poller);
                return Ok(self.list_directory(ROOT_PATH).await);
            }

            if let Some(previous) = self.selected() {
                self.reset(&mut poller, &previous).await;
            }

            self.selection.send_replace(Some(device_id.to_string()));
            tracing::info!("Device selected");

            let listing = self.load_listing(device_id, ROOT_PATH).await;

            if self.monitoring.enabled {
                *poller = Some(start_poller(
                    Arc::clone(&self.transport),
                    device_id,
                    &self.monitoring,
                    self.selection.subscribe(),
                    self.snapshots.clone(),
                ));
            }
            Ok(listing)
        }
        .instrument(span)
        .await
    }

    /// Clears the selection, tearing down the device's loops
    pub async fn deselect(&self) {
        let mut poller = self.poller.lock().await;
        if let Some(previous) = self.selected() {
            self.clear_selection(&mut poller, &previous).await;
        }
    }

    /// Deselects `device_id` only if it is still the selected device once the
    /// selection lock is held. Returns whether it was deselected.
    async fn deselect_if(&self, device_id: &str) -> bool {
        let mut poller = self.poller.lock().await;
        if self.selected().as_deref() != Some(device_id) {
            tracing::debug!(device = device_id, "Selection moved on, nothing to deselect");
            return false;
        }
        self.clear_selection(&mut poller, device_id).await;
        true
    }

    async fn clear_selection(&self, poller: &mut Option<PollerHandle>, device_id: &str) {
        self.reset(poller, device_id).await;
        self.selection.send_replace(None);
        tracing::info!(device = device_id, "Device deselected");
    }

    /// Deselects and discards every long-running command
    pub async fn shutdown(&self) {
        self.deselect().await;
        self.engine.shutdown().await;
    }

    /// Stops the telemetry loop and discards the command session of
    /// `device_id`, then clears the view state. The caller holds the
    /// selection lock.
    async fn reset(&self, poller: &mut Option<PollerHandle>, device_id: &str) {
        if let Some(handle) = poller.take() {
            handle.stop().await;
        }
        self.engine.discard(device_id).await;
        *self.lock_view() = DeviceView::default();
        self.snapshots.send_replace(None);
        tracing::debug!(device = device_id, "Device state reset");
    }

    // --- filesystem ---

    /// Lists `path` on the selected device and makes it the current path.
    ///
    /// A bridge failure yields an empty listing. Returns an empty listing
    /// when nothing is selected.
    pub async fn list_directory(&self, path: &str) -> Vec<FileEntry> {
        match self.selected() {
            Some(device) => self.load_listing(&device, path).await,
            None => Vec::new(),
        }
    }

    /// Lists the parent of the current path
    pub async fn navigate_up(&self) -> Vec<FileEntry> {
        let parent = parent_remote_path(&self.current_path());
        self.list_directory(&parent).await
    }

    async fn load_listing(&self, device: &str, path: &str) -> Vec<FileEntry> {
        let entries = files::list_directory(self.transport.as_ref(), device, path)
            .await
            .unwrap_or_else(|e| {
                tracing::warn!(device, path, error = %e, "Listing failed");
                Vec::new()
            });

        // the selection may have moved on while the listing was in flight
        if self.selected().as_deref() == Some(device) {
            let mut view = self.lock_view();
            view.current_path = path.to_string();
            view.listing.clone_from(&entries);
        }
        entries
    }

    /// Reads a file on the selected device
    ///
    /// # Errors
    ///
    /// Returns an error if nothing is selected or `cat` fails.
    pub async fn read_file(&self, path: &str) -> SessionResult<String> {
        let device = self.require_selected()?;
        Ok(files::read_file(self.transport.as_ref(), &device, path).await?)
    }

    /// Copies a file from the selected device to the host
    ///
    /// # Errors
    ///
    /// Returns an error if nothing is selected or the transfer fails.
    pub async fn pull(&self, remote: &str, local: &Path) -> SessionResult<String> {
        let device = self.require_selected()?;
        Ok(files::pull(self.transport.as_ref(), &device, remote, local).await?)
    }

    /// Copies a host file to the selected device
    ///
    /// # Errors
    ///
    /// Returns an error if nothing is selected or the transfer fails.
    pub async fn push(&self, local: &Path, remote: &str) -> SessionResult<String> {
        let device = self.require_selected()?;
        Ok(files::push(self.transport.as_ref(), &device, local, remote).await?)
    }

    // --- commands ---

    /// Runs a one-shot command on the selected device and records it
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NoDeviceSelected`] if nothing is selected.
    /// Bridge failures come back as `Error: ...` output instead.
    pub async fn execute(&self, command_line: &str) -> SessionResult<String> {
        match self.try_execute(command_line).await {
            Err(SessionError::Transport(e)) => Ok(format!("Error: {e}")),
            other => other,
        }
    }

    /// Runs a one-shot command on the selected device and records it,
    /// keeping bridge failures apart from what the command printed
    ///
    /// # Errors
    ///
    /// Returns an error if nothing is selected or the bridge call fails. The
    /// failure is recorded as a diagnostic.
    pub async fn try_execute(&self, command_line: &str) -> SessionResult<String> {
        let device = self.require_selected()?;
        if self.engine.has_session(&device) {
            tracing::debug!(device = %device, "One-shot command while a long-running command is active");
        }

        match self.engine.try_execute(&device, command_line).await {
            Ok(output) => {
                self.record(&device, HistoryKind::Executed, command_line, &output);
                Ok(output)
            }
            Err(e) => {
                self.record(&device, HistoryKind::Diagnostic, command_line, &format!("Error: {e}"));
                Err(e.into())
            }
        }
    }

    /// Starts a long-running command on the selected device
    ///
    /// # Errors
    ///
    /// Returns an error if nothing is selected or the launch fails; a failed
    /// launch is also recorded as a diagnostic in the history.
    pub async fn start_command(&self, command_line: &str) -> SessionResult<CommandHandle> {
        let device = self.require_selected()?;
        match self.engine.start_long_running(&device, command_line).await {
            Ok(handle) => {
                let notice = format!("started with pid {}", handle.pid());
                self.record(&device, HistoryKind::Started, command_line, &notice);
                Ok(handle)
            }
            Err(e) => {
                self.record(&device, HistoryKind::Diagnostic, command_line, &format!("Error: {e}"));
                Err(e.into())
            }
        }
    }

    /// Sends a kill signal to the selected device's long-running command
    ///
    /// # Errors
    ///
    /// Returns an error if nothing is selected or no command is running.
    pub async fn stop_command(&self) -> SessionResult<bool> {
        let device = self.require_selected()?;
        let pid = self.engine.active_pid(&device);
        let stopped = self.engine.terminate_active(&device).await?;
        if !stopped {
            let message = format!("Error: failed to terminate {}", pid.unwrap_or_default());
            self.record(&device, HistoryKind::Diagnostic, "kill", &message);
        }
        Ok(stopped)
    }

    fn require_selected(&self) -> SessionResult<String> {
        self.selected().ok_or(SessionError::NoDeviceSelected)
    }

    fn record(&self, device: &str, kind: HistoryKind, command: &str, output: &str) {
        if self.selected().as_deref() != Some(device) {
            return;
        }
        self.lock_view().history.record(kind, command, output);
    }

    fn lock_view(&self) -> MutexGuard<'_, DeviceView> {
        self.view.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
