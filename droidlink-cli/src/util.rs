//! Shared utility functions used across command modules.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use droidlink_core::device::network_address;
use droidlink_core::{AdbTransport, AppSettings, ConfigManager, Device, SessionController, Transport};

use crate::error::CliError;

/// Creates a `ConfigManager` using the optional custom config directory
/// from CLI args.
pub fn create_config_manager(config_path: Option<&Path>) -> Result<ConfigManager, CliError> {
    match config_path {
        Some(path) => Ok(ConfigManager::with_config_dir(path.to_path_buf())),
        None => ConfigManager::new()
            .map_err(|e| CliError::Config(format!("Failed to initialize config: {e}"))),
    }
}

/// Loads settings from the configuration directory
pub fn load_settings(config_path: Option<&Path>) -> Result<AppSettings, CliError> {
    create_config_manager(config_path)?
        .load_settings()
        .map_err(|e| CliError::Config(format!("Failed to load settings: {e}")))
}

/// Loads settings for a single command, with telemetry polling turned off
pub fn command_settings(config_path: Option<&Path>) -> Result<AppSettings, CliError> {
    let mut settings = load_settings(config_path)?;
    settings.monitoring.enabled = false;
    Ok(settings)
}

/// Builds the runtime that drives the core's background loops
pub fn runtime() -> Result<tokio::runtime::Runtime, CliError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| CliError::Config(format!("Failed to start async runtime: {e}")))
}

/// Creates a session controller over the configured `adb` executable
pub fn controller(settings: &AppSettings) -> SessionController {
    let transport: Arc<dyn Transport> = Arc::new(AdbTransport::from_settings(&settings.adb));
    SessionController::new(transport, settings)
}

/// Scans for devices and selects the requested one (or the only one)
pub async fn open_session(
    settings: &AppSettings,
    requested: Option<&str>,
) -> Result<SessionController, CliError> {
    let session = controller(settings);
    let devices = session.rescan().await;
    let id = resolve_device(&devices, requested)?;
    tracing::debug!(device = %id, found = devices.len(), "Opening session");
    session.select(&id).await?;
    Ok(session)
}

/// Picks the device to work with.
///
/// A requested id must be among the connected devices; otherwise exactly
/// one device must be attached.
pub fn resolve_device(devices: &[Device], requested: Option<&str>) -> Result<String, CliError> {
    let connected: Vec<&Device> = devices.iter().filter(|d| d.connected).collect();

    if let Some(id) = requested {
        return connected
            .iter()
            .find(|d| d.id == id)
            .map(|d| d.id.clone())
            .ok_or_else(|| CliError::DeviceNotFound(id.to_string()));
    }

    match connected.as_slice() {
        [] => Err(CliError::DeviceNotFound("no devices attached".to_string())),
        [only] => Ok(only.id.clone()),
        many => {
            let ids: Vec<_> = many.iter().map(|d| d.id.as_str()).collect();
            Err(CliError::AmbiguousDevice(ids.join(", ")))
        }
    }
}

/// `host:port` for a connect request; a host that already names a port is
/// used as given
pub fn connect_address(host: &str, port: Option<u16>) -> String {
    match (host.rsplit_once(':'), port) {
        (Some((_, existing)), None) if existing.parse::<u16>().is_ok() => host.to_string(),
        _ => network_address(host, port),
    }
}

/// Expands `~` and environment variables in a local path
pub fn expand_local(path: &str) -> Result<PathBuf, CliError> {
    shellexpand::full(path)
        .map(|p| PathBuf::from(p.as_ref()))
        .map_err(|e| CliError::Config(format!("Invalid path '{path}': {e}")))
}
