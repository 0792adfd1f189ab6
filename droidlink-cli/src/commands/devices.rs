//! Device discovery and network attach commands.

use std::path::Path;

use droidlink_core::Device;

use crate::cli::OutputFormat;
use crate::error::CliError;
use crate::util::{connect_address, controller, load_settings, runtime};

/// Devices command handler
pub fn cmd_devices(config_path: Option<&Path>, format: OutputFormat) -> Result<(), CliError> {
    let settings = load_settings(config_path)?;
    let devices = runtime()?.block_on(controller(&settings).rescan());

    match format {
        OutputFormat::Table => print_table(&devices),
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&devices)
                .map_err(|e| CliError::Output(format!("Failed to serialize devices: {e}")))?;
            println!("{json}");
        }
    }
    Ok(())
}

fn print_table(devices: &[Device]) {
    if devices.is_empty() {
        println!("No devices attached.");
        return;
    }

    let id_width = devices.iter().map(|d| d.id.len()).max().unwrap_or(2).max(2);
    let name_width = devices
        .iter()
        .map(|d| d.display_name().len())
        .max()
        .unwrap_or(4)
        .max(4);

    println!(
        "{:<id_width$}  {:<name_width$}  {:<8}  ANDROID",
        "ID", "NAME", "LINK"
    );
    for d in devices {
        let version = if d.android_version.is_empty() {
            "-"
        } else {
            d.android_version.as_str()
        };
        println!(
            "{:<id_width$}  {:<name_width$}  {:<8}  {}",
            d.id,
            d.display_name(),
            d.connection.as_str(),
            version
        );
    }
}

/// Connect command handler
pub fn cmd_connect(config_path: Option<&Path>, host: &str, port: Option<u16>) -> Result<(), CliError> {
    let settings = load_settings(config_path)?;
    let address = connect_address(host, port);

    let device = runtime()?.block_on(controller(&settings).connect(&address))?;
    println!("Connected to {} ({})", device.id, device.display_name());
    Ok(())
}

/// Disconnect command handler
pub fn cmd_disconnect(config_path: Option<&Path>, id: &str) -> Result<(), CliError> {
    let settings = load_settings(config_path)?;
    runtime()?.block_on(controller(&settings).disconnect(id))?;
    println!("Disconnected {id}");
    Ok(())
}
