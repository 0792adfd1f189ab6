//! Remote filesystem commands.

use std::path::Path;

use droidlink_core::FileEntry;

use crate::cli::OutputFormat;
use crate::error::CliError;
use crate::util::{command_settings, expand_local, open_session, runtime};

/// Ls command handler
pub fn cmd_ls(
    config_path: Option<&Path>,
    device: Option<&str>,
    path: &str,
    format: OutputFormat,
) -> Result<(), CliError> {
    let settings = command_settings(config_path)?;
    let entries = runtime()?.block_on(async {
        let session = open_session(&settings, device).await?;
        let entries = session.list_directory(path).await;
        session.shutdown().await;
        Ok::<_, CliError>(entries)
    })?;

    match format {
        OutputFormat::Table => print_listing(&entries),
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&entries)
                .map_err(|e| CliError::Output(format!("Failed to serialize listing: {e}")))?;
            println!("{json}");
        }
    }
    Ok(())
}

fn print_listing(entries: &[FileEntry]) {
    for e in entries {
        let name = if e.is_directory {
            format!("{}/", e.name)
        } else {
            e.name.clone()
        };
        println!(
            "{}  {:>9}  {:<16}  {}",
            e.permissions,
            e.human_size(),
            e.human_modified(),
            name
        );
    }
}

/// Cat command handler
pub fn cmd_cat(config_path: Option<&Path>, device: Option<&str>, path: &str) -> Result<(), CliError> {
    let settings = command_settings(config_path)?;
    let contents = runtime()?.block_on(async {
        let session = open_session(&settings, device).await?;
        let contents = session.read_file(path).await;
        session.shutdown().await;
        contents.map_err(CliError::from)
    })?;
    print!("{contents}");
    Ok(())
}

/// Pull command handler
pub fn cmd_pull(
    config_path: Option<&Path>,
    device: Option<&str>,
    remote: &str,
    local: &str,
) -> Result<(), CliError> {
    let settings = command_settings(config_path)?;
    let local = expand_local(local)?;
    let output = runtime()?.block_on(async {
        let session = open_session(&settings, device).await?;
        let output = session.pull(remote, &local).await;
        session.shutdown().await;
        output.map_err(CliError::from)
    })?;
    print_transfer_summary(&output);
    Ok(())
}

/// Push command handler
pub fn cmd_push(
    config_path: Option<&Path>,
    device: Option<&str>,
    local: &str,
    remote: &str,
) -> Result<(), CliError> {
    let settings = command_settings(config_path)?;
    let local = expand_local(local)?;
    if !local.exists() {
        return Err(CliError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("{} does not exist", local.display()),
        )));
    }

    let output = runtime()?.block_on(async {
        let session = open_session(&settings, device).await?;
        let output = session.push(&local, remote).await;
        session.shutdown().await;
        output.map_err(CliError::from)
    })?;
    print_transfer_summary(&output);
    Ok(())
}

fn print_transfer_summary(output: &str) {
    let summary = output.trim();
    if !summary.is_empty() {
        println!("{summary}");
    }
}
