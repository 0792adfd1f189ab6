//! Command handler modules for the CLI.

mod completions;
mod config;
mod devices;
mod files;
mod monitor;
mod shell;

use std::path::Path;

use crate::cli::Commands;
use crate::error::CliError;

/// Dispatch a CLI command to the appropriate handler.
pub fn dispatch(
    config_path: Option<&Path>,
    device: Option<&str>,
    quiet: bool,
    command: Commands,
) -> Result<(), CliError> {
    match command {
        Commands::Devices { format } => devices::cmd_devices(config_path, format),
        Commands::Connect { host, port } => devices::cmd_connect(config_path, &host, port),
        Commands::Disconnect { id } => devices::cmd_disconnect(config_path, &id),
        Commands::Ls { path, format } => files::cmd_ls(config_path, device, &path, format),
        Commands::Cat { path } => files::cmd_cat(config_path, device, &path),
        Commands::Pull { remote, local } => files::cmd_pull(config_path, device, &remote, &local),
        Commands::Push { local, remote } => files::cmd_push(config_path, device, &local, &remote),
        Commands::Shell { command } => shell::cmd_shell(config_path, device, &command.join(" ")),
        Commands::Run { command } => shell::cmd_run(config_path, device, &command.join(" "), quiet),
        Commands::Monitor {
            count,
            interval,
            format,
        } => monitor::cmd_monitor(
            config_path,
            device,
            monitor::MonitorParams {
                count,
                interval_ms: interval,
                format,
            },
        ),
        Commands::Config(subcmd) => config::cmd_config(config_path, subcmd),
        Commands::Completions { shell } => completions::cmd_completions(shell),
    }
}
