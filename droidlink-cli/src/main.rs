//! `DroidLink` CLI - Command-line interface for remote Android sessions
//!
//! Provides commands for discovering and attaching devices, browsing and
//! transferring files, running one-shot and long-running shell commands,
//! and watching device telemetry.

mod cli;
mod commands;
mod error;
mod util;

use clap::Parser;
use cli::Cli;
use droidlink_core::tracing::{TracingConfig, TracingLevel, init_tracing};

fn main() {
    let cli = Cli::parse();
    let config_path = cli.config.as_deref();

    if let Err(e) = init_tracing(&tracing_config(&cli)) {
        eprintln!("Failed to initialize logging: {e}");
    }

    let result = commands::dispatch(config_path, cli.device.as_deref(), cli.quiet, cli.command);

    if let Err(e) = result {
        if !cli.quiet {
            eprintln!("Error: {e}");
        }
        std::process::exit(e.exit_code());
    }
}

fn tracing_config(cli: &Cli) -> TracingConfig {
    let level = if cli.quiet {
        TracingLevel::Error
    } else {
        TracingLevel::from_verbosity(cli.verbose)
    };
    let mut config = TracingConfig::new().with_level(level);
    if let Some(path) = &cli.log_file {
        config = config.with_log_file(path);
    }
    if let Some(filter) = &cli.log_filter {
        config = config.with_filter(filter);
    }
    config
}
