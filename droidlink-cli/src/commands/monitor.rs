//! Telemetry monitor command.

use std::path::Path;
use std::time::Duration;

use droidlink_core::TelemetrySnapshot;

use crate::cli::OutputFormat;
use crate::error::CliError;
use crate::util::{load_settings, open_session, runtime};

/// Parameters for the monitor command
pub struct MonitorParams {
    pub count: Option<u32>,
    pub interval_ms: Option<u64>,
    pub format: OutputFormat,
}

/// Monitor command handler
pub fn cmd_monitor(
    config_path: Option<&Path>,
    device: Option<&str>,
    params: MonitorParams,
) -> Result<(), CliError> {
    let mut settings = load_settings(config_path)?;
    settings.monitoring.enabled = true;
    if let Some(ms) = params.interval_ms {
        settings.monitoring = settings.monitoring.with_interval(Duration::from_millis(ms));
    }

    runtime()?.block_on(async {
        let session = open_session(&settings, device).await?;
        let mut snapshots = session.subscribe_snapshots();
        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);
        let mut printed = 0u32;

        let result = loop {
            if params.count.is_some_and(|limit| printed >= limit) {
                break Ok(());
            }
            tokio::select! {
                changed = snapshots.changed() => {
                    if changed.is_err() {
                        break Ok(());
                    }
                    let snapshot = snapshots.borrow_and_update().clone();
                    if let Some(snapshot) = snapshot {
                        if let Err(e) = print_snapshot(&snapshot, params.format) {
                            break Err(e);
                        }
                        printed += 1;
                    }
                }
                _ = &mut ctrl_c => break Ok(()),
            }
        };

        session.shutdown().await;
        result
    })
}

fn print_snapshot(snapshot: &TelemetrySnapshot, format: OutputFormat) -> Result<(), CliError> {
    match format {
        OutputFormat::Table => println!("{}", format_snapshot(snapshot)),
        OutputFormat::Json => {
            let json = serde_json::to_string(snapshot)
                .map_err(|e| CliError::Output(format!("Failed to serialize snapshot: {e}")))?;
            println!("{json}");
        }
    }
    Ok(())
}

/// One-line human summary of a snapshot
fn format_snapshot(s: &TelemetrySnapshot) -> String {
    let charging = if s.battery.charging { " charging" } else { "" };
    format!(
        "{}  CPU {:5.1}%  MEM {}/{} MB ({:.0}%)  BAT {}%{}  NET {} {}",
        s.captured_at.format("%H:%M:%S"),
        s.cpu_percent,
        s.memory.used_mb,
        s.memory.total_mb,
        s.memory.percent(),
        s.battery.percent,
        charging,
        s.network.kind,
        s.network.address
    )
}
