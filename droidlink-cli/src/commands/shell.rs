//! One-shot and long-running shell commands.

use std::io::Write as _;
use std::path::Path;

use droidlink_core::{
    CommandEvent, ExecError, FinishReason, SessionController, SessionError, SessionResult,
};

use crate::error::CliError;
use crate::util::{command_settings, open_session, runtime};

/// Shell command handler
pub fn cmd_shell(
    config_path: Option<&Path>,
    device: Option<&str>,
    command_line: &str,
) -> Result<(), CliError> {
    let settings = command_settings(config_path)?;
    let output = runtime()?.block_on(async {
        let session = open_session(&settings, device).await?;
        let output = session.try_execute(command_line).await;
        session.shutdown().await;
        output.map_err(CliError::from)
    })?;

    print!("{output}");
    Ok(())
}

/// Run command handler
///
/// Streams output until the remote process exits. The first Ctrl-C sends a
/// kill to the remote process and keeps draining until the stream closes.
pub fn cmd_run(
    config_path: Option<&Path>,
    device: Option<&str>,
    command_line: &str,
    quiet: bool,
) -> Result<(), CliError> {
    let settings = command_settings(config_path)?;
    runtime()?.block_on(async {
        let session = open_session(&settings, device).await?;
        let result = stream_command(&session, command_line, quiet).await;
        session.shutdown().await;
        result
    })
}

async fn stream_command(
    session: &SessionController,
    command_line: &str,
    quiet: bool,
) -> Result<(), CliError> {
    let mut handle = session.start_command(command_line).await?;
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut interrupted = false;
    let mut stdout = std::io::stdout();

    let reason = loop {
        tokio::select! {
            event = handle.next_event() => match event {
                Some(CommandEvent::Started { pid }) => {
                    if !quiet {
                        eprintln!("[started pid {pid}]");
                    }
                }
                Some(CommandEvent::Output(text)) => {
                    stdout.write_all(text.as_bytes())?;
                    stdout.flush()?;
                }
                Some(CommandEvent::Diagnostic(message)) => eprintln!("{message}"),
                Some(CommandEvent::Finished(reason)) => break reason,
                None => break FinishReason::Cancelled,
            },
            _ = &mut ctrl_c, if !interrupted => {
                interrupted = true;
                if !stop_outcome(session.stop_command().await)? {
                    eprintln!("Could not stop pid {}", handle.pid());
                }
            }
        }
    };

    if !quiet {
        eprintln!("[{reason}]");
    }
    match reason {
        FinishReason::TransportLost => Err(CliError::Device(format!(
            "lost contact with {} while running '{command_line}'",
            handle.device_id()
        ))),
        FinishReason::Exited | FinishReason::Cancelled => Ok(()),
    }
}

/// A command that finished before the kill arrived counts as stopped; the
/// stream still carries its last output and the finish event.
fn stop_outcome(result: SessionResult<bool>) -> Result<bool, CliError> {
    match result {
        Err(SessionError::Exec(ExecError::NoSession(_))) => Ok(true),
        other => other.map_err(CliError::from),
    }
}
