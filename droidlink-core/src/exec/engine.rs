//! Synchronous and long-running command execution
//!
//! The bridge only offers request/response calls. A long-running command is
//! therefore launched detached with its output redirected to a per-device
//! scratch file, and a background loop turns that file into a stream: every
//! poll it reads what was appended since the last delivered byte and asks
//! `ps` whether the process is still there. Offsets count raw bytes; a
//! multi-byte character split across two reads is held back until complete. Absence from the listing is the
//! only completion signal, so a recycled pid can keep a finished command
//! looking alive until the new owner exits.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::Instrument;

use super::events::{CommandEvent, CommandHandle, FinishReason};
use crate::config::ExecSettings;
use crate::error::{ExecError, ExecResult, TransportError, TransportResult};
use crate::parser::{is_process_listed, parse_pid};
use crate::shell;
use crate::tracing::span_names;
use crate::transport::Transport;

/// Text `kill` prints for a pid that is already gone
const NO_SUCH_PROCESS: &str = "No such process";

/// Bookkeeping for the one long-running command a device may have
#[derive(Debug)]
struct ActiveSession {
    generation: u64,
    pid: u32,
    scratch_file: String,
    terminated: Arc<AtomicBool>,
    events: mpsc::UnboundedSender<CommandEvent>,
    stop_tx: mpsc::Sender<()>,
    task: JoinHandle<()>,
}

type SessionTable = Arc<Mutex<HashMap<String, ActiveSession>>>;

/// Runs commands on devices and owns their long-running sessions
pub struct ExecutionEngine {
    transport: Arc<dyn Transport>,
    settings: ExecSettings,
    sessions: SessionTable,
    start_lock: tokio::sync::Mutex<()>,
    next_generation: AtomicU64,
}

impl std::fmt::Debug for ExecutionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionEngine")
            .field("settings", &self.settings)
            .field("active", &self.active_devices())
            .finish_non_exhaustive()
    }
}

impl ExecutionEngine {
    /// Creates an engine issuing commands through `transport`
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>, settings: ExecSettings) -> Self {
        Self {
            transport,
            settings,
            sessions: Arc::new(Mutex::new(HashMap::new())),
            start_lock: tokio::sync::Mutex::new(()),
            next_generation: AtomicU64::new(1),
        }
    }

    /// Settings in use
    #[must_use]
    pub const fn settings(&self) -> &ExecSettings {
        &self.settings
    }

    /// Runs `command_line` once and returns its output.
    ///
    /// A command that ran but exited non-zero still returns what it printed.
    ///
    /// # Errors
    ///
    /// Returns the transport error when the bridge call itself fails, or the
    /// command failed without printing anything.
    pub async fn try_execute(&self, device: &str, command_line: &str) -> TransportResult<String> {
        match self.transport.shell_raw(device, command_line).await {
            Err(TransportError::CommandFailed { output, .. }) if !output.is_empty() => Ok(output),
            Err(e) => {
                tracing::debug!(device, error = %e, "Synchronous command failed");
                Err(e)
            }
            ok => ok,
        }
    }

    /// Like [`ExecutionEngine::try_execute`], but a failure comes back as an
    /// `Error: ...` line.
    pub async fn execute(&self, device: &str, command_line: &str) -> String {
        self.try_execute(device, command_line)
            .await
            .unwrap_or_else(|e| format!("Error: {e}"))
    }

    /// Starts `command_line` detached and begins streaming its output.
    ///
    /// Any session already active on `device` is discarded first, so at most
    /// one exists per device. Concurrent starts are serialized.
    ///
    /// # Errors
    ///
    /// Returns an error if the launch fails at the bridge or does not echo a
    /// process id.
    pub async fn start_long_running(
        &self,
        device: &str,
        command_line: &str,
    ) -> ExecResult<CommandHandle> {
        let _serialized = self.start_lock.lock().await;

        if self.discard(device).await {
            tracing::debug!(device, "Replaced previous long-running command");
        }

        let scratch_file = shell::scratch_file_for(&self.settings.scratch_dir, device);
        let launch = shell::detached(command_line, &scratch_file);
        let output = self.transport.shell_raw(device, &launch).await?;
        let pid = parse_pid(&output)
            .ok_or_else(|| ExecError::PidNotCaptured(output.trim().to_string()))?;

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let _ = events_tx.send(CommandEvent::Started { pid });

        let (stop_tx, stop_rx) = mpsc::channel::<()>(1);
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let terminated = Arc::new(AtomicBool::new(false));

        let output_loop = OutputLoop {
            transport: Arc::clone(&self.transport),
            device: device.to_string(),
            pid,
            scratch_file: scratch_file.clone(),
            interval: self.settings.effective_poll_interval(),
            max_failures: self.settings.effective_max_failures(),
            terminated: Arc::clone(&terminated),
            events: events_tx.clone(),
            sessions: Arc::clone(&self.sessions),
            generation,
        };
        let span = tracing::info_span!(span_names::COMMAND_STREAM, device, pid);

        // The loop removes its own entry on exit, so it must not run before
        // the entry exists.
        {
            let mut sessions = lock_table(&self.sessions);
            let task = tokio::spawn(output_loop.run(stop_rx).instrument(span));
            sessions.insert(
                device.to_string(),
                ActiveSession {
                    generation,
                    pid,
                    scratch_file,
                    terminated,
                    events: events_tx,
                    stop_tx,
                    task,
                },
            );
        }

        tracing::info!(device, pid, command = command_line, "Long-running command started");
        Ok(CommandHandle::new(device.to_string(), pid, events_rx))
    }

    /// Sends a kill signal to `pid` on `device`.
    ///
    /// Returns `true` when the signal was delivered or the process was
    /// already gone. The output loop is left running and closes the stream
    /// once it sees the process missing. A failure is also reported as a
    /// diagnostic on the device's stream.
    pub async fn terminate(&self, device: &str, pid: u32) -> bool {
        let intent = self.session_state(device, pid).map(|(terminated, _)| terminated);
        if let Some(ref terminated) = intent {
            terminated.store(true, Ordering::SeqCst);
        }

        let pid_arg = pid.to_string();
        match self.transport.shell(device, &["kill", pid_arg.as_str()]).await {
            Ok(_) => {
                tracing::info!(device, pid, "Kill signal sent");
                true
            }
            Err(ref e) if e.output().is_some_and(|o| o.contains(NO_SUCH_PROCESS)) => {
                tracing::debug!(device, pid, "Process already gone");
                true
            }
            Err(e) => {
                tracing::warn!(device, pid, error = %e, "Failed to terminate process");
                if let Some(terminated) = intent {
                    terminated.store(false, Ordering::SeqCst);
                }
                if let Some((_, events)) = self.session_state(device, pid) {
                    let _ = events.send(CommandEvent::Diagnostic(format!(
                        "Failed to terminate {pid}: {e}"
                    )));
                }
                false
            }
        }
    }

    /// Intent flag and event sender of the session running `pid`
    fn session_state(
        &self,
        device: &str,
        pid: u32,
    ) -> Option<(Arc<AtomicBool>, mpsc::UnboundedSender<CommandEvent>)> {
        lock_table(&self.sessions)
            .get(device)
            .filter(|s| s.pid == pid)
            .map(|s| (Arc::clone(&s.terminated), s.events.clone()))
    }

    /// Terminates the device's active command, if any
    ///
    /// # Errors
    ///
    /// Returns [`ExecError::NoSession`] when nothing is running on `device`.
    pub async fn terminate_active(&self, device: &str) -> ExecResult<bool> {
        let pid = self
            .active_pid(device)
            .ok_or_else(|| ExecError::NoSession(device.to_string()))?;
        Ok(self.terminate(device, pid).await)
    }

    /// Drops the device's session without waiting for the process to finish.
    ///
    /// The output loop is stopped and awaited, its stream closes with
    /// [`FinishReason::Cancelled`], then the remote process is killed and the
    /// scratch file removed. Returns `false` if there was no session.
    pub async fn discard(&self, device: &str) -> bool {
        let removed = lock_table(&self.sessions).remove(device);
        let Some(session) = removed else {
            return false;
        };

        session.terminated.store(true, Ordering::SeqCst);
        let _ = session.stop_tx.try_send(());
        drop(session.stop_tx);
        if let Err(e) = session.task.await {
            tracing::warn!(device, error = %e, "Output loop ended abnormally");
        }

        let pid_arg = session.pid.to_string();
        if let Err(e) = self.transport.shell(device, &["kill", pid_arg.as_str()]).await {
            tracing::debug!(device, pid = session.pid, error = %e, "Kill on discard failed");
        }
        remove_scratch(self.transport.as_ref(), device, &session.scratch_file).await;

        tracing::info!(device, pid = session.pid, "Long-running command discarded");
        true
    }

    /// Discards every active session
    pub async fn shutdown(&self) {
        for device in self.active_devices() {
            self.discard(&device).await;
        }
    }

    /// Process id of the device's active command
    #[must_use]
    pub fn active_pid(&self, device: &str) -> Option<u32> {
        lock_table(&self.sessions).get(device).map(|s| s.pid)
    }

    /// Whether `device` has an active long-running command
    #[must_use]
    pub fn has_session(&self, device: &str) -> bool {
        lock_table(&self.sessions).contains_key(device)
    }

    /// Devices with an active long-running command
    #[must_use]
    pub fn active_devices(&self) -> Vec<String> {
        let mut devices: Vec<String> = lock_table(&self.sessions).keys().cloned().collect();
        devices.sort();
        devices
    }
}

fn lock_table(
    table: &Mutex<HashMap<String, ActiveSession>>,
) -> std::sync::MutexGuard<'_, HashMap<String, ActiveSession>> {
    table.lock().unwrap_or_else(PoisonError::into_inner)
}

async fn remove_scratch(transport: &dyn Transport, device: &str, scratch_file: &str) {
    if let Err(e) = transport.shell(device, &["rm", "-f", scratch_file]).await {
        tracing::debug!(device, scratch_file, error = %e, "Failed to remove scratch file");
    }
}

/// State of one output polling loop
struct OutputLoop {
    transport: Arc<dyn Transport>,
    device: String,
    pid: u32,
    scratch_file: String,
    interval: Duration,
    max_failures: u32,
    terminated: Arc<AtomicBool>,
    events: mpsc::UnboundedSender<CommandEvent>,
    sessions: SessionTable,
    generation: u64,
}

impl OutputLoop {
    async fn run(self, mut stop_rx: mpsc::Receiver<()>) {
        let mut offset: u64 = 0;
        let mut carry = Utf8Carry::default();
        let mut consecutive_failures: u32 = 0;

        loop {
            tokio::select! {
                _ = stop_rx.recv() => {
                    let _ = self.events.send(CommandEvent::Finished(FinishReason::Cancelled));
                    tracing::debug!("Output loop stopped");
                    return;
                }
                () = tokio::time::sleep(self.interval) => {}
            }

            match self.read_from(offset).await {
                Ok(chunk) => {
                    consecutive_failures = 0;
                    offset += chunk.len() as u64;
                    self.publish(carry.decode(&chunk));
                }
                Err(e) => {
                    consecutive_failures += 1;
                    tracing::debug!(error = %e, attempt = consecutive_failures, "Output read failed");
                }
            }

            match self.is_alive().await {
                Ok(true) => {}
                Ok(false) => {
                    let mut rest = match self.read_from(offset).await {
                        Ok(bytes) => carry.decode(&bytes),
                        Err(_) => String::new(),
                    };
                    rest.push_str(&carry.flush());
                    self.publish(rest);
                    remove_scratch(self.transport.as_ref(), &self.device, &self.scratch_file)
                        .await;
                    self.finish(self.exit_reason());
                    return;
                }
                Err(e) => {
                    consecutive_failures += 1;
                    tracing::debug!(error = %e, attempt = consecutive_failures, "Liveness check failed");
                }
            }

            if consecutive_failures >= self.max_failures {
                tracing::warn!(
                    errors = consecutive_failures,
                    "Output loop giving up after repeated bridge failures"
                );
                let _ = self.events.send(CommandEvent::Diagnostic(format!(
                    "Lost contact with device {} after {consecutive_failures} failed polls",
                    self.device
                )));
                self.finish(FinishReason::TransportLost);
                return;
            }
        }
    }

    /// Reads the scratch file from byte `offset` (zero-based).
    ///
    /// A non-zero exit from `tail` (file not created yet) reads as nothing.
    async fn read_from(&self, offset: u64) -> TransportResult<Vec<u8>> {
        let command = format!(
            "tail -c +{} {} 2>/dev/null",
            offset + 1,
            shell::quote(&self.scratch_file)
        );
        match self
            .transport
            .execute_bytes(Some(self.device.as_str()), &shell::shell_raw(&command))
            .await
        {
            Err(TransportError::CommandFailed { .. }) => Ok(Vec::new()),
            other => other,
        }
    }

    /// `ps -p` exits non-zero when the pid is gone; its output still decides.
    async fn is_alive(&self) -> TransportResult<bool> {
        let pid_arg = self.pid.to_string();
        let output = match self
            .transport
            .shell(&self.device, &["ps", "-p", pid_arg.as_str()])
            .await
        {
            Ok(output) => output,
            Err(TransportError::CommandFailed { output, .. }) => output,
            Err(e) => return Err(e),
        };
        Ok(is_process_listed(&output, self.pid))
    }

    fn publish(&self, text: String) {
        if !text.is_empty() {
            let _ = self.events.send(CommandEvent::Output(text));
        }
    }

    fn exit_reason(&self) -> FinishReason {
        if self.terminated.load(Ordering::SeqCst) {
            FinishReason::Cancelled
        } else {
            FinishReason::Exited
        }
    }

    fn finish(&self, reason: FinishReason) {
        {
            let mut sessions = lock_table(&self.sessions);
            if sessions
                .get(&self.device)
                .is_some_and(|s| s.generation == self.generation)
            {
                sessions.remove(&self.device);
            }
        }
        let _ = self.events.send(CommandEvent::Finished(reason));
        tracing::info!(reason = %reason, "Long-running command finished");
    }
}

/// Decoder that holds back an incomplete trailing UTF-8 sequence
#[derive(Debug, Default)]
struct Utf8Carry {
    pending: Vec<u8>,
}

impl Utf8Carry {
    /// Decodes `bytes` after whatever was held back from the previous read
    fn decode(&mut self, bytes: &[u8]) -> String {
        self.pending.extend_from_slice(bytes);
        let complete = self.pending.len() - incomplete_suffix_len(&self.pending);
        let held = self.pending.split_off(complete);
        let text = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending = held;
        text
    }

    /// Decodes the held-back bytes once no more input will follow
    fn flush(&mut self) -> String {
        let text = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        text
    }
}

/// Length of the truncated sequence at the end of `bytes`, zero if none
fn incomplete_suffix_len(bytes: &[u8]) -> usize {
    let mut rest = bytes;
    loop {
        match std::str::from_utf8(rest) {
            Ok(_) => return 0,
            Err(e) => match e.error_len() {
                None => return rest.len() - e.valid_up_to(),
                Some(invalid) => rest = &rest[e.valid_up_to() + invalid..],
            },
        }
    }
}
