//! Integration test modules and shared fixtures

mod exec_tests;
mod poller_tests;
mod session_tests;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use droidlink_core::TransportError;
use droidlink_core::testing::ScriptedTransport;

/// A remote process as seen through `nohup`, `tail`, `ps` and `kill`
#[derive(Debug, Default)]
pub struct FakeProcess {
    pub output: Vec<u8>,
    pub alive: bool,
}

/// Simulated device shell for long-running commands.
///
/// Every launch gets the next pid starting at 100 and a fresh process record.
/// `tail -c +N` returns the raw bytes of the newest process's output from N on.
#[derive(Debug, Clone, Default)]
pub struct FakeShell {
    processes: Arc<Mutex<HashMap<u32, FakeProcess>>>,
    latest: Arc<Mutex<Option<u32>>>,
    unreachable: Arc<Mutex<bool>>,
}

impl FakeShell {
    pub fn install(&self, transport: &ScriptedTransport) {
        let shell = self.clone();
        transport.on(move |call| {
            let line = call.command_line();
            if *shell.unreachable.lock().unwrap() && line.starts_with("shell ") {
                return Some(Err(TransportError::Timeout(1)));
            }
            if line.contains("nohup sh -c") {
                let mut processes = shell.processes.lock().unwrap();
                let pid = 100 + u32::try_from(processes.len()).unwrap();
                processes.insert(
                    pid,
                    FakeProcess {
                        output: Vec::new(),
                        alive: true,
                    },
                );
                *shell.latest.lock().unwrap() = Some(pid);
                return Some(Ok(format!("{pid}\n")));
            }
            if let Some(rest) = line.strip_prefix("shell ps -p ") {
                let pid: u32 = rest.trim().parse().unwrap();
                let alive = shell
                    .processes
                    .lock()
                    .unwrap()
                    .get(&pid)
                    .is_some_and(|p| p.alive);
                let header = "USER PID PPID VSZ RSS WCHAN ADDR S NAME\n";
                return Some(if alive {
                    Ok(format!("{header}shell {pid} 1 100 10 0 0 S sh\n"))
                } else {
                    Err(TransportError::CommandFailed {
                        status: "exit status: 1".to_string(),
                        output: header.trim().to_string(),
                    })
                });
            }
            if let Some(rest) = line.strip_prefix("shell kill ") {
                let pid: u32 = rest.trim().parse().unwrap();
                let mut processes = shell.processes.lock().unwrap();
                return Some(match processes.get_mut(&pid) {
                    Some(p) if p.alive => {
                        p.alive = false;
                        Ok(String::new())
                    }
                    _ => Err(TransportError::CommandFailed {
                        status: "exit status: 1".to_string(),
                        output: format!("/system/bin/sh: kill: {pid}: No such process"),
                    }),
                });
            }
            None
        });

        let shell = self.clone();
        transport.on_bytes(move |call| {
            let line = call.command_line();
            let rest = line.strip_prefix("shell tail -c +")?;
            if *shell.unreachable.lock().unwrap() {
                return Some(Err(TransportError::Timeout(1)));
            }
            let start: usize = rest
                .split_whitespace()
                .next()
                .and_then(|n| n.parse().ok())
                .unwrap();
            let latest = *shell.latest.lock().unwrap();
            let processes = shell.processes.lock().unwrap();
            let bytes = latest
                .and_then(|pid| processes.get(&pid))
                .map(|p| p.output.get(start - 1..).unwrap_or_default().to_vec())
                .unwrap_or_default();
            Some(Ok(bytes))
        });
    }

    /// Appends output to the newest process
    pub fn write(&self, text: &str) {
        self.write_bytes(text.as_bytes());
    }

    /// Appends raw bytes to the newest process
    pub fn write_bytes(&self, bytes: &[u8]) {
        let latest = *self.latest.lock().unwrap();
        if let Some(pid) = latest
            && let Some(p) = self.processes.lock().unwrap().get_mut(&pid)
        {
            p.output.extend_from_slice(bytes);
        }
    }

    /// Lets the newest process exit on its own
    pub fn exit(&self) {
        let latest = *self.latest.lock().unwrap();
        if let Some(pid) = latest
            && let Some(p) = self.processes.lock().unwrap().get_mut(&pid)
        {
            p.alive = false;
        }
    }

    pub fn is_alive(&self, pid: u32) -> bool {
        self.processes
            .lock()
            .unwrap()
            .get(&pid)
            .is_some_and(|p| p.alive)
    }

    /// Makes every shell call time out
    pub fn set_unreachable(&self, unreachable: bool) {
        *self.unreachable.lock().unwrap() = unreachable;
    }
}

/// Polls `condition` every few milliseconds until it holds or `limit` passes
pub async fn wait_until(limit: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + limit;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    condition()
}

pub const DEVICES_AB: &str = "List of devices attached\n\
    AAA111\tdevice product:a model:Alpha\n\
    BBB222\tdevice product:b model:Beta\n";

pub const DEVICES_B: &str = "List of devices attached\n\
    BBB222\tdevice product:b model:Beta\n";

pub const TELEMETRY_CPU: &str = "CPU: 12% user + 3% kernel + 85% idle\n";
pub const TELEMETRY_FREE: &str = "total used free\nMem: 3800 1900 1900\n";
