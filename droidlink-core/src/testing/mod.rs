//! In-memory transport for tests and offline demos
//!
//! [`ScriptedTransport`] answers bridge invocations from a list of handlers
//! and records every call, so callers can assert on what was sent to which
//! device and when.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use async_trait::async_trait;

use crate::error::{TransportError, TransportResult};
use crate::transport::Transport;

/// One recorded bridge call
#[derive(Debug, Clone)]
pub struct Invocation {
    /// Target device, `None` for bridge-level commands
    pub device: Option<String>,
    /// Arguments as passed to the transport
    pub args: Vec<String>,
    /// When the call was received
    pub at: Instant,
}

impl Invocation {
    /// Arguments joined by spaces
    #[must_use]
    pub fn command_line(&self) -> String {
        self.args.join(" ")
    }
}

type Handler = Box<dyn Fn(&Invocation) -> Option<TransportResult<String>> + Send + Sync>;
type ByteHandler = Box<dyn Fn(&Invocation) -> Option<TransportResult<Vec<u8>>> + Send + Sync>;

/// Transport that answers from scripted handlers
///
/// Handlers are consulted in registration order; the first one returning
/// `Some` decides the response. Unmatched calls succeed with empty output.
/// Raw byte reads consult the byte handlers first and fall back to the text
/// ones.
pub struct ScriptedTransport {
    handlers: Mutex<Vec<Handler>>,
    byte_handlers: Mutex<Vec<ByteHandler>>,
    delays: Mutex<Vec<(String, Duration)>>,
    calls: Mutex<Vec<Invocation>>,
    latency: Duration,
}

impl std::fmt::Debug for ScriptedTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptedTransport")
            .field("calls", &self.call_count())
            .field("latency", &self.latency)
            .finish_non_exhaustive()
    }
}

impl Default for ScriptedTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedTransport {
    /// Creates a transport with no handlers
    #[must_use]
    pub fn new() -> Self {
        Self {
            handlers: Mutex::new(Vec::new()),
            byte_handlers: Mutex::new(Vec::new()),
            delays: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
            latency: Duration::ZERO,
        }
    }

    /// Delays every response by `latency`
    #[must_use]
    pub const fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Wraps the transport in an `Arc`
    #[must_use]
    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Registers a handler consulted for every call
    pub fn on<F>(&self, handler: F)
    where
        F: Fn(&Invocation) -> Option<TransportResult<String>> + Send + Sync + 'static,
    {
        self.handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Box::new(handler));
    }

    /// Registers a handler consulted for raw byte reads
    pub fn on_bytes<F>(&self, handler: F)
    where
        F: Fn(&Invocation) -> Option<TransportResult<Vec<u8>>> + Send + Sync + 'static,
    {
        self.byte_handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Box::new(handler));
    }

    /// Holds back responses to calls containing `pattern` for `delay`
    pub fn delay_matching(&self, pattern: &str, delay: Duration) {
        self.delays
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((pattern.to_string(), delay));
    }

    /// Answers calls whose command line contains `pattern` with `output`
    pub fn respond(&self, pattern: &str, output: &str) {
        let pattern = pattern.to_string();
        let output = output.to_string();
        self.on(move |call| {
            call.command_line()
                .contains(&pattern)
                .then(|| Ok(output.clone()))
        });
    }

    /// Fails calls whose command line contains `pattern`
    pub fn fail(&self, pattern: &str, message: &str) {
        let pattern = pattern.to_string();
        let message = message.to_string();
        self.on(move |call| {
            call.command_line().contains(&pattern).then(|| {
                Err(TransportError::CommandFailed {
                    status: "exit status: 1".to_string(),
                    output: message.clone(),
                })
            })
        });
    }

    /// Answers matching calls with successive outputs, repeating the last
    pub fn respond_sequence(&self, pattern: &str, outputs: &[&str]) {
        let pattern = pattern.to_string();
        let queue: Mutex<VecDeque<String>> =
            Mutex::new(outputs.iter().map(|s| (*s).to_string()).collect());
        self.on(move |call| {
            if !call.command_line().contains(&pattern) {
                return None;
            }
            let mut queue = queue.lock().unwrap_or_else(PoisonError::into_inner);
            let next = if queue.len() > 1 {
                queue.pop_front().unwrap_or_default()
            } else {
                queue.front().cloned().unwrap_or_default()
            };
            Some(Ok(next))
        });
    }

    /// All calls received so far
    #[must_use]
    pub fn calls(&self) -> Vec<Invocation> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of calls received so far
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Calls targeting `device`
    #[must_use]
    pub fn calls_for(&self, device: &str) -> Vec<Invocation> {
        self.calls()
            .into_iter()
            .filter(|c| c.device.as_deref() == Some(device))
            .collect()
    }

    /// Number of calls whose command line contains `pattern`
    #[must_use]
    pub fn count_matching(&self, pattern: &str) -> usize {
        self.calls()
            .iter()
            .filter(|c| c.command_line().contains(pattern))
            .count()
    }

    /// Records the call and waits out latency and matching delays
    async fn receive(&self, device: Option<&str>, args: &[String]) -> Invocation {
        let call = Invocation {
            device: device.map(str::to_string),
            args: args.to_vec(),
            at: Instant::now(),
        };
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call.clone());

        let line = call.command_line();
        let delay = self
            .delays
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|(pattern, _)| line.contains(pattern.as_str()))
            .map(|(_, delay)| *delay)
            .sum::<Duration>()
            + self.latency;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        call
    }

    fn answer(&self, call: &Invocation) -> TransportResult<String> {
        let handlers = self.handlers.lock().unwrap_or_else(PoisonError::into_inner);
        handlers
            .iter()
            .find_map(|h| h(call))
            .unwrap_or_else(|| Ok(String::new()))
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn execute(&self, device: Option<&str>, args: &[String]) -> TransportResult<String> {
        let call = self.receive(device, args).await;
        self.answer(&call)
    }

    async fn execute_bytes(
        &self,
        device: Option<&str>,
        args: &[String],
    ) -> TransportResult<Vec<u8>> {
        let call = self.receive(device, args).await;
        let scripted = self
            .byte_handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find_map(|h| h(&call));
        scripted.unwrap_or_else(|| self.answer(&call).map(String::into_bytes))
    }
}
