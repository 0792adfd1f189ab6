//! Output stream of a long-running command

use tokio::sync::mpsc;

/// Why a command's output stream closed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    /// The remote process disappeared from the process listing on its own
    Exited,
    /// The process was terminated or its session discarded
    Cancelled,
    /// Too many consecutive bridge failures while polling
    TransportLost,
}

impl std::fmt::Display for FinishReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Exited => write!(f, "exited"),
            Self::Cancelled => write!(f, "cancelled"),
            Self::TransportLost => write!(f, "transport lost"),
        }
    }
}

/// Events published by a long-running command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandEvent {
    /// The detached process was launched with this id
    Started {
        /// Remote process id
        pid: u32,
    },
    /// Newly appended output, in order, without gaps or repeats
    Output(String),
    /// A failure worth showing alongside the output
    Diagnostic(String),
    /// Last event on the stream
    Finished(FinishReason),
}

impl CommandEvent {
    /// Whether this event closes the stream
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished(_))
    }
}

/// Consumer side of a started long-running command
#[derive(Debug)]
pub struct CommandHandle {
    device_id: String,
    pid: u32,
    events: mpsc::UnboundedReceiver<CommandEvent>,
}

impl CommandHandle {
    pub(crate) const fn new(
        device_id: String,
        pid: u32,
        events: mpsc::UnboundedReceiver<CommandEvent>,
    ) -> Self {
        Self {
            device_id,
            pid,
            events,
        }
    }

    /// Device the command runs on
    #[must_use]
    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    /// Remote process id
    #[must_use]
    pub const fn pid(&self) -> u32 {
        self.pid
    }

    /// Waits for the next event; `None` once the stream is closed
    pub async fn next_event(&mut self) -> Option<CommandEvent> {
        self.events.recv().await
    }

    /// Drains the stream until it closes, returning every event
    pub async fn collect(mut self) -> Vec<CommandEvent> {
        let mut events = Vec::new();
        while let Some(event) = self.events.recv().await {
            events.push(event);
        }
        events
    }

    /// Concatenated [`CommandEvent::Output`] text from `events`
    #[must_use]
    pub fn output_of(events: &[CommandEvent]) -> String {
        events
            .iter()
            .filter_map(|e| match e {
                CommandEvent::Output(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}
