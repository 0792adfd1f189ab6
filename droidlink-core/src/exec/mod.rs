//! Command execution on devices
//!
//! [`ExecutionEngine`] runs one-shot commands and owns the long-running ones,
//! at most one per device. Output of a long-running command arrives on a
//! [`CommandHandle`] as [`CommandEvent`]s.

mod engine;
mod events;

pub use engine::ExecutionEngine;
pub use events::{CommandEvent, CommandHandle, FinishReason};
