//! Session control for the selected device
//!
//! [`SessionController`] is what a front end talks to: device discovery,
//! selection, directory browsing, command execution and telemetry, with all
//! device-scoped background work bound to the current selection.

mod controller;
mod history;

pub use controller::SessionController;
pub use history::{CommandHistory, HistoryEntry, HistoryKind, MAX_HISTORY_ENTRIES};
