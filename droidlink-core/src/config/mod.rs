//! Configuration management for `DroidLink`
//!
//! Settings live in a single TOML file managed by [`ConfigManager`].

mod manager;
mod settings;

pub use crate::monitoring::MonitoringSettings;
pub use manager::{ConfigManager, SETTINGS_FILE};
pub use settings::{AdbSettings, AppSettings, ExecSettings};
