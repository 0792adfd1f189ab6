//! Parsers for bridge tool output
//!
//! Pure functions that turn loosely formatted, line-oriented text into
//! structured records. None of them fail: unrecognised input gives an empty
//! or zeroed result.

mod devices;
mod listing;
mod process;
mod telemetry;

pub use devices::{parse_device_list, parse_properties};
pub use listing::{parse_listing, parse_listing_date};
pub use process::{is_process_listed, parse_pid};
pub use telemetry::{NO_NETWORK_PLACEHOLDER, TelemetryParser};
