//! Driver configuration
//!
//! Parameters arrive either as the `name=value,name=value` string a host
//! passes across its native boundary, or as a TOML document.

pub mod parameters;
pub mod types;

pub use parameters::{DriverParameters, ProtocolSelection, DEFAULT_PROBE_RETRIES, DEFAULT_PROBE_TIMEOUT_MS};
pub use types::DriverConfig;
