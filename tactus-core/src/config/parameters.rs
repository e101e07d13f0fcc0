//! Driver parameters

#[cfg(feature = "serde")]
use serde::Deserialize;

use crate::error::ConfigError;

/// Identification attempts before giving up
pub const DEFAULT_PROBE_RETRIES: u8 = 2;

/// Time allowed for each identification attempt
pub const DEFAULT_PROBE_TIMEOUT_MS: u32 = 200;

/// Which wire dialect to speak
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ProtocolSelection {
    /// Decide from the transport
    #[default]
    Auto,
    Escape,
    Hid,
    Legacy,
}

impl ProtocolSelection {
    pub fn parse(value: &str) -> Result<Self, ConfigError> {
        match value {
            v if v.eq_ignore_ascii_case("auto") => Ok(ProtocolSelection::Auto),
            v if v.eq_ignore_ascii_case("escape") => Ok(ProtocolSelection::Escape),
            v if v.eq_ignore_ascii_case("hid") => Ok(ProtocolSelection::Hid),
            v if v.eq_ignore_ascii_case("legacy") => Ok(ProtocolSelection::Legacy),
            _ => Err(ConfigError::UnknownProtocol),
        }
    }
}

/// Tunables for one driver instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DriverParameters {
    pub protocol: ProtocolSelection,
    /// Use the vario key layout regardless of model
    pub variokeys: bool,
    pub probe_retries: u8,
    pub probe_timeout_ms: u32,
}

impl Default for DriverParameters {
    fn default() -> Self {
        Self {
            protocol: ProtocolSelection::Auto,
            variokeys: false,
            probe_retries: DEFAULT_PROBE_RETRIES,
            probe_timeout_ms: DEFAULT_PROBE_TIMEOUT_MS,
        }
    }
}

fn parse_bool(value: &str) -> Result<bool, ConfigError> {
    const TRUE: [&str; 4] = ["yes", "on", "true", "1"];
    const FALSE: [&str; 4] = ["no", "off", "false", "0"];

    if TRUE.iter().any(|t| value.eq_ignore_ascii_case(t)) {
        Ok(true)
    } else if FALSE.iter().any(|f| value.eq_ignore_ascii_case(f)) {
        Ok(false)
    } else {
        Err(ConfigError::InvalidBoolean)
    }
}

impl DriverParameters {
    /// Parse `name=value,name=value`
    ///
    /// Names are case-insensitive. Unknown names are logged and skipped so a
    /// host can pass one string to several drivers.
    pub fn parse(input: &str) -> Result<Self, ConfigError> {
        let mut params = Self::default();

        for item in input.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let (name, value) = item.split_once('=').ok_or(ConfigError::Syntax)?;
            params.set(name.trim(), value.trim())?;
        }

        Ok(params)
    }

    /// Apply one `name=value` pair
    pub fn set(&mut self, name: &str, value: &str) -> Result<(), ConfigError> {
        if name.eq_ignore_ascii_case("protocol") {
            self.protocol = ProtocolSelection::parse(value)?;
        } else if name.eq_ignore_ascii_case("variokeys") {
            self.variokeys = parse_bool(value)?;
        } else if name.eq_ignore_ascii_case("probe_retries") {
            self.probe_retries = match value.parse() {
                Ok(n) if n > 0 => n,
                _ => return Err(ConfigError::InvalidNumber),
            };
        } else if name.eq_ignore_ascii_case("probe_timeout_ms") {
            self.probe_timeout_ms = match value.parse() {
                Ok(n) if n > 0 => n,
                _ => return Err(ConfigError::InvalidNumber),
            };
        } else {
            warn!("ignoring unknown driver parameter: {}", name);
        }
        Ok(())
    }

    /// Upper bound on time spent probing
    pub fn probe_budget_ms(&self) -> u64 {
        u64::from(self.probe_retries) * u64::from(self.probe_timeout_ms)
    }
}
