//! Driver configuration type

use alloc::string::String;

use tactus_hal::DeviceIdentifier;

use super::parameters::DriverParameters;
use crate::error::ConfigError;

/// Everything needed to construct a driver
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverConfig {
    /// Which device to open
    pub device: DeviceIdentifier,
    /// Where the host keeps key and text tables
    pub tables_directory: Option<String>,
    pub parameters: DriverParameters,
}

impl DriverConfig {
    pub fn new(device: DeviceIdentifier) -> Self {
        Self {
            device,
            tables_directory: None,
            parameters: DriverParameters::default(),
        }
    }

    /// Build from the identifier and parameter strings a host supplies
    pub fn from_strings(device: &str, parameters: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            device: DeviceIdentifier::parse(device)?,
            tables_directory: None,
            parameters: DriverParameters::parse(parameters)?,
        })
    }

    /// Parse a TOML document
    ///
    /// ```toml
    /// device = "usb:0904:6103"
    /// tables_directory = "/data/tables"
    ///
    /// [parameters]
    /// protocol = "hid"
    /// variokeys = true
    /// ```
    #[cfg(feature = "serde")]
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        #[derive(serde::Deserialize)]
        struct RawConfig {
            device: String,
            #[serde(default)]
            tables_directory: Option<String>,
            #[serde(default)]
            parameters: DriverParameters,
        }

        let raw: RawConfig = toml::from_str(text).map_err(|_| ConfigError::Syntax)?;
        Ok(Self {
            device: DeviceIdentifier::parse(&raw.device)?,
            tables_directory: raw.tables_directory,
            parameters: raw.parameters,
        })
    }
}
