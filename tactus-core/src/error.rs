//! Error types shared by drivers and their hosts

use tactus_hal::TransportError;
use tactus_protocol::FrameError;

/// Cell buffer failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BufferError {
    /// Caller supplied a different number of cells than the buffer holds
    LengthMismatch { expected: usize, actual: usize },
    /// Growing the buffer failed
    OutOfMemory,
}

impl core::fmt::Display for BufferError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            BufferError::LengthMismatch { expected, actual } => {
                write!(f, "expected {} cells, got {}", expected, actual)
            }
            BufferError::OutOfMemory => f.write_str("out of memory"),
        }
    }
}

/// Configuration parsing failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// `protocol=` names no known dialect
    UnknownProtocol,
    /// Boolean parameter with an unrecognised value
    InvalidBoolean,
    /// Numeric parameter out of range or not a number
    InvalidNumber,
    /// Device identifier could not be parsed
    InvalidIdentifier,
    /// Malformed parameter string or TOML document
    Syntax,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            ConfigError::UnknownProtocol => "unknown protocol",
            ConfigError::InvalidBoolean => "invalid boolean",
            ConfigError::InvalidNumber => "invalid number",
            ConfigError::InvalidIdentifier => "invalid device identifier",
            ConfigError::Syntax => "syntax error",
        })
    }
}

impl From<tactus_hal::IdentifierError> for ConfigError {
    fn from(_: tactus_hal::IdentifierError) -> Self {
        ConfigError::InvalidIdentifier
    }
}

/// Why a driver could not be constructed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConstructError {
    /// No supported display answered the probe
    NotDetected,
    Transport(TransportError),
    OutOfMemory,
    Config(ConfigError),
}

impl core::fmt::Display for ConstructError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ConstructError::NotDetected => f.write_str("display not detected"),
            ConstructError::Transport(e) => write!(f, "transport: {}", e),
            ConstructError::OutOfMemory => f.write_str("out of memory"),
            ConstructError::Config(e) => write!(f, "configuration: {}", e),
        }
    }
}

impl From<TransportError> for ConstructError {
    fn from(e: TransportError) -> Self {
        ConstructError::Transport(e)
    }
}

impl From<ConfigError> for ConstructError {
    fn from(e: ConfigError) -> Self {
        ConstructError::Config(e)
    }
}

impl From<BufferError> for ConstructError {
    fn from(_: BufferError) -> Self {
        ConstructError::OutOfMemory
    }
}

/// Failures of an operational driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DriverError {
    /// The link is gone or the display powered down; reconstruct the driver
    RestartRequired,
    Transport(TransportError),
    /// Caller supplied the wrong number of cells
    LengthMismatch,
    OutOfMemory,
    /// Request not possible in this dialect
    Unsupported,
}

impl core::fmt::Display for DriverError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            DriverError::RestartRequired => f.write_str("driver restart required"),
            DriverError::Transport(e) => write!(f, "transport: {}", e),
            DriverError::LengthMismatch => f.write_str("cell count mismatch"),
            DriverError::OutOfMemory => f.write_str("out of memory"),
            DriverError::Unsupported => f.write_str("unsupported"),
        }
    }
}

impl From<TransportError> for DriverError {
    fn from(e: TransportError) -> Self {
        match e {
            TransportError::Disconnected => DriverError::RestartRequired,
            other => DriverError::Transport(other),
        }
    }
}

impl From<BufferError> for DriverError {
    fn from(e: BufferError) -> Self {
        match e {
            BufferError::LengthMismatch { .. } => DriverError::LengthMismatch,
            BufferError::OutOfMemory => DriverError::OutOfMemory,
        }
    }
}

impl From<FrameError> for DriverError {
    fn from(_: FrameError) -> Self {
        // Outbound encoding only fails when a request cannot fit the wire
        DriverError::Unsupported
    }
}
