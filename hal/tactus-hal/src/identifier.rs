//! Device identifier strings
//!
//! The host names the display with a short string:
//!
//! - `serial:/dev/ttyUSB0` or a bare path - serial port
//! - `usb:` - any USB device the driver recognises
//! - `usb:0904:6101` - USB vendor:product (hex)
//! - `usb:0904:6101,A1B2C3` - same, restricted to one serial number
//! - `bluetooth:00:A0:96:12:34:56` - Bluetooth address
//! - `bluetooth:00:A0:96:12:34:56,channel=1` - with an RFCOMM channel

use heapless::String;

use crate::transport::TransportKind;

/// Maximum length of a serial device path
pub const MAX_PATH_LEN: usize = 64;

/// Maximum length of a USB serial number
pub const MAX_SERIAL_LEN: usize = 32;

/// Identifier parse errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IdentifierError {
    /// Empty identifier
    Empty,
    /// Unknown `scheme:` prefix
    UnknownScheme,
    /// Path or serial number too long
    TooLong,
    /// Malformed vendor:product pair
    InvalidUsbId,
    /// Malformed Bluetooth address
    InvalidAddress,
    /// Malformed `channel=` option
    InvalidChannel,
}

impl core::fmt::Display for IdentifierError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let text = match self {
            IdentifierError::Empty => "empty device identifier",
            IdentifierError::UnknownScheme => "unknown device identifier scheme",
            IdentifierError::TooLong => "device identifier component too long",
            IdentifierError::InvalidUsbId => "invalid USB vendor:product",
            IdentifierError::InvalidAddress => "invalid Bluetooth address",
            IdentifierError::InvalidChannel => "invalid Bluetooth channel",
        };
        f.write_str(text)
    }
}

/// Where the display is attached
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DeviceIdentifier {
    /// Serial port path
    Serial { path: String<MAX_PATH_LEN> },
    /// USB device, optionally narrowed by ids and serial number
    Usb {
        vendor: Option<u16>,
        product: Option<u16>,
        serial: Option<String<MAX_SERIAL_LEN>>,
    },
    /// Bluetooth device address, optionally with an RFCOMM channel
    Bluetooth { address: [u8; 6], channel: Option<u8> },
}

impl DeviceIdentifier {
    /// Parse an identifier string
    pub fn parse(input: &str) -> Result<Self, IdentifierError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(IdentifierError::Empty);
        }

        match input.split_once(':') {
            Some(("serial", path)) => Self::serial(path),
            Some(("usb", rest)) => Self::parse_usb(rest),
            Some(("bluetooth", rest)) | Some(("bt", rest)) => Self::parse_bluetooth(rest),
            _ if input.starts_with('/') => Self::serial(input),
            _ => Err(IdentifierError::UnknownScheme),
        }
    }

    /// Kind of link this identifier selects
    pub fn kind(&self) -> TransportKind {
        match self {
            DeviceIdentifier::Serial { .. } => TransportKind::Serial,
            DeviceIdentifier::Usb { .. } => TransportKind::Usb,
            DeviceIdentifier::Bluetooth { .. } => TransportKind::Bluetooth,
        }
    }

    fn serial(path: &str) -> Result<Self, IdentifierError> {
        if path.is_empty() {
            return Err(IdentifierError::Empty);
        }
        let mut owned = String::new();
        owned.push_str(path).map_err(|_| IdentifierError::TooLong)?;
        Ok(DeviceIdentifier::Serial { path: owned })
    }

    fn parse_usb(rest: &str) -> Result<Self, IdentifierError> {
        let (ids, serial) = match rest.split_once(',') {
            Some((ids, serial)) => (ids, Some(serial)),
            None => (rest, None),
        };

        let (vendor, product) = if ids.is_empty() {
            (None, None)
        } else {
            let (v, p) = ids.split_once(':').ok_or(IdentifierError::InvalidUsbId)?;
            let vendor = u16::from_str_radix(v, 16).map_err(|_| IdentifierError::InvalidUsbId)?;
            let product = u16::from_str_radix(p, 16).map_err(|_| IdentifierError::InvalidUsbId)?;
            (Some(vendor), Some(product))
        };

        let serial = match serial {
            Some(s) if !s.is_empty() => {
                let mut owned = String::new();
                owned.push_str(s).map_err(|_| IdentifierError::TooLong)?;
                Some(owned)
            }
            _ => None,
        };

        Ok(DeviceIdentifier::Usb {
            vendor,
            product,
            serial,
        })
    }

    fn parse_bluetooth(rest: &str) -> Result<Self, IdentifierError> {
        let (addr, options) = match rest.split_once(',') {
            Some((addr, options)) => (addr, Some(options)),
            None => (rest, None),
        };

        let mut address = [0u8; 6];
        let mut parts = addr.split(':');
        for byte in address.iter_mut() {
            let part = parts.next().ok_or(IdentifierError::InvalidAddress)?;
            if part.len() != 2 {
                return Err(IdentifierError::InvalidAddress);
            }
            *byte = u8::from_str_radix(part, 16).map_err(|_| IdentifierError::InvalidAddress)?;
        }
        if parts.next().is_some() {
            return Err(IdentifierError::InvalidAddress);
        }

        let channel = match options {
            Some(opt) => {
                let value = opt
                    .strip_prefix("channel=")
                    .ok_or(IdentifierError::InvalidChannel)?;
                Some(value.parse::<u8>().map_err(|_| IdentifierError::InvalidChannel)?)
            }
            None => None,
        };

        Ok(DeviceIdentifier::Bluetooth { address, channel })
    }
}
