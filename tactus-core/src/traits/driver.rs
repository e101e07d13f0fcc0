//! Braille driver traits

use tactus_protocol::Packet;

use crate::commands::Command;
use crate::error::DriverError;

/// Result of polling for input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReadOutcome {
    /// A key chord or a display event resolved to a command
    Command(Command),
    /// Nothing to report yet
    ///
    /// `retry_after_ms` is set when the display sent status packets but no
    /// keys, hinting that polling again soon is worthwhile.
    Pending { retry_after_ms: Option<u32> },
}

/// Operations a host performs on a constructed driver
///
/// Construction is driver-specific; the returned value is the only handle.
/// [`BrailleDriver::destruct`] consumes it, so a driver cannot be used after
/// teardown or torn down twice.
pub trait BrailleDriver {
    /// The link handed back on teardown
    type Transport;

    /// Text cells
    fn text_columns(&self) -> u8;

    /// Status cells (0 when the model has none)
    fn status_columns(&self) -> u8;

    /// Show `cells` (one byte per text cell, ISO 11548-1 dots)
    ///
    /// Only changed cells travel to the device. A failed write leaves the
    /// driver's view unchanged so the next call retries.
    fn write_window(&mut self, cells: &[u8]) -> Result<(), DriverError>;

    /// Show status cells
    fn write_status(&mut self, cells: &[u8]) -> Result<(), DriverError>;

    /// Process pending input without blocking
    fn read_command(&mut self) -> Result<ReadOutcome, DriverError>;

    /// Release the driver and hand back the transport
    fn destruct(self) -> Self::Transport
    where
        Self: Sized;
}

/// Raw packet access for diagnostics and host-side protocol tools
pub trait PacketAccess {
    /// Next complete packet, if one is waiting
    fn read_packet(&mut self) -> Result<Option<Packet>, DriverError>;

    /// Send one packet (code byte first, unframed)
    fn write_packet(&mut self, packet: &[u8]) -> Result<(), DriverError>;

    /// Return the display to its power-on state
    fn reset(&mut self) -> Result<(), DriverError>;
}
