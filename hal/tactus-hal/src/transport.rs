//! Byte-stream transport abstractions
//!
//! One full-duplex channel carries both inbound key/status packets and
//! outbound cell writes. Callers drive it from a single thread; the
//! transport never needs internal locking.

use crate::clock::Clock;

/// Errors reported by a transport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransportError {
    /// The device went away (unplugged, link dropped, torn down by the host)
    Disconnected,
    /// Unrecoverable I/O failure
    Io,
    /// Caller buffer cannot hold the incoming report
    BufferTooSmall,
    /// Operation not available on this link
    Unsupported,
}

impl core::fmt::Display for TransportError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let text = match self {
            TransportError::Disconnected => "device disconnected",
            TransportError::Io => "transport I/O failure",
            TransportError::BufferTooSmall => "buffer too small",
            TransportError::Unsupported => "operation not supported by transport",
        };
        f.write_str(text)
    }
}

/// Physical link carrying the byte stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransportKind {
    Serial,
    Usb,
    Bluetooth,
}

/// Byte-stream endpoint
///
/// Reads block for at most the given timeout. A timeout with nothing read is
/// not an error: it is reported as `Ok(0)` / `Ok(None)`.
pub trait Transport {
    /// Which kind of link this is
    fn kind(&self) -> TransportKind;

    /// Wait until input is available
    ///
    /// Returns `Ok(false)` when the timeout expires first.
    fn await_input(&mut self, timeout_ms: u32) -> Result<bool, TransportError>;

    /// Read up to `buf.len()` bytes
    ///
    /// The first byte waits up to `initial_timeout_ms`, every following byte
    /// up to `subsequent_timeout_ms`. USB HID transports return exactly one
    /// input report per call.
    fn read_bytes(
        &mut self,
        buf: &mut [u8],
        initial_timeout_ms: u32,
        subsequent_timeout_ms: u32,
    ) -> Result<usize, TransportError>;

    /// Write all of `data`
    fn write_bytes(&mut self, data: &[u8]) -> Result<(), TransportError>;

    /// Read a single byte
    fn read_byte(&mut self, timeout_ms: u32) -> Result<Option<u8>, TransportError> {
        let mut buf = [0u8; 1];
        match self.read_bytes(&mut buf, timeout_ms, 0)? {
            0 => Ok(None),
            _ => Ok(Some(buf[0])),
        }
    }
}

/// An open link: the transport plus the clock used to bound waits on it
///
/// Owned by one driver instance for its whole lifetime.
pub struct Connection<T, C> {
    transport: T,
    clock: C,
}

impl<T: Transport, C: Clock> Connection<T, C> {
    /// Wrap an opened transport
    pub fn new(transport: T, clock: C) -> Self {
        Self { transport, clock }
    }

    /// Access the transport
    pub fn transport(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn transport_ref(&self) -> &T {
        &self.transport
    }

    /// Current monotonic time in milliseconds
    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    /// Milliseconds left until `deadline_ms`, zero once it has passed
    pub fn remaining_ms(&self, deadline_ms: u64) -> u32 {
        let left = deadline_ms.saturating_sub(self.clock.now_ms());
        left.min(u32::MAX as u64) as u32
    }

    /// Release the transport and clock
    pub fn into_parts(self) -> (T, C) {
        (self.transport, self.clock)
    }
}
