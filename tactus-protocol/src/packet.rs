//! Packets and framing errors shared by every dialect

use heapless::Vec;
use tactus_hal::{Clock, Connection, Transport};

/// Largest decoded packet (code byte included)
pub const MAX_PACKET_SIZE: usize = 260;

/// Reads one framer call may make before handing control back
///
/// Bounds a call on a line that never stops sending noise.
pub const MAX_SCAN_READS: usize = 4 * MAX_PACKET_SIZE;

/// Limits of one framer read call
///
/// A call with a timeout stops once that time is used up, whatever the line
/// is doing. A polling call (timeout 0) drains input that is already there.
/// Both stop after [`MAX_SCAN_READS`] reads. A packet cut off by either limit
/// stays in the framer and completes on a later call.
#[derive(Debug)]
pub(crate) struct ReadBudget {
    deadline: Option<u64>,
    reads: usize,
}

impl ReadBudget {
    pub(crate) fn start<T: Transport, C: Clock>(conn: &Connection<T, C>, timeout_ms: u32) -> Self {
        Self {
            deadline: (timeout_ms > 0).then(|| conn.now_ms() + u64::from(timeout_ms)),
            reads: 0,
        }
    }

    /// Timeout for the next read, at most `wanted_ms`; `None` once spent
    pub(crate) fn next_timeout<T: Transport, C: Clock>(
        &mut self,
        conn: &Connection<T, C>,
        wanted_ms: u32,
    ) -> Option<u32> {
        if self.reads >= MAX_SCAN_READS {
            return None;
        }
        let timeout = match self.deadline {
            Some(deadline) => match conn.remaining_ms(deadline) {
                0 => return None,
                left => wanted_ms.min(left),
            },
            None => wanted_ms,
        };
        self.reads += 1;
        Some(timeout)
    }
}

/// Errors that can occur during packet framing or encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// Payload exceeds maximum allowed size
    PayloadTooLarge,
    /// Checksum mismatch
    InvalidChecksum,
    /// Invalid frame structure (missing sentinel, bad length)
    InvalidFrame,
    /// Leading code byte not recognised by the dialect
    UnknownCode(u8),
    /// Frame ended before its declared length
    Truncated,
    /// Buffer too small for encoding
    BufferTooSmall,
}

impl core::fmt::Display for FrameError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            FrameError::PayloadTooLarge => f.write_str("payload too large"),
            FrameError::InvalidChecksum => f.write_str("checksum mismatch"),
            FrameError::InvalidFrame => f.write_str("invalid frame"),
            FrameError::UnknownCode(code) => write!(f, "unknown packet code {:#04x}", code),
            FrameError::Truncated => f.write_str("truncated frame"),
            FrameError::BufferTooSmall => f.write_str("buffer too small"),
        }
    }
}

/// Dialect-specific packet length table
///
/// Called after every received byte with the packet collected so far (code
/// byte first). Returns the total length the packet will have, which may
/// grow as more bytes reveal it (length bytes, identity quirks). `None` means
/// the code is not part of the dialect.
pub trait PacketLengths {
    fn expected_length(&self, partial: &[u8]) -> Option<usize>;
}

/// One complete device message, code byte first
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Packet {
    bytes: Vec<u8, MAX_PACKET_SIZE>,
}

impl Packet {
    /// Copy a complete packet
    pub fn new(bytes: &[u8]) -> Result<Self, FrameError> {
        let mut packet = Self::default();
        packet
            .bytes
            .extend_from_slice(bytes)
            .map_err(|_| FrameError::PayloadTooLarge)?;
        Ok(packet)
    }

    /// Leading type/response code (0 for an empty packet)
    pub fn code(&self) -> u8 {
        self.bytes.first().copied().unwrap_or(0)
    }

    /// Bytes after the code
    pub fn payload(&self) -> &[u8] {
        self.bytes.get(1..).unwrap_or(&[])
    }

    /// Whole packet
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub(crate) fn push(&mut self, byte: u8) -> Result<(), FrameError> {
        self.bytes.push(byte).map_err(|_| FrameError::PayloadTooLarge)
    }

    pub(crate) fn clear(&mut self) {
        self.bytes.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tactus_hal::mock::{MockClock, MockTransport};
    use tactus_hal::TransportKind;

    #[test]
    fn test_code_and_payload() {
        let packet = Packet::new(&[0x01, 40]).unwrap();
        assert_eq!(packet.code(), 0x01);
        assert_eq!(packet.payload(), &[40]);
        assert_eq!(packet.len(), 2);
    }

    #[test]
    fn test_empty_packet() {
        let packet = Packet::default();
        assert_eq!(packet.code(), 0);
        assert!(packet.payload().is_empty());
    }

    #[test]
    fn test_budget_shrinks_to_deadline() {
        let clock = MockClock::new();
        let conn = Connection::new(MockTransport::new(TransportKind::Serial, clock.clone()), clock.clone());
        let mut budget = ReadBudget::start(&conn, 150);

        assert_eq!(budget.next_timeout(&conn, 150), Some(150));
        clock.advance(100);
        assert_eq!(budget.next_timeout(&conn, 150), Some(50));
        assert_eq!(budget.next_timeout(&conn, 20), Some(20));
        clock.advance(50);
        assert_eq!(budget.next_timeout(&conn, 20), None);
    }

    #[test]
    fn test_polling_budget_counts_reads() {
        let clock = MockClock::new();
        let conn = Connection::new(MockTransport::new(TransportKind::Serial, clock.clone()), clock);
        let mut budget = ReadBudget::start(&conn, 0);

        for _ in 0..MAX_SCAN_READS {
            assert_eq!(budget.next_timeout(&conn, 0), Some(0));
        }
        assert_eq!(budget.next_timeout(&conn, 0), None);
    }

    #[test]
    fn test_oversized_packet() {
        let big = [0u8; MAX_PACKET_SIZE + 1];
        assert_eq!(Packet::new(&big), Err(FrameError::PayloadTooLarge));
    }
}
