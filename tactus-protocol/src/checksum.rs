//! Checksum-verified frame encoding and decoding
//!
//! Frame format:
//! - SOH (1 byte): 0x01 start of frame
//! - TYPE (1 byte): message type identifier
//! - LENGTH (1 byte): payload length (0-250)
//! - STX (1 byte): 0x02 start of payload
//! - PAYLOAD (0-250 bytes): type-specific data
//! - ETX (1 byte): 0x03 end of payload
//! - CHECKSUM (2 bytes, big-endian): wrapping sum of TYPE, LENGTH and PAYLOAD

use heapless::Vec;
use tactus_hal::{Clock, Connection, Transport, TransportError};

use crate::packet::{FrameError, ReadBudget};

/// Start of frame
pub const SOH: u8 = 0x01;
/// Start of payload
pub const STX: u8 = 0x02;
/// End of payload
pub const ETX: u8 = 0x03;

/// Maximum payload size in bytes
pub const MAX_PAYLOAD_SIZE: usize = 250;

/// Maximum complete frame size (SOH + TYPE + LENGTH + STX + payload + ETX + CHECKSUM)
pub const MAX_FRAME_SIZE: usize = 4 + MAX_PAYLOAD_SIZE + 3;

/// A parsed or constructed frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Message type identifier
    pub msg_type: u8,
    /// Payload data
    pub payload: Vec<u8, MAX_PAYLOAD_SIZE>,
}

impl Frame {
    /// Create a new frame with the given message type and payload
    pub fn new(msg_type: u8, payload: &[u8]) -> Result<Self, FrameError> {
        let mut payload_vec = Vec::new();
        payload_vec
            .extend_from_slice(payload)
            .map_err(|_| FrameError::PayloadTooLarge)?;

        Ok(Self {
            msg_type,
            payload: payload_vec,
        })
    }

    /// Create a frame with no payload
    pub fn empty(msg_type: u8) -> Self {
        Self {
            msg_type,
            payload: Vec::new(),
        }
    }

    /// Calculate checksum for frame data
    pub fn calculate_checksum(msg_type: u8, length: u8, payload: &[u8]) -> u16 {
        payload
            .iter()
            .fold(u16::from(msg_type).wrapping_add(u16::from(length)), |sum, &b| {
                sum.wrapping_add(u16::from(b))
            })
    }

    /// Encode this frame into a byte buffer
    ///
    /// Returns the number of bytes written
    pub fn encode(&self, buffer: &mut [u8]) -> Result<usize, FrameError> {
        let payload_len = self.payload.len();
        let frame_len = 7 + payload_len;
        if buffer.len() < frame_len {
            return Err(FrameError::BufferTooSmall);
        }

        let length = payload_len as u8;
        let checksum = Self::calculate_checksum(self.msg_type, length, &self.payload);

        buffer[0] = SOH;
        buffer[1] = self.msg_type;
        buffer[2] = length;
        buffer[3] = STX;
        buffer[4..4 + payload_len].copy_from_slice(&self.payload);
        buffer[4 + payload_len] = ETX;
        buffer[5 + payload_len..frame_len].copy_from_slice(&checksum.to_be_bytes());

        Ok(frame_len)
    }

    /// Encode this frame into a heapless Vec
    pub fn encode_to_vec(&self) -> Result<Vec<u8, MAX_FRAME_SIZE>, FrameError> {
        let mut buffer = [0u8; MAX_FRAME_SIZE];
        let len = self.encode(&mut buffer)?;
        let mut vec = Vec::new();
        vec.extend_from_slice(&buffer[..len])
            .map_err(|_| FrameError::BufferTooSmall)?;
        Ok(vec)
    }
}

/// State machine for parsing incoming frames
#[derive(Debug, Clone)]
pub struct FrameParser {
    state: ParseState,
    buffer: Vec<u8, MAX_PAYLOAD_SIZE>,
    expected_length: u8,
    msg_type: u8,
    checksum_high: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseState {
    /// Waiting for SOH
    WaitingForStart,
    /// Got SOH, waiting for TYPE
    WaitingForType,
    /// Got TYPE, waiting for LENGTH
    WaitingForLength,
    /// Got LENGTH, waiting for STX
    WaitingForStx,
    /// Reading payload bytes
    ReadingPayload,
    /// Payload complete, waiting for ETX
    WaitingForEtx,
    /// Waiting for the checksum high byte
    WaitingForChecksumHigh,
    /// Waiting for the checksum low byte
    WaitingForChecksumLow,
}

impl Default for FrameParser {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameParser {
    /// Create a new frame parser
    pub fn new() -> Self {
        Self {
            state: ParseState::WaitingForStart,
            buffer: Vec::new(),
            expected_length: 0,
            msg_type: 0,
            checksum_high: 0,
        }
    }

    /// Reset the parser state
    pub fn reset(&mut self) {
        self.state = ParseState::WaitingForStart;
        self.buffer.clear();
        self.expected_length = 0;
        self.msg_type = 0;
        self.checksum_high = 0;
    }

    /// True while a frame has been started but not completed
    pub fn in_frame(&self) -> bool {
        self.state != ParseState::WaitingForStart
    }

    /// Feed a single byte to the parser
    ///
    /// Returns `Ok(Some(frame))` when a complete valid frame is parsed,
    /// `Ok(None)` when more bytes are needed, or `Err` on parse error.
    pub fn feed(&mut self, byte: u8) -> Result<Option<Frame>, FrameError> {
        match self.state {
            ParseState::WaitingForStart => {
                if byte == SOH {
                    self.state = ParseState::WaitingForType;
                }
                // Silently ignore non-SOH bytes while waiting
                Ok(None)
            }
            ParseState::WaitingForType => {
                self.msg_type = byte;
                self.state = ParseState::WaitingForLength;
                Ok(None)
            }
            ParseState::WaitingForLength => {
                if byte as usize > MAX_PAYLOAD_SIZE {
                    self.reset();
                    return Err(FrameError::InvalidFrame);
                }
                self.expected_length = byte;
                self.state = ParseState::WaitingForStx;
                Ok(None)
            }
            ParseState::WaitingForStx => {
                if byte != STX {
                    self.reset();
                    return Err(FrameError::InvalidFrame);
                }
                self.buffer.clear();
                self.state = if self.expected_length == 0 {
                    ParseState::WaitingForEtx
                } else {
                    ParseState::ReadingPayload
                };
                Ok(None)
            }
            ParseState::ReadingPayload => {
                // Cannot overflow: expected_length <= MAX_PAYLOAD_SIZE
                let _ = self.buffer.push(byte);
                if self.buffer.len() == self.expected_length as usize {
                    self.state = ParseState::WaitingForEtx;
                }
                Ok(None)
            }
            ParseState::WaitingForEtx => {
                if byte != ETX {
                    self.reset();
                    return Err(FrameError::InvalidFrame);
                }
                self.state = ParseState::WaitingForChecksumHigh;
                Ok(None)
            }
            ParseState::WaitingForChecksumHigh => {
                self.checksum_high = byte;
                self.state = ParseState::WaitingForChecksumLow;
                Ok(None)
            }
            ParseState::WaitingForChecksumLow => {
                let received = u16::from_be_bytes([self.checksum_high, byte]);
                let expected =
                    Frame::calculate_checksum(self.msg_type, self.expected_length, &self.buffer);

                if received != expected {
                    self.reset();
                    return Err(FrameError::InvalidChecksum);
                }

                let frame = Frame {
                    msg_type: self.msg_type,
                    payload: self.buffer.clone(),
                };

                self.reset();
                Ok(Some(frame))
            }
        }
    }

    /// Feed multiple bytes to the parser
    ///
    /// Returns the first complete frame found, if any.
    /// Remaining bytes after a complete frame are not consumed.
    pub fn feed_bytes(&mut self, bytes: &[u8]) -> Result<Option<Frame>, FrameError> {
        for &byte in bytes {
            if let Some(frame) = self.feed(byte)? {
                return Ok(Some(frame));
            }
        }
        Ok(None)
    }

    /// Read from `conn` until one verified frame completes
    ///
    /// Same timeout and budget policy as the escape framer. Rejected frames
    /// are logged and skipped.
    pub fn read_frame<T, C>(
        &mut self,
        conn: &mut Connection<T, C>,
        timeout_ms: u32,
    ) -> Result<Option<Frame>, TransportError>
    where
        T: Transport,
        C: Clock,
    {
        let mut budget = ReadBudget::start(conn, timeout_ms);
        loop {
            let wanted = if self.in_frame() {
                crate::escape::SUBSEQUENT_TIMEOUT_MS
            } else {
                timeout_ms
            };
            let Some(timeout) = budget.next_timeout(conn, wanted) else {
                return Ok(None);
            };

            let Some(byte) = conn.transport().read_byte(timeout)? else {
                return Ok(None);
            };

            match self.feed(byte) {
                Ok(Some(frame)) => return Ok(Some(frame)),
                Ok(None) => {}
                Err(e) => warn!("rejecting frame: {:?}", e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tactus_hal::mock::{MockClock, MockTransport};
    use tactus_hal::TransportKind;

    #[test]
    fn test_frame_encode_empty_payload() {
        let frame = Frame::empty(0x20);
        let mut buffer = [0u8; 10];
        let len = frame.encode(&mut buffer).unwrap();

        assert_eq!(len, 7);
        assert_eq!(&buffer[..7], &[SOH, 0x20, 0, STX, ETX, 0x00, 0x20]);
    }

    #[test]
    fn test_frame_encode_with_payload() {
        let frame = Frame::new(0x21, &[0xFF, 0xFF, 0x10]).unwrap();
        let mut buffer = [0u8; 20];
        let len = frame.encode(&mut buffer).unwrap();

        assert_eq!(len, 10);
        assert_eq!(buffer[2], 3); // length
        assert_eq!(buffer[7], ETX);
        // 0x21 + 3 + 0xFF + 0xFF + 0x10 = 0x0232
        assert_eq!(&buffer[8..10], &[0x02, 0x32]);
    }

    #[test]
    fn test_frame_roundtrip() {
        let original = Frame::new(0x21, &[1, 2, 3, 4, 5]).unwrap();
        let encoded = original.encode_to_vec().unwrap();

        let mut parser = FrameParser::new();
        let parsed = parser.feed_bytes(&encoded).unwrap().unwrap();

        assert_eq!(parsed, original);
    }

    #[test]
    fn test_parser_invalid_checksum() {
        let frame = Frame::new(0x30, &[9, 9]).unwrap();
        let mut encoded = frame.encode_to_vec().unwrap();
        let last_idx = encoded.len() - 1;
        encoded[last_idx] ^= 0x01;

        let mut parser = FrameParser::new();
        assert_eq!(parser.feed_bytes(&encoded), Err(FrameError::InvalidChecksum));
    }

    #[test]
    fn test_parser_missing_sentinel() {
        let frame = Frame::new(0x30, &[7]).unwrap();
        let mut encoded = frame.encode_to_vec().unwrap();
        encoded[3] = 0x00; // STX

        let mut parser = FrameParser::new();
        assert_eq!(parser.feed_bytes(&encoded), Err(FrameError::InvalidFrame));
    }

    #[test]
    fn test_parser_resync_after_garbage() {
        let frame = Frame::empty(0x24);
        let encoded = frame.encode_to_vec().unwrap();

        let mut data = Vec::<u8, 20>::new();
        data.extend_from_slice(&[0x00, 0xFF, 0x12, 0x34]).unwrap();
        data.extend_from_slice(&encoded).unwrap();

        let mut parser = FrameParser::new();
        let parsed = parser.feed_bytes(&data).unwrap().unwrap();

        assert_eq!(parsed.msg_type, 0x24);
    }

    #[test]
    fn test_read_frame_skips_rejected() {
        let mut corrupt = Frame::new(0x11, &[1]).unwrap().encode_to_vec().unwrap();
        corrupt[4] = 2;
        let good = Frame::new(0x12, &[3]).unwrap().encode_to_vec().unwrap();

        let clock = MockClock::new();
        let mut conn = Connection::new(MockTransport::new(TransportKind::Serial, clock.clone()), clock);
        conn.transport().push_inbound(&corrupt);
        conn.transport().push_inbound(&good);

        let mut parser = FrameParser::new();
        let frame = parser.read_frame(&mut conn, 0).unwrap().unwrap();
        assert_eq!(frame.msg_type, 0x12);
        assert_eq!(parser.read_frame(&mut conn, 0), Ok(None));
    }

    #[test]
    fn test_payload_too_large() {
        let large_payload = [0u8; MAX_PAYLOAD_SIZE + 1];
        let result = Frame::new(0x21, &large_payload);
        assert_eq!(result, Err(FrameError::PayloadTooLarge));
    }
}
