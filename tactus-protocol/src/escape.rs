//! Escape-coded framing
//!
//! Every packet starts with `ESC` followed by its code byte. A literal `ESC`
//! inside the packet is sent twice. `ESC` followed by anything else always
//! starts a new packet, which is how the stream resynchronises after noise.

use heapless::Vec;
use tactus_hal::{Clock, Connection, Transport, TransportError};

use crate::packet::{FrameError, Packet, PacketLengths, ReadBudget, MAX_PACKET_SIZE};

/// Packet start / escape byte
pub const ESCAPE: u8 = 0x1B;

/// Worst-case encoded size: leading ESC plus every byte doubled
pub const MAX_ENCODED_SIZE: usize = 1 + 2 * MAX_PACKET_SIZE;

/// Wait for each byte after the first of a started packet
///
/// The rest of a packet should already be in the OS buffer.
pub const SUBSEQUENT_TIMEOUT_MS: u32 = 100;

/// Encode a packet: `ESC`, code, payload with `ESC` doubled
pub fn encode_escaped(code: u8, payload: &[u8]) -> Result<Vec<u8, MAX_ENCODED_SIZE>, FrameError> {
    let mut out = Vec::new();
    out.push(ESCAPE).map_err(|_| FrameError::BufferTooSmall)?;
    for &byte in core::iter::once(&code).chain(payload) {
        out.push(byte).map_err(|_| FrameError::BufferTooSmall)?;
        if byte == ESCAPE {
            out.push(ESCAPE).map_err(|_| FrameError::BufferTooSmall)?;
        }
    }
    Ok(out)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseState {
    /// Discarding bytes until an ESC
    Waiting,
    /// Inside a packet (or right after its leading ESC)
    Started,
    /// Saw ESC inside a packet; next byte decides literal vs restart
    Escaped,
}

/// State machine for parsing escape-coded packets
///
/// State survives across calls, so bytes may arrive in any chunking.
#[derive(Debug, Clone)]
pub struct EscapeParser {
    state: ParseState,
    packet: Packet,
}

impl Default for EscapeParser {
    fn default() -> Self {
        Self::new()
    }
}

impl EscapeParser {
    /// Create a new escape parser
    pub fn new() -> Self {
        Self {
            state: ParseState::Waiting,
            packet: Packet::default(),
        }
    }

    /// Drop any partial packet and wait for the next ESC
    pub fn reset(&mut self) {
        self.state = ParseState::Waiting;
        self.packet.clear();
    }

    /// True while a packet has been started but not completed
    pub fn in_packet(&self) -> bool {
        self.state != ParseState::Waiting
    }

    /// Feed a single byte to the parser
    ///
    /// Returns `Ok(Some(packet))` when a packet completes, `Ok(None)` when
    /// more bytes are needed, or `Err` when the byte was discarded as
    /// malformed. The parser is ready for the next byte in every case.
    pub fn feed<L>(&mut self, byte: u8, lengths: &L) -> Result<Option<Packet>, FrameError>
    where
        L: PacketLengths + ?Sized,
    {
        match self.state {
            ParseState::Waiting => {
                if byte == ESCAPE {
                    self.packet.clear();
                    self.state = ParseState::Started;
                } else {
                    trace!("discarding byte {:#x} outside packet", byte);
                }
                Ok(None)
            }
            ParseState::Started => {
                if byte == ESCAPE && !self.packet.is_empty() {
                    self.state = ParseState::Escaped;
                    return Ok(None);
                }
                self.accept(byte, lengths)
            }
            ParseState::Escaped => {
                self.state = ParseState::Started;
                if byte != ESCAPE {
                    debug!(
                        "abandoning partial packet {:#x} after {} bytes",
                        self.packet.code(),
                        self.packet.len()
                    );
                    self.packet.clear();
                }
                self.accept(byte, lengths)
            }
        }
    }

    fn accept<L>(&mut self, byte: u8, lengths: &L) -> Result<Option<Packet>, FrameError>
    where
        L: PacketLengths + ?Sized,
    {
        if let Err(e) = self.packet.push(byte) {
            self.reset();
            return Err(e);
        }

        match lengths.expected_length(self.packet.as_bytes()) {
            None => {
                let code = self.packet.code();
                self.reset();
                Err(FrameError::UnknownCode(code))
            }
            Some(total) if self.packet.len() >= total => {
                let packet = core::mem::take(&mut self.packet);
                self.reset();
                Ok(Some(packet))
            }
            Some(_) => Ok(None),
        }
    }

    /// Read bytes from `conn` until one packet completes
    ///
    /// The first byte of a new packet waits up to `timeout_ms`; bytes of a
    /// started packet wait [`SUBSEQUENT_TIMEOUT_MS`]. No call outlasts a
    /// nonzero `timeout_ms`, even on a line that never goes quiet. Returns
    /// `Ok(None)` when the stream runs dry or the call's budget is spent.
    /// Malformed input is logged and skipped; only transport failures are
    /// returned as errors.
    pub fn read_packet<T, C, L>(
        &mut self,
        conn: &mut Connection<T, C>,
        lengths: &L,
        timeout_ms: u32,
    ) -> Result<Option<Packet>, TransportError>
    where
        T: Transport,
        C: Clock,
        L: PacketLengths + ?Sized,
    {
        let mut budget = ReadBudget::start(conn, timeout_ms);
        loop {
            let wanted = if self.in_packet() {
                SUBSEQUENT_TIMEOUT_MS
            } else {
                timeout_ms
            };
            let Some(timeout) = budget.next_timeout(conn, wanted) else {
                trace!("read budget spent");
                return Ok(None);
            };

            let Some(byte) = conn.transport().read_byte(timeout)? else {
                if self.in_packet() {
                    debug!("input stalled inside packet {:#x}", self.packet.code());
                }
                return Ok(None);
            };

            match self.feed(byte, lengths) {
                Ok(Some(packet)) => {
                    trace!("packet {:#x}, {} bytes", packet.code(), packet.len());
                    return Ok(Some(packet));
                }
                Ok(None) => {}
                Err(e) => warn!("discarding malformed input: {:?}", e),
            }
        }
    }
}
