//! Legacy single-byte dialect
//!
//! Older Baum firmware (and displays switched into their compatibility mode)
//! speak a HandyTech-style protocol: no framing bytes, every key report is a
//! single byte with bit 7 marking release, and the display answers a reset
//! with its model id.

use heapless::Vec;
use tactus_hal::{Clock, Connection, Transport, TransportError};

use crate::packet::{FrameError, Packet, PacketLengths, ReadBudget};

/// Host → display: reset, answered with an identity
pub const REQ_RESET: u8 = 0xFF;
/// Host → display: cell data follows (status cells first)
pub const REQ_WRITE: u8 = 0x01;

/// Display → host: identity, followed by the model id
pub const RSP_IDENTITY: u8 = 0xFE;
/// Display → host: cell data accepted
pub const RSP_ACK: u8 = 0x7E;

/// Key byte release flag
pub const KEY_RELEASE: u8 = 0x80;
/// First top-key code
pub const KEY_TOP_FIRST: u8 = 0x03;
/// Last top-key code
pub const KEY_TOP_LAST: u8 = 0x08;
/// First routing-key code
pub const KEY_ROUTING_FIRST: u8 = 0x20;

/// Largest write request: code plus every cell
pub const MAX_WRITE_SIZE: usize = 1 + 88;

/// Models reachable through the legacy dialect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LegacyModel {
    pub id: u8,
    pub name: &'static str,
    pub text_cells: u8,
    pub status_cells: u8,
}

pub const MODELS: [LegacyModel; 4] = [
    LegacyModel {
        id: 0x80,
        name: "Modular 80",
        text_cells: 80,
        status_cells: 4,
    },
    LegacyModel {
        id: 0x89,
        name: "Modular 40",
        text_cells: 40,
        status_cells: 4,
    },
    LegacyModel {
        id: 0x74,
        name: "Braille Star 40",
        text_cells: 40,
        status_cells: 0,
    },
    LegacyModel {
        id: 0x78,
        name: "Braille Star 80",
        text_cells: 80,
        status_cells: 0,
    },
];

/// Look up a model by id
pub fn model(id: u8) -> Option<&'static LegacyModel> {
    MODELS.iter().find(|model| model.id == id)
}

/// Packet lengths for the legacy dialect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LegacyLengths {
    /// Text cells (bounds the routing-key codes)
    pub cell_count: u8,
}

impl PacketLengths for LegacyLengths {
    fn expected_length(&self, partial: &[u8]) -> Option<usize> {
        let code = *partial.first()?;
        if code == RSP_IDENTITY {
            return Some(2);
        }
        if code == RSP_ACK {
            return Some(1);
        }
        let key = code & !KEY_RELEASE;
        let routing_end = KEY_ROUTING_FIRST.saturating_add(self.cell_count);
        if (KEY_TOP_FIRST..=KEY_TOP_LAST).contains(&key)
            || (KEY_ROUTING_FIRST..routing_end).contains(&key)
        {
            Some(1)
        } else {
            None
        }
    }
}

/// Decoded legacy packet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LegacyEvent {
    Identity(u8),
    Ack,
    TopKey { key: u8, pressed: bool },
    RoutingKey { key: u8, pressed: bool },
}

impl LegacyEvent {
    /// Decode a complete packet
    pub fn decode(packet: &Packet) -> Result<Self, FrameError> {
        let code = packet.code();
        match code {
            RSP_IDENTITY => packet
                .payload()
                .first()
                .map(|&id| LegacyEvent::Identity(id))
                .ok_or(FrameError::Truncated),
            RSP_ACK => Ok(LegacyEvent::Ack),
            _ => {
                let pressed = code & KEY_RELEASE == 0;
                let key = code & !KEY_RELEASE;
                match key {
                    KEY_TOP_FIRST..=KEY_TOP_LAST => Ok(LegacyEvent::TopKey {
                        key: key - KEY_TOP_FIRST,
                        pressed,
                    }),
                    k if (KEY_ROUTING_FIRST..RSP_ACK).contains(&k) => Ok(LegacyEvent::RoutingKey {
                        key: key - KEY_ROUTING_FIRST,
                        pressed,
                    }),
                    _ => Err(FrameError::UnknownCode(code)),
                }
            }
        }
    }
}

/// Byte-wise framer for the unframed legacy stream
///
/// A packet starts at the first byte the length table recognises.
#[derive(Debug, Clone, Default)]
pub struct LegacyParser {
    packet: Packet,
}

impl LegacyParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.packet.clear();
    }

    pub fn feed(&mut self, byte: u8, lengths: &LegacyLengths) -> Result<Option<Packet>, FrameError> {
        self.packet.push(byte)?;
        match lengths.expected_length(self.packet.as_bytes()) {
            None => {
                self.packet.clear();
                Err(FrameError::UnknownCode(byte))
            }
            Some(total) if self.packet.len() >= total => Ok(Some(core::mem::take(&mut self.packet))),
            Some(_) => Ok(None),
        }
    }

    /// Read one packet, skipping unrecognised bytes
    pub fn read_packet<T, C>(
        &mut self,
        conn: &mut Connection<T, C>,
        lengths: &LegacyLengths,
        timeout_ms: u32,
    ) -> Result<Option<Packet>, TransportError>
    where
        T: Transport,
        C: Clock,
    {
        let mut budget = ReadBudget::start(conn, timeout_ms);
        loop {
            let wanted = if self.packet.is_empty() {
                timeout_ms
            } else {
                crate::escape::SUBSEQUENT_TIMEOUT_MS
            };
            let Some(timeout) = budget.next_timeout(conn, wanted) else {
                return Ok(None);
            };
            let Some(byte) = conn.transport().read_byte(timeout)? else {
                return Ok(None);
            };
            match self.feed(byte, lengths) {
                Ok(Some(packet)) => return Ok(Some(packet)),
                Ok(None) => {}
                Err(e) => debug!("skipping legacy byte: {:?}", e),
            }
        }
    }
}

/// Encode a full-display write: status cells, then text cells
pub fn encode_write(status: &[u8], text: &[u8]) -> Result<Vec<u8, MAX_WRITE_SIZE>, FrameError> {
    let mut out = Vec::new();
    out.push(REQ_WRITE).map_err(|_| FrameError::PayloadTooLarge)?;
    out.extend_from_slice(status)
        .map_err(|_| FrameError::PayloadTooLarge)?;
    out.extend_from_slice(text)
        .map_err(|_| FrameError::PayloadTooLarge)?;
    Ok(out)
}
