//! Braille Display Wire Protocols
//!
//! This crate turns the raw byte stream of a braille display into complete,
//! verified packets and back. It knows nothing about key semantics or cell
//! buffers; those live in `tactus-core`.
//!
//! # Framing dialects
//!
//! Escape-coded (Baum serial / Bluetooth):
//! ```text
//! ┌─────┬──────┬──────────────────────────────┐
//! │ ESC │ CODE │ PAYLOAD (ESC doubled)        │
//! │ 1B  │ 1B   │ length fixed by CODE         │
//! └─────┴──────┴──────────────────────────────┘
//! ```
//!
//! Checksum-verified (sentinel framed):
//! ```text
//! ┌─────┬──────┬────────┬─────┬─────────┬─────┬──────────┐
//! │ SOH │ TYPE │ LENGTH │ STX │ PAYLOAD │ ETX │ CHECKSUM │
//! │ 1B  │ 1B   │ 1B     │ 1B  │ 0–250B  │ 1B  │ 2B (BE)  │
//! └─────┴──────┴────────┴─────┴─────────┴─────┴──────────┘
//! ```
//!
//! USB HID: one input report per packet, first byte is the code.

#![no_std]
#![deny(unsafe_code)]

// This mod MUST go first, so that the others see its macros.
mod fmt;

pub mod baum;
pub mod checksum;
pub mod escape;
pub mod hid;
pub mod legacy;
pub mod packet;

pub use baum::{BaumLengths, BaumRequest, BaumResponse};
pub use checksum::{Frame, FrameParser, MAX_PAYLOAD_SIZE};
pub use escape::{encode_escaped, EscapeParser, ESCAPE};
pub use packet::{FrameError, Packet, PacketLengths, MAX_PACKET_SIZE};
