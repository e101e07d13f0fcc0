//! Driver interfaces
//!
//! These traits define the boundary between a display driver and the host
//! that owns it.

pub mod driver;

pub use driver::{BrailleDriver, PacketAccess, ReadOutcome};
