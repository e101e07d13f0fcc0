//! Tactus Hardware Abstraction Layer
//!
//! This crate defines the byte-stream abstractions every braille driver
//! consumes. The platform (a serial port, a USB endpoint, a Bluetooth RFCOMM
//! channel, or the Android shims wrapping them) implements [`Transport`];
//! drivers never touch the operating system directly.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Drivers (tactus-drivers)               │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  tactus-hal (this crate - traits)       │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┼───────────┐
//!         ▼           ▼           ▼
//!     ┌────────┐  ┌───────┐  ┌───────────┐
//!     │ serial │  │  USB  │  │ Bluetooth │
//!     └────────┘  └───────┘  └───────────┘
//! ```
//!
//! # Traits
//!
//! - [`transport::Transport`] - Blocking-with-timeout byte stream
//! - [`clock::Clock`] - Monotonic milliseconds for bounded waits

#![no_std]
#![deny(unsafe_code)]

#[cfg(any(feature = "std", test))]
extern crate std;

#[cfg(any(feature = "mock", test))]
extern crate alloc;

pub mod clock;
pub mod identifier;
pub mod io;
#[cfg(any(feature = "mock", test))]
pub mod mock;
pub mod serial;
pub mod transport;

// Re-export key traits at crate root for convenience
pub use clock::Clock;
pub use identifier::{DeviceIdentifier, IdentifierError};
pub use io::EmbeddedIoTransport;
pub use serial::SerialConfig;
pub use transport::{Connection, Transport, TransportError, TransportKind};
