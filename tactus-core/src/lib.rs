//! Transport-agnostic core logic for braille display drivers
//!
//! This crate contains everything a driver needs that does not depend on a
//! particular display family:
//!
//! - Key/sensor state tracking and chord resolution
//! - Cell buffers with change detection and dot translation
//! - Device descriptor produced by probing
//! - Connection state machine
//! - Configuration types
//! - The driver traits hosts program against

#![no_std]
#![deny(unsafe_code)]

extern crate alloc;

// This mod MUST go first, so that the others see its macros.
mod fmt;

pub mod cells;
pub mod commands;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod keys;
pub mod state;
pub mod traits;

pub use error::{BufferError, ConfigError, ConstructError, DriverError};
