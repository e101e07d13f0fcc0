//! Braille display family drivers
//!
//! This crate provides concrete implementations of the traits defined in
//! tactus-core for display families:
//!
//! - Baum (VarioPro, Vario, SuperVario, PocketVario, Inka, DM80P, Conny,
//!   Refreshabraille, Orbit and compatibles) over serial, USB HID and
//!   Bluetooth, including the legacy single-byte mode

#![no_std]
#![deny(unsafe_code)]

extern crate alloc;

// This mod MUST go first, so that the others see its macros.
mod fmt;

pub mod baum;

pub use baum::BaumDriver;
