//! Commands and the key tables that produce them

pub mod bindings;
pub mod command;

pub use bindings::{KeyBinder, KeyBinding, KeyTable, MAX_CHORD};
pub use command::{Command, CommandKind};
