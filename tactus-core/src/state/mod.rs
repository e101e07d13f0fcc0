//! Connection lifecycle
//!
//! A driver's link moves through a small, explicit, deterministic set of
//! states. Operations consult the state instead of poking at the transport
//! once it is known to be gone.

pub mod events;
pub mod machine;

pub use events::ConnectionEvent;
pub use machine::ConnectionState;
