//! Events that move a connection between states

/// Something that happened on the link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConnectionEvent {
    /// Identification requests are about to go out
    ProbeStarted,
    /// An attempt ended without identification; another follows
    AttemptExpired,
    /// The display identified itself
    Identified,
    /// All attempts used up
    ProbeFailed,
    /// Read or write on the transport failed
    TransportLost,
    /// The display announced it is switching off
    PowerDown,
    /// Cell buffers could not grow to a new geometry
    OutOfMemory,
}

impl ConnectionEvent {
    /// Check if this event ends the connection for good
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ConnectionEvent::ProbeFailed
                | ConnectionEvent::TransportLost
                | ConnectionEvent::PowerDown
                | ConnectionEvent::OutOfMemory
        )
    }
}
