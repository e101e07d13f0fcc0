//! State machine definition

use super::events::ConnectionEvent;

/// Connection states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConnectionState {
    /// Transport open, nothing sent yet
    #[default]
    Unprobed,
    /// Identification in progress; `attempt` counts from 1
    Probing { attempt: u8 },
    /// Identified; key packets and cell writes flow
    Operational,
    /// Terminal; the driver must be reconstructed
    Disconnected,
}

impl ConnectionState {
    /// Check if cells may be written and keys read
    pub fn is_operational(&self) -> bool {
        matches!(self, ConnectionState::Operational)
    }

    /// Check if this is the terminal state
    pub fn is_disconnected(&self) -> bool {
        matches!(self, ConnectionState::Disconnected)
    }

    /// Process an event and return the next state
    pub fn transition(self, event: ConnectionEvent) -> Self {
        use ConnectionEvent::*;
        use ConnectionState::*;

        match (self, event) {
            (Disconnected, _) => Disconnected,
            (_, e) if e.is_fatal() => Disconnected,

            (Unprobed, ProbeStarted) => Probing { attempt: 1 },
            (Probing { attempt }, AttemptExpired) => Probing {
                attempt: attempt.saturating_add(1),
            },
            (Probing { .. }, Identified) => Operational,

            // Default: stay in current state
            _ => self,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_flow() {
        let state = ConnectionState::Unprobed;
        let probing = state.transition(ConnectionEvent::ProbeStarted);
        assert_eq!(probing, ConnectionState::Probing { attempt: 1 });

        let retry = probing.transition(ConnectionEvent::AttemptExpired);
        assert_eq!(retry, ConnectionState::Probing { attempt: 2 });

        let ready = retry.transition(ConnectionEvent::Identified);
        assert!(ready.is_operational());
    }

    #[test]
    fn test_fatal_from_any_state() {
        let states = [
            ConnectionState::Unprobed,
            ConnectionState::Probing { attempt: 1 },
            ConnectionState::Operational,
        ];

        for state in states {
            for event in [
                ConnectionEvent::TransportLost,
                ConnectionEvent::PowerDown,
                ConnectionEvent::ProbeFailed,
                ConnectionEvent::OutOfMemory,
            ] {
                assert!(state.transition(event).is_disconnected());
            }
        }
    }

    #[test]
    fn test_disconnected_is_terminal() {
        let state = ConnectionState::Disconnected;
        assert!(state.transition(ConnectionEvent::ProbeStarted).is_disconnected());
        assert!(state.transition(ConnectionEvent::Identified).is_disconnected());
    }

    #[test]
    fn test_identified_only_while_probing() {
        assert_eq!(
            ConnectionState::Unprobed.transition(ConnectionEvent::Identified),
            ConnectionState::Unprobed
        );
        assert_eq!(
            ConnectionState::Operational.transition(ConnectionEvent::AttemptExpired),
            ConnectionState::Operational
        );
    }
}
