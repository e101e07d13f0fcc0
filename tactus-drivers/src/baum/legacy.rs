//! Compatibility dialect of older Baum firmware
//!
//! The display answers a reset with its model byte and acknowledges every
//! write. Keys arrive as single bytes.

use tactus_core::config::DriverParameters;
use tactus_core::descriptor::{Dialect, DeviceDescriptor, Generation};
use tactus_core::keys::KeyTracker;
use tactus_core::state::{ConnectionEvent, ConnectionState};
use tactus_core::{ConstructError, DriverError};
use tactus_hal::{Clock, Connection, Transport, TransportError};
use tactus_protocol::legacy::{self, LegacyEvent, LegacyLengths, LegacyParser, REQ_RESET};
use tactus_protocol::Packet;

use super::keys::{self, KeyLayout};
use super::protocol::{BaumProtocol, PacketEffect};

#[derive(Debug, Default)]
pub struct LegacyProtocol {
    parser: LegacyParser,
    lengths: LegacyLengths,
}

impl LegacyProtocol {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<T: Transport, C: Clock> BaumProtocol<T, C> for LegacyProtocol {
    fn dialect(&self) -> Dialect {
        Dialect::Legacy
    }

    fn probe(
        &mut self,
        conn: &mut Connection<T, C>,
        params: &DriverParameters,
        state: &mut ConnectionState,
    ) -> Result<DeviceDescriptor, ConstructError> {
        *state = state.transition(ConnectionEvent::ProbeStarted);

        for attempt in 1..=params.probe_retries {
            if attempt > 1 {
                *state = state.transition(ConnectionEvent::AttemptExpired);
            }
            debug!("legacy probe attempt {} of {}", attempt, params.probe_retries);

            self.parser.reset();
            conn.transport().write_bytes(&[REQ_RESET])?;

            let deadline = conn.now_ms() + u64::from(params.probe_timeout_ms);
            loop {
                let remaining = conn.remaining_ms(deadline);
                if remaining == 0 {
                    break;
                }
                let Some(packet) = self.parser.read_packet(conn, &self.lengths, remaining)? else {
                    continue;
                };

                match LegacyEvent::decode(&packet) {
                    Ok(LegacyEvent::Identity(id)) => match legacy::model(id) {
                        Some(model) => {
                            info!("legacy display {}", model.name);
                            let mut descriptor = DeviceDescriptor::new(Dialect::Legacy, model.text_cells);
                            descriptor.set_name(model.name);
                            descriptor.status_columns = model.status_cells;
                            descriptor.generation = Generation::Legacy;
                            *state = state.transition(ConnectionEvent::Identified);
                            return Ok(descriptor);
                        }
                        None => warn!("unknown legacy model {:#x}", id),
                    },
                    Ok(other) => debug!("ignoring {:?} while probing", other),
                    Err(e) => debug!("ignoring legacy byte: {:?}", e),
                }
            }
        }

        warn!("no legacy display answered");
        *state = state.transition(ConnectionEvent::ProbeFailed);
        Err(ConstructError::NotDetected)
    }

    fn read_packet(
        &mut self,
        conn: &mut Connection<T, C>,
        timeout_ms: u32,
    ) -> Result<Option<Packet>, TransportError> {
        self.parser.read_packet(conn, &self.lengths, timeout_ms)
    }

    fn write_packet(&mut self, conn: &mut Connection<T, C>, packet: &[u8]) -> Result<(), DriverError> {
        if packet.is_empty() {
            return Err(DriverError::Unsupported);
        }
        conn.transport()
            .write_bytes(packet)
            .map_err(DriverError::Transport)
    }

    fn process_packet(&mut self, packet: &Packet, layout: &KeyLayout, tracker: &mut KeyTracker) -> PacketEffect {
        match LegacyEvent::decode(packet) {
            Ok(LegacyEvent::Ack) => {
                trace!("write acknowledged");
                PacketEffect::Status
            }
            Ok(LegacyEvent::Identity(id)) => {
                debug!("unsolicited identity {:#x}", id);
                PacketEffect::Status
            }
            Ok(event) => PacketEffect::Keys(keys::legacy_keys(&event, layout, tracker)),
            Err(e) => {
                warn!("undecodable legacy packet: {:?}", e);
                PacketEffect::Status
            }
        }
    }

    fn write_cells(
        &mut self,
        conn: &mut Connection<T, C>,
        status: &[u8],
        text: &[u8],
    ) -> Result<(), DriverError> {
        let bytes = legacy::encode_write(status, text)?;
        self.write_packet(conn, &bytes)
    }

    fn write_cell_range(
        &mut self,
        _conn: &mut Connection<T, C>,
        _offset: u8,
        _cells: &[u8],
    ) -> Result<(), DriverError> {
        Err(DriverError::Unsupported)
    }

    fn reset(&mut self, conn: &mut Connection<T, C>) -> Result<(), DriverError> {
        self.parser.reset();
        self.write_packet(conn, &[REQ_RESET])
    }

    fn set_geometry(&mut self, descriptor: &DeviceDescriptor) {
        // Routing codes run on past the text cells into the status cells
        let cells = u8::try_from(descriptor.total_cells()).unwrap_or(u8::MAX);
        self.lengths = LegacyLengths { cell_count: cells };
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use tactus_hal::mock::{MockClock, MockTransport};
    use tactus_hal::TransportKind;

    fn connection() -> Connection<MockTransport, MockClock> {
        let clock = MockClock::new();
        Connection::new(MockTransport::new(TransportKind::Serial, clock.clone()), clock)
    }

    #[test]
    fn test_probe_reads_model() {
        let mut conn = connection();
        conn.transport().respond_once(&[REQ_RESET], &[0xFE, 0x89]);
        let mut protocol = LegacyProtocol::new();
        let mut state = ConnectionState::default();

        let descriptor = protocol
            .probe(&mut conn, &DriverParameters::default(), &mut state)
            .unwrap();
        assert_eq!(descriptor.name.as_str(), "Modular 40");
        assert_eq!(descriptor.text_columns, 40);
        assert_eq!(descriptor.status_columns, 4);
        assert!(state.is_operational());
    }

    #[test]
    fn test_probe_skips_unknown_model() {
        let mut conn = connection();
        conn.transport().respond_always(&[REQ_RESET], &[0xFE, 0x01]);
        let mut protocol = LegacyProtocol::new();
        let mut state = ConnectionState::default();

        let result = protocol.probe(&mut conn, &DriverParameters::default(), &mut state);
        assert_eq!(result.err(), Some(ConstructError::NotDetected));
        assert!(state.is_disconnected());
        assert_eq!(conn.transport().writes().len(), 2);
    }

    #[test]
    fn test_write_has_status_first() {
        let mut conn = connection();
        let mut protocol = LegacyProtocol::new();
        protocol.write_cells(&mut conn, &[0xAA], &[1, 2]).unwrap();
        assert_eq!(conn.transport().writes(), &[std::vec![0x01, 0xAA, 1, 2]]);
    }

    #[test]
    fn test_ack_is_status() {
        let mut protocol = LegacyProtocol::new();
        let layout = KeyLayout {
            text_columns: 40,
            status_columns: 0,
            status_routing_first: false,
        };
        let mut tracker = KeyTracker::new();
        let packet = Packet::new(&[0x7E]).unwrap();
        let effect = BaumProtocol::<MockTransport, MockClock>::process_packet(
            &mut protocol,
            &packet,
            &layout,
            &mut tracker,
        );
        assert_eq!(effect, PacketEffect::Status);
    }
}
