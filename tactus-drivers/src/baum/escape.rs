//! Escape-coded dialect for serial and Bluetooth links

use heapless::Vec;

use tactus_core::config::DriverParameters;
use tactus_core::descriptor::{Dialect, DeviceDescriptor};
use tactus_core::keys::KeyTracker;
use tactus_core::state::ConnectionState;
use tactus_core::{ConstructError, DriverError};
use tactus_hal::{Clock, Connection, Transport, TransportError};
use tactus_protocol::baum::BaumRequest;
use tactus_protocol::{encode_escaped, BaumLengths, EscapeParser, Packet, MAX_PACKET_SIZE};

use super::keys::KeyLayout;
use super::protocol::{self, BaumProtocol, PacketEffect};

/// Status then text cells, as one display write
pub(crate) fn join_cells(status: &[u8], text: &[u8]) -> Result<Vec<u8, MAX_PACKET_SIZE>, DriverError> {
    let mut cells = Vec::new();
    cells.extend_from_slice(status).map_err(|_| DriverError::Unsupported)?;
    cells.extend_from_slice(text).map_err(|_| DriverError::Unsupported)?;
    Ok(cells)
}

#[derive(Debug, Default)]
pub struct EscapeProtocol {
    parser: EscapeParser,
    lengths: BaumLengths,
}

impl EscapeProtocol {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<T: Transport, C: Clock> BaumProtocol<T, C> for EscapeProtocol {
    fn dialect(&self) -> Dialect {
        Dialect::Escape
    }

    fn probe(
        &mut self,
        conn: &mut Connection<T, C>,
        params: &DriverParameters,
        state: &mut ConnectionState,
    ) -> Result<DeviceDescriptor, ConstructError> {
        protocol::probe_identity(self, conn, params, state)
    }

    fn read_packet(
        &mut self,
        conn: &mut Connection<T, C>,
        timeout_ms: u32,
    ) -> Result<Option<Packet>, TransportError> {
        self.parser.read_packet(conn, &self.lengths, timeout_ms)
    }

    fn write_packet(&mut self, conn: &mut Connection<T, C>, packet: &[u8]) -> Result<(), DriverError> {
        let (&code, payload) = packet.split_first().ok_or(DriverError::Unsupported)?;
        let bytes = encode_escaped(code, payload)?;
        trace!("sending {:#x}, {} bytes", code, bytes.len());
        conn.transport()
            .write_bytes(&bytes)
            .map_err(DriverError::Transport)
    }

    fn process_packet(&mut self, packet: &Packet, layout: &KeyLayout, tracker: &mut KeyTracker) -> PacketEffect {
        protocol::process_baum_packet(packet, self.lengths.cell_count, layout, tracker)
    }

    fn write_cells(
        &mut self,
        conn: &mut Connection<T, C>,
        status: &[u8],
        text: &[u8],
    ) -> Result<(), DriverError> {
        let cells = join_cells(status, text)?;
        protocol::send_request(self, conn, &BaumRequest::DisplayData(&cells))
    }

    fn write_cell_range(
        &mut self,
        conn: &mut Connection<T, C>,
        offset: u8,
        cells: &[u8],
    ) -> Result<(), DriverError> {
        protocol::send_request(self, conn, &BaumRequest::DisplayDataRange { offset, cells })
    }

    fn reset(&mut self, conn: &mut Connection<T, C>) -> Result<(), DriverError> {
        self.parser.reset();
        protocol::send_request(self, conn, &BaumRequest::CELL_COUNT_QUERY)
    }

    fn set_geometry(&mut self, descriptor: &DeviceDescriptor) {
        self.lengths = BaumLengths {
            cell_count: descriptor.text_columns,
            routing_key_bytes: descriptor.quirks.routing_key_bytes,
        };
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
    fn test_escape_in_cells_is_doubled() {
        let mut conn = connection();
        let mut protocol = EscapeProtocol::new();

        protocol.write_cells(&mut conn, &[], &[0x1B, 0x01]).unwrap();
        assert_eq!(
            conn.transport().writes(),
            &[std::vec![0x1B, 0x01, 0x1B, 0x1B, 0x01]]
        );
    }

    #[test]
    fn test_range_write() {
        let mut conn = connection();
        let mut protocol = EscapeProtocol::new();

        protocol.write_cell_range(&mut conn, 4, &[0xFF, 0x00]).unwrap();
        assert_eq!(
            conn.transport().writes(),
            &[std::vec![0x1B, 0x01, 4, 2, 0xFF, 0x00]]
        );
    }

    #[test]
    fn test_write_failure_is_reported() {
        let mut conn = connection();
        conn.transport().fail_writes(true);
        let mut protocol = EscapeProtocol::new();

        assert_eq!(
            protocol.write_cells(&mut conn, &[], &[1]),
            Err(DriverError::Transport(TransportError::Disconnected))
        );
    }

    #[test]
    fn test_empty_packet_rejected() {
        let mut conn = connection();
        let mut protocol = EscapeProtocol::new();
        assert_eq!(protocol.write_packet(&mut conn, &[]), Err(DriverError::Unsupported));
    }
}
