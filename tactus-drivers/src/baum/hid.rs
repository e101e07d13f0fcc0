//! USB HID dialect: one packet per report, no escape coding

use tactus_core::config::DriverParameters;
use tactus_core::descriptor::{Dialect, DeviceDescriptor};
use tactus_core::keys::KeyTracker;
use tactus_core::state::ConnectionState;
use tactus_core::{ConstructError, DriverError};
use tactus_hal::{Clock, Connection, Transport, TransportError};
use tactus_protocol::baum::BaumRequest;
use tactus_protocol::{hid, BaumLengths, Packet};

use super::escape::join_cells;
use super::keys::KeyLayout;
use super::protocol::{self, BaumProtocol, PacketEffect};

#[derive(Debug, Default)]
pub struct HidProtocol {
    lengths: BaumLengths,
}

impl HidProtocol {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<T: Transport, C: Clock> BaumProtocol<T, C> for HidProtocol {
    fn dialect(&self) -> Dialect {
        Dialect::Hid
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
        hid::read_report(conn, &self.lengths, timeout_ms)
    }

    fn write_packet(&mut self, conn: &mut Connection<T, C>, packet: &[u8]) -> Result<(), DriverError> {
        if packet.is_empty() {
            return Err(DriverError::Unsupported);
        }
        trace!("sending report {:#x}, {} bytes", packet[0], packet.len());
        conn.transport()
            .write_bytes(packet)
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
        protocol::send_request(self, conn, &BaumRequest::CELL_COUNT_QUERY)
    }

    fn set_geometry(&mut self, descriptor: &DeviceDescriptor) {
        self.lengths = BaumLengths {
            cell_count: descriptor.text_columns,
            routing_key_bytes: descriptor.quirks.routing_key_bytes,
        };
    }
}
