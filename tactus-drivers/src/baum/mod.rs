//! Baum braille displays
//!
//! Covers the escape-coded protocol on serial and Bluetooth links, the same
//! packets carried in USB HID reports, and the single-byte compatibility
//! dialect of older firmware.
//!
//! # Lifecycle
//!
//! [`BaumDriver::construct`] opens nothing itself: it takes an already
//! opened transport, probes the display and returns the only handle.
//! [`BrailleDriver::destruct`] consumes the handle and gives the transport
//! back.

pub mod bindings;
pub mod escape;
pub mod hid;
pub mod keys;
pub mod legacy;
pub mod models;
pub mod protocol;

use alloc::boxed::Box;

use heapless::Deque;

use tactus_core::cells::{CellBuffer, CellRange, OutputTable};
use tactus_core::commands::{Command, KeyBinder};
use tactus_core::config::DriverConfig;
use tactus_core::descriptor::{Dialect, DeviceDescriptor};
use tactus_core::keys::{KeyGroup, KeyTracker};
use tactus_core::state::{ConnectionEvent, ConnectionState};
use tactus_core::traits::{BrailleDriver, PacketAccess, ReadOutcome};
use tactus_core::{ConstructError, DriverError};
use tactus_hal::{Clock, Connection, SerialConfig, Transport};
use tactus_protocol::Packet;

use self::escape::EscapeProtocol;
use self::hid::HidProtocol;
use self::keys::KeyLayout;
use self::legacy::LegacyProtocol;
use self::protocol::{BaumProtocol, PacketEffect};

/// Line settings for serial links; the host applies them when opening the port
pub const SERIAL_PARAMETERS: SerialConfig = SerialConfig::eight_n_one(19200);

/// Packets handled by one `read_command` call
pub const MAX_PACKETS_PER_READ: usize = 32;

/// Suggested delay before polling again after status-only input
pub const STATUS_RETRY_MS: u32 = 50;

/// Commands waiting to be returned
const COMMAND_QUEUE: usize = 16;

fn strategy<T, C>(dialect: Dialect) -> Box<dyn BaumProtocol<T, C>>
where
    T: Transport + 'static,
    C: Clock + 'static,
{
    match dialect {
        Dialect::Escape => Box::new(EscapeProtocol::new()),
        Dialect::Hid => Box::new(HidProtocol::new()),
        Dialect::Legacy => Box::new(LegacyProtocol::new()),
    }
}

/// Driver for one attached Baum display
pub struct BaumDriver<T: Transport + 'static, C: Clock + 'static> {
    conn: Connection<T, C>,
    protocol: Box<dyn BaumProtocol<T, C>>,
    descriptor: DeviceDescriptor,
    state: ConnectionState,
    tracker: KeyTracker,
    binder: KeyBinder,
    text: CellBuffer,
    status: CellBuffer,
    output: OutputTable,
    layout: KeyLayout,
    pending: Deque<Command, COMMAND_QUEUE>,
}

impl<T: Transport + 'static, C: Clock + 'static> BaumDriver<T, C> {
    /// Probe the display on `transport` and build a driver for it
    pub fn construct(transport: T, clock: C, config: &DriverConfig) -> Result<Self, ConstructError> {
        let mut conn = Connection::new(transport, clock);
        let dialect = protocol::select_dialect(&config.device, config.parameters.protocol);
        let mut protocol = strategy::<T, C>(dialect);
        let mut state = ConnectionState::default();

        info!("probing for a Baum display");
        let mut descriptor = protocol.probe(&mut conn, &config.parameters, &mut state)?;

        if let Some(model) = models::lookup(&descriptor.name) {
            debug!("model quirks for {}", model.name);
            descriptor.quirks = model.quirks;
        }
        if dialect == Dialect::Legacy {
            descriptor.quirks.partial_writes = false;
        }
        protocol.set_geometry(&descriptor);

        let text = CellBuffer::new(usize::from(descriptor.text_columns))?;
        let status = CellBuffer::new(usize::from(descriptor.status_columns))?;
        let table = bindings::select(descriptor.quirks.vario_keys, config.parameters.variokeys);

        info!(
            "{} text and {} status cells, {} key table",
            descriptor.text_columns,
            descriptor.status_columns,
            table.name
        );

        Ok(Self {
            conn,
            protocol,
            layout: KeyLayout::new(&descriptor),
            descriptor,
            state,
            tracker: KeyTracker::new(),
            binder: KeyBinder::new(table),
            text,
            status,
            output: OutputTable::identity(),
            pending: Deque::new(),
        })
    }

    /// What the probe learned
    pub fn descriptor(&self) -> &DeviceDescriptor {
        &self.descriptor
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn transport(&self) -> &T {
        self.conn.transport_ref()
    }

    /// Direct access to the link
    pub fn transport_mut(&mut self) -> &mut T {
        self.conn.transport()
    }

    /// Replace the dot translation; the next write sends every cell
    pub fn set_output_table(&mut self, table: OutputTable) {
        self.output = table;
        self.text.force_refresh();
        self.status.force_refresh();
    }

    fn ensure_operational(&self) -> Result<(), DriverError> {
        if self.state.is_operational() {
            Ok(())
        } else {
            Err(DriverError::RestartRequired)
        }
    }

    /// Send a staged change of the text or status row
    fn flush(&mut self, range: CellRange, is_text: bool) -> Result<(), DriverError> {
        let result = if self.descriptor.quirks.partial_writes {
            let (buffer, base) = if is_text {
                (&self.text, usize::from(self.descriptor.status_columns))
            } else {
                (&self.status, 0)
            };
            let offset = u8::try_from(base + range.start).map_err(|_| DriverError::Unsupported)?;
            self.protocol
                .write_cell_range(&mut self.conn, offset, &buffer.staged()[range.start..range.end])
        } else if is_text {
            self.protocol
                .write_cells(&mut self.conn, self.status.current(), self.text.staged())
        } else {
            self.protocol
                .write_cells(&mut self.conn, self.status.staged(), self.text.current())
        };

        let (buffer, other) = if is_text {
            (&mut self.text, &mut self.status)
        } else {
            (&mut self.status, &mut self.text)
        };
        match result {
            Ok(()) => {
                buffer.commit();
                if !self.descriptor.quirks.partial_writes {
                    other.mark_sent();
                }
                Ok(())
            }
            Err(e) => {
                warn!("cell write failed: {}", e);
                buffer.discard();
                Err(e)
            }
        }
    }

    fn queue(&mut self, command: Command) {
        if self.pending.push_back(command).is_err() {
            warn!("command queue full, dropping {:?}", command.kind);
        }
    }

    fn resize(&mut self, cells: u8) -> Result<(), DriverError> {
        if let Err(e) = self.text.resize(usize::from(cells)) {
            warn!("cannot resize to {} cells: {}", cells, e);
            return Err(self.lost(ConnectionEvent::OutOfMemory));
        }
        self.status.force_refresh();
        self.descriptor.text_columns = cells;
        self.layout.text_columns = cells;
        self.protocol.set_geometry(&self.descriptor);

        let limit = usize::from(cells);
        let released = self.tracker.resize_group(KeyGroup::Routing, limit).len()
            + self.tracker.resize_group(KeyGroup::HorizontalSensors, limit).len();
        if released > 0 {
            debug!("{} keys beyond the new width released", released);
        }
        self.binder.reset();
        self.queue(Command::resize(cells));
        Ok(())
    }

    fn lost(&mut self, event: ConnectionEvent) -> DriverError {
        self.state = self.state.transition(event);
        self.tracker.reset();
        self.binder.reset();
        DriverError::RestartRequired
    }
}

impl<T: Transport + 'static, C: Clock + 'static> BrailleDriver for BaumDriver<T, C> {
    type Transport = T;

    fn text_columns(&self) -> u8 {
        self.descriptor.text_columns
    }

    fn status_columns(&self) -> u8 {
        self.descriptor.status_columns
    }

    fn write_window(&mut self, cells: &[u8]) -> Result<(), DriverError> {
        self.ensure_operational()?;
        match self.text.stage(cells, &self.output)? {
            Some(range) => self.flush(range, true),
            None => Ok(()),
        }
    }

    fn write_status(&mut self, cells: &[u8]) -> Result<(), DriverError> {
        self.ensure_operational()?;
        match self.status.stage(cells, &self.output)? {
            Some(range) => self.flush(range, false),
            None => Ok(()),
        }
    }

    fn read_command(&mut self) -> Result<ReadOutcome, DriverError> {
        self.ensure_operational()?;
        if let Some(command) = self.pending.pop_front() {
            return Ok(ReadOutcome::Command(command));
        }

        let mut status_only = false;
        for _ in 0..MAX_PACKETS_PER_READ {
            let packet = match self.protocol.read_packet(&mut self.conn, 0) {
                Ok(Some(packet)) => packet,
                Ok(None) => break,
                Err(e) => {
                    warn!("read failed: {}", e);
                    return Err(self.lost(ConnectionEvent::TransportLost));
                }
            };

            match self
                .protocol
                .process_packet(&packet, &self.layout, &mut self.tracker)
            {
                PacketEffect::Keys(events) => {
                    for event in events {
                        if let Some(command) = self.binder.handle(event) {
                            self.queue(command);
                        }
                    }
                }
                PacketEffect::Resize(cells) => self.resize(cells)?,
                PacketEffect::Restart => return Err(self.lost(ConnectionEvent::PowerDown)),
                PacketEffect::Status => status_only = true,
            }

            if let Some(command) = self.pending.pop_front() {
                return Ok(ReadOutcome::Command(command));
            }
        }

        Ok(ReadOutcome::Pending {
            retry_after_ms: status_only.then_some(STATUS_RETRY_MS),
        })
    }

    fn destruct(self) -> T {
        info!("releasing {}", self.descriptor.name.as_str());
        self.conn.into_parts().0
    }
}

impl<T: Transport + 'static, C: Clock + 'static> PacketAccess for BaumDriver<T, C> {
    fn read_packet(&mut self) -> Result<Option<Packet>, DriverError> {
        self.ensure_operational()?;
        match self.protocol.read_packet(&mut self.conn, 0) {
            Ok(packet) => Ok(packet),
            Err(e) => {
                warn!("read failed: {}", e);
                Err(self.lost(ConnectionEvent::TransportLost))
            }
        }
    }

    fn write_packet(&mut self, packet: &[u8]) -> Result<(), DriverError> {
        self.ensure_operational()?;
        self.protocol.write_packet(&mut self.conn, packet)
    }

    fn reset(&mut self) -> Result<(), DriverError> {
        self.ensure_operational()?;
        self.tracker.reset();
        self.binder.reset();
        self.pending.clear();
        self.text.force_refresh();
        self.status.force_refresh();
        self.protocol.reset(&mut self.conn)
    }
}
