//! Dialect strategy shared by the Baum protocols
//!
//! One [`BaumProtocol`] is chosen when the driver is constructed and kept for
//! its lifetime. The escape and HID dialects carry the same packets and share
//! their probe and packet handling; only framing differs.

use heapless::Vec;

use tactus_core::config::{DriverParameters, ProtocolSelection};
use tactus_core::descriptor::{Dialect, DeviceDescriptor, Generation, MAX_NAME_LEN};
use tactus_core::keys::{KeyEvents, KeyTracker};
use tactus_core::state::{ConnectionEvent, ConnectionState};
use tactus_core::{ConstructError, DriverError};
use tactus_hal::{Clock, Connection, DeviceIdentifier, Transport, TransportError};
use tactus_protocol::baum::{BaumRequest, BaumResponse, MAX_CELLS};
use tactus_protocol::Packet;

use super::keys::{self, KeyLayout};
use super::models;

/// USB vendor id of Baum displays, which speak HID over USB
pub const BAUM_USB_VENDOR: u16 = 0x0904;

/// Cell geometry probing assumes for displays that never report it
const DM80P_TEXT_CELLS: u8 = 80;
const DM80P_STATUS_CELLS: u8 = 4;
const INKA_TEXT_CELLS: u8 = 56;

/// What the driver must do after a packet
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PacketEffect {
    /// Keys changed state
    Keys(KeyEvents),
    /// The display now has this many text cells
    Resize(u8),
    /// The display powered down
    Restart,
    /// Informational packet, nothing to do
    Status,
}

/// Wire dialect strategy
pub trait BaumProtocol<T: Transport, C: Clock> {
    fn dialect(&self) -> Dialect;

    /// Identify the display
    ///
    /// Drives `state` through probing. Gives up with
    /// [`ConstructError::NotDetected`] after the configured attempts.
    fn probe(
        &mut self,
        conn: &mut Connection<T, C>,
        params: &DriverParameters,
        state: &mut ConnectionState,
    ) -> Result<DeviceDescriptor, ConstructError>;

    /// Next complete packet, waiting at most `timeout_ms` for it to start
    fn read_packet(
        &mut self,
        conn: &mut Connection<T, C>,
        timeout_ms: u32,
    ) -> Result<Option<Packet>, TransportError>;

    /// Frame and send one unframed packet (code byte first)
    fn write_packet(&mut self, conn: &mut Connection<T, C>, packet: &[u8]) -> Result<(), DriverError>;

    /// Turn a received packet into driver work
    fn process_packet(&mut self, packet: &Packet, layout: &KeyLayout, tracker: &mut KeyTracker) -> PacketEffect;

    /// Send the whole display: status cells, then text cells
    fn write_cells(
        &mut self,
        conn: &mut Connection<T, C>,
        status: &[u8],
        text: &[u8],
    ) -> Result<(), DriverError>;

    /// Send `cells` starting at device position `offset`
    fn write_cell_range(
        &mut self,
        conn: &mut Connection<T, C>,
        offset: u8,
        cells: &[u8],
    ) -> Result<(), DriverError>;

    /// Drop partial input and return the display to its power-on state
    fn reset(&mut self, conn: &mut Connection<T, C>) -> Result<(), DriverError>;

    /// Packet lengths follow the display geometry
    fn set_geometry(&mut self, descriptor: &DeviceDescriptor);
}

/// Pick the dialect for a device
///
/// `Auto` uses HID for Baum USB devices and escape coding everywhere else.
/// The legacy dialect is never chosen automatically.
pub fn select_dialect(device: &DeviceIdentifier, selection: ProtocolSelection) -> Dialect {
    match selection {
        ProtocolSelection::Escape => Dialect::Escape,
        ProtocolSelection::Hid => Dialect::Hid,
        ProtocolSelection::Legacy => Dialect::Legacy,
        ProtocolSelection::Auto => match device {
            DeviceIdentifier::Usb {
                vendor: Some(BAUM_USB_VENDOR),
                ..
            } => Dialect::Hid,
            _ => Dialect::Escape,
        },
    }
}

/// Send a request through a dialect's framing
pub fn send_request<T, C, P>(
    protocol: &mut P,
    conn: &mut Connection<T, C>,
    request: &BaumRequest<'_>,
) -> Result<(), DriverError>
where
    T: Transport,
    C: Clock,
    P: BaumProtocol<T, C> + ?Sized,
{
    protocol.write_packet(conn, &request.encode_report()?)
}

/// Cell count named by the first run of digits in an identity
fn identity_cells(identity: &[u8]) -> Option<u8> {
    let start = identity.iter().position(u8::is_ascii_digit)?;
    let mut cells: u16 = 0;
    for digit in identity[start..].iter().take_while(|b| b.is_ascii_digit()) {
        cells = cells * 10 + u16::from(digit - b'0');
        if cells > u16::from(MAX_CELLS) {
            return None;
        }
    }
    u8::try_from(cells).ok().filter(|&n| n > 0)
}

/// What the probe has learned so far, kept across attempts
#[derive(Default)]
struct Findings {
    identity: Vec<u8, MAX_NAME_LEN>,
    fallback_cells: Option<u8>,
}

impl Findings {
    fn identified(&self) -> bool {
        !self.identity.is_empty()
    }

    fn record_identity(&mut self, text: &[u8]) {
        self.identity.clear();
        for &byte in text {
            if self.identity.push(byte).is_err() {
                debug!("identity cut at {} of {} bytes", MAX_NAME_LEN, text.len());
                break;
            }
        }
        self.fallback_cells = identity_cells(text);
    }

    fn descriptor(&self, dialect: Dialect, text: u8, generation: Generation) -> DeviceDescriptor {
        let mut descriptor = DeviceDescriptor::new(dialect, text);
        descriptor.set_name_bytes(&self.identity);
        descriptor.generation = generation;
        descriptor
    }
}

fn inferred(dialect: Dialect, name: &str, text: u8, status: u8) -> DeviceDescriptor {
    let mut descriptor = DeviceDescriptor::new(dialect, text);
    descriptor.set_name(name);
    descriptor.status_columns = status;
    descriptor.generation = Generation::Legacy;
    descriptor
}

/// Probe shared by the escape and HID dialects
///
/// Each attempt asks for the identity, serial number and cell count, then
/// reads until the attempt deadline. A reported cell count wins. Displays
/// that only send key state before identifying themselves are recognised by
/// which state they send. An identity alone settles the attempt once the
/// deadline passes.
pub fn probe_identity<T, C, P>(
    protocol: &mut P,
    conn: &mut Connection<T, C>,
    params: &DriverParameters,
    state: &mut ConnectionState,
) -> Result<DeviceDescriptor, ConstructError>
where
    T: Transport,
    C: Clock,
    P: BaumProtocol<T, C> + ?Sized,
{
    let dialect = protocol.dialect();
    *state = state.transition(ConnectionEvent::ProbeStarted);
    let mut findings = Findings::default();

    for attempt in 1..=params.probe_retries {
        if attempt > 1 {
            *state = state.transition(ConnectionEvent::AttemptExpired);
        }
        debug!("probe attempt {} of {}", attempt, params.probe_retries);

        for request in [
            BaumRequest::GetDeviceIdentity,
            BaumRequest::GetSerialNumber,
            BaumRequest::CELL_COUNT_QUERY,
        ] {
            send_request(protocol, conn, &request).map_err(|e| match e {
                DriverError::Transport(t) => ConstructError::Transport(t),
                DriverError::RestartRequired => ConstructError::Transport(TransportError::Disconnected),
                _ => ConstructError::NotDetected,
            })?;
        }

        let deadline = conn.now_ms() + u64::from(params.probe_timeout_ms);

        loop {
            let remaining = conn.remaining_ms(deadline);
            if remaining == 0 {
                break;
            }
            let Some(packet) = protocol.read_packet(conn, remaining)? else {
                continue;
            };

            let response = match BaumResponse::decode(&packet) {
                Ok(response) => response,
                Err(e) => {
                    warn!("undecodable probe reply: {:?}", e);
                    continue;
                }
            };

            match response {
                BaumResponse::CellCount(cells) if (1..=MAX_CELLS).contains(&cells) => {
                    info!("display reports {} cells", cells);
                    *state = state.transition(ConnectionEvent::Identified);
                    return Ok(findings.descriptor(dialect, cells, Generation::Current));
                }
                BaumResponse::CellCount(cells) => {
                    warn!("ignoring implausible cell count {}", cells);
                }
                BaumResponse::DeviceIdentity(text) => {
                    info!("display identity received, {} bytes", text.len());
                    findings.record_identity(text);
                }
                BaumResponse::SerialNumber(serial) => {
                    debug!("serial number {} bytes", serial.len());
                }
                BaumResponse::Switches(_) if !findings.identified() => {
                    info!("switch report before identity, assuming DM80P");
                    *state = state.transition(ConnectionEvent::Identified);
                    return Ok(inferred(dialect, models::DM80P, DM80P_TEXT_CELLS, DM80P_STATUS_CELLS));
                }
                BaumResponse::VerticalSensors(_) if !findings.identified() => {
                    info!("vertical sensors before identity, assuming Inka");
                    *state = state.transition(ConnectionEvent::Identified);
                    return Ok(inferred(dialect, models::INKA, INKA_TEXT_CELLS, 0));
                }
                other => debug!("ignoring probe reply {:?}", other),
            }
        }

        if let Some(cells) = findings.fallback_cells {
            info!("no cell count reported, using {} from identity", cells);
            *state = state.transition(ConnectionEvent::Identified);
            return Ok(findings.descriptor(dialect, cells, Generation::Legacy));
        }
    }

    warn!("no Baum display answered");
    *state = state.transition(ConnectionEvent::ProbeFailed);
    Err(ConstructError::NotDetected)
}

/// Packet handling shared by the escape and HID dialects
pub fn process_baum_packet(
    packet: &Packet,
    current_cells: u8,
    layout: &KeyLayout,
    tracker: &mut KeyTracker,
) -> PacketEffect {
    let response = match BaumResponse::decode(packet) {
        Ok(response) => response,
        Err(e) => {
            warn!("undecodable packet: {:?}", e);
            return PacketEffect::Status;
        }
    };

    if let Some(events) = keys::response_keys(&response, layout, tracker) {
        return PacketEffect::Keys(events);
    }

    match response {
        BaumResponse::CellCount(cells) if cells == current_cells => PacketEffect::Status,
        BaumResponse::CellCount(cells) if (1..=MAX_CELLS).contains(&cells) => {
            info!("cell count changed from {} to {}", current_cells, cells);
            PacketEffect::Resize(cells)
        }
        BaumResponse::CellCount(cells) => {
            warn!("ignoring implausible cell count {}", cells);
            PacketEffect::Status
        }
        BaumResponse::PowerdownSignal(reason) => {
            info!("display powered down ({:#x})", reason);
            PacketEffect::Restart
        }
        BaumResponse::ErrorCode(code) => {
            warn!("display reported error {:#x}", code);
            PacketEffect::Status
        }
        other => {
            debug!("ignoring {:?}", other);
            PacketEffect::Status
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tactus_core::keys::{KeyEvent, KeyGroup};

    #[test]
    fn test_identity_cells() {
        assert_eq!(identity_cells(b"Baum VarioPro 80"), Some(80));
        assert_eq!(identity_cells(b"Refreshabraille 18"), Some(18));
        assert_eq!(identity_cells(b"SuperVario"), None);
        assert_eq!(identity_cells(b"Model 120"), None);
        assert_eq!(identity_cells(b"Model 0"), None);
    }

    #[test]
    fn test_long_identity_is_cut() {
        let mut findings = Findings::default();
        findings.record_identity(&[b'x'; MAX_NAME_LEN + 8]);
        assert_eq!(findings.identity.len(), MAX_NAME_LEN);

        findings.record_identity(b"Baum Vario 40");
        assert_eq!(findings.identity.as_slice(), b"Baum Vario 40");
        assert_eq!(findings.fallback_cells, Some(40));
    }

    #[test]
    fn test_select_dialect() {
        let baum_usb = DeviceIdentifier::parse("usb:0904:6103").unwrap();
        let other_usb = DeviceIdentifier::parse("usb:1234:0001").unwrap();
        let serial = DeviceIdentifier::parse("serial:/dev/ttyS0").unwrap();

        assert_eq!(select_dialect(&baum_usb, ProtocolSelection::Auto), Dialect::Hid);
        assert_eq!(select_dialect(&other_usb, ProtocolSelection::Auto), Dialect::Escape);
        assert_eq!(select_dialect(&serial, ProtocolSelection::Auto), Dialect::Escape);
        assert_eq!(select_dialect(&serial, ProtocolSelection::Legacy), Dialect::Legacy);
        assert_eq!(select_dialect(&baum_usb, ProtocolSelection::Escape), Dialect::Escape);
    }

    const LAYOUT: KeyLayout = KeyLayout {
        text_columns: 40,
        status_columns: 0,
        status_routing_first: false,
    };

    #[test]
    fn test_packet_effects() {
        let mut tracker = KeyTracker::new();
        let mut effect = |bytes: &[u8]| {
            let packet = Packet::new(bytes).unwrap();
            process_baum_packet(&packet, 40, &LAYOUT, &mut tracker)
        };

        assert_eq!(effect(&[0x01, 40]), PacketEffect::Status);
        assert_eq!(effect(&[0x01, 32]), PacketEffect::Resize(32));
        assert_eq!(effect(&[0x01, 200]), PacketEffect::Status);
        assert_eq!(effect(&[0x17, 0x01]), PacketEffect::Restart);
        assert_eq!(effect(&[0x40, 0x02]), PacketEffect::Status);

        let mut expected = KeyEvents::new();
        expected.push(KeyEvent::press(KeyGroup::Navigation, 1)).unwrap();
        assert_eq!(effect(&[0x24, 0x02]), PacketEffect::Keys(expected));
    }
}
