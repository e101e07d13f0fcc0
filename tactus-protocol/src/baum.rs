//! Baum wire format
//!
//! Request and response codes, the response length table, typed decoding of
//! responses and encoding of requests. The same codes travel over the escape
//! framer (serial, Bluetooth) and as HID reports (USB).

use heapless::Vec;

use crate::escape::{encode_escaped, MAX_ENCODED_SIZE};
use crate::packet::{FrameError, Packet, PacketLengths, MAX_PACKET_SIZE};

// Requests: host → display
pub const REQ_DISPLAY_DATA: u8 = 0x01;
pub const REQ_GET_KEYS: u8 = 0x08;
pub const REQ_SET_MODE: u8 = 0x12;
pub const REQ_SET_PROTOCOL_STATE: u8 = 0x15;
pub const REQ_GET_DEVICE_IDENTITY: u8 = 0x84;
pub const REQ_GET_SERIAL_NUMBER: u8 = 0x8A;
pub const REQ_GET_BLUETOOTH_NAME: u8 = 0x8C;

// Responses: display → host
pub const RSP_CELL_COUNT: u8 = 0x01;
pub const RSP_VERSION_NUMBER: u8 = 0x05;
pub const RSP_MODE_SETTING: u8 = 0x11;
pub const RSP_COMMUNICATION_CHANNEL: u8 = 0x16;
pub const RSP_POWERDOWN_SIGNAL: u8 = 0x17;
pub const RSP_HORIZONTAL_SENSORS: u8 = 0x20;
pub const RSP_VERTICAL_SENSORS: u8 = 0x21;
pub const RSP_ROUTING_KEYS: u8 = 0x22;
pub const RSP_SWITCHES: u8 = 0x23;
pub const RSP_TOP_KEYS: u8 = 0x24;
pub const RSP_HORIZONTAL_SENSOR: u8 = 0x25;
pub const RSP_VERTICAL_SENSOR: u8 = 0x26;
pub const RSP_ROUTING_KEY: u8 = 0x27;
pub const RSP_FRONT_KEYS6: u8 = 0x28;
pub const RSP_BACK_KEYS6: u8 = 0x29;
pub const RSP_COMMAND_KEYS: u8 = 0x2B;
pub const RSP_FRONT_KEYS10: u8 = 0x2C;
pub const RSP_BACK_KEYS10: u8 = 0x2D;
pub const RSP_ENTRY_KEYS: u8 = 0x33;
pub const RSP_JOYSTICK: u8 = 0x34;
pub const RSP_ERROR_CODE: u8 = 0x40;
pub const RSP_INFO_BLOCK: u8 = 0x42;
pub const RSP_DEVICE_IDENTITY: u8 = 0x84;
pub const RSP_SERIAL_NUMBER: u8 = 0x8A;
pub const RSP_BLUETOOTH_NAME: u8 = 0x8C;

/// Largest cell count any Baum display reports
pub const MAX_CELLS: u8 = 84;

/// Nominal identity length (characters)
pub const IDENTITY_LENGTH: usize = 16;

/// Serial number length (characters)
pub const SERIAL_NUMBER_LENGTH: usize = 8;

/// Bluetooth name length (characters)
pub const BLUETOOTH_NAME_LENGTH: usize = 14;

/// Identities that overrun the nominal 16 characters
const LONG_IDENTITIES: [(&[u8; IDENTITY_LENGTH], usize); 2] =
    [(b"Refreshabraille ", 18), (b"Conny (NLS eRead", 19)];

/// Bytes needed for one bit per key
pub const fn key_bytes(keys: u8) -> usize {
    (keys as usize).div_ceil(8)
}

/// Response length table for one connection
///
/// Sensor and routing-key packets depend on the cell count; some models send
/// a fixed-size routing-key packet regardless.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BaumLengths {
    /// Current cell count (0 before the device has reported it)
    pub cell_count: u8,
    /// Fixed routing-key payload size, when the model uses one
    pub routing_key_bytes: Option<u8>,
}

impl BaumLengths {
    fn cells(&self) -> u8 {
        if self.cell_count == 0 {
            MAX_CELLS
        } else {
            self.cell_count
        }
    }
}

impl PacketLengths for BaumLengths {
    fn expected_length(&self, partial: &[u8]) -> Option<usize> {
        let length = match *partial.first()? {
            RSP_CELL_COUNT
            | RSP_VERSION_NUMBER
            | RSP_COMMUNICATION_CHANNEL
            | RSP_POWERDOWN_SIGNAL
            | RSP_VERTICAL_SENSORS
            | RSP_SWITCHES
            | RSP_TOP_KEYS
            | RSP_HORIZONTAL_SENSOR
            | RSP_VERTICAL_SENSOR
            | RSP_ROUTING_KEY
            | RSP_FRONT_KEYS6
            | RSP_BACK_KEYS6
            | RSP_COMMAND_KEYS
            | RSP_JOYSTICK
            | RSP_ERROR_CODE => 2,
            RSP_MODE_SETTING | RSP_FRONT_KEYS10 | RSP_BACK_KEYS10 | RSP_ENTRY_KEYS => 3,
            RSP_HORIZONTAL_SENSORS => 1 + key_bytes(self.cells()),
            RSP_ROUTING_KEYS => match self.routing_key_bytes {
                Some(bytes) => 1 + bytes as usize,
                None => 1 + key_bytes(self.cells()),
            },
            RSP_INFO_BLOCK => match partial.get(1) {
                Some(&n) => 2 + n as usize,
                None => 2,
            },
            RSP_DEVICE_IDENTITY => identity_length(partial),
            RSP_SERIAL_NUMBER => 1 + SERIAL_NUMBER_LENGTH,
            RSP_BLUETOOTH_NAME => 1 + BLUETOOTH_NAME_LENGTH,
            _ => return None,
        };
        Some(length)
    }
}

fn identity_length(partial: &[u8]) -> usize {
    let nominal = 1 + IDENTITY_LENGTH;
    let Some(text) = partial.get(1..nominal) else {
        return nominal;
    };
    LONG_IDENTITIES
        .iter()
        .find(|(prefix, _)| text == prefix.as_slice())
        .map_or(nominal, |&(_, chars)| 1 + chars)
}

/// Drop trailing blanks and NULs from a fixed-width text field
pub fn trim_text(text: &[u8]) -> &[u8] {
    let end = text
        .iter()
        .rposition(|&b| b != b' ' && b != 0)
        .map_or(0, |i| i + 1);
    &text[..end]
}

/// Decoded display-originated packet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BaumResponse<'a> {
    CellCount(u8),
    VersionNumber(u8),
    ModeSetting { mode: u8, value: u8 },
    CommunicationChannel(u8),
    PowerdownSignal(u8),
    /// One bit per horizontal sensor
    HorizontalSensors(&'a [u8]),
    /// Left sensors in the low nibble, right sensors in the high nibble
    VerticalSensors(u8),
    /// One bit per routing key
    RoutingKeys(&'a [u8]),
    Switches(u8),
    TopKeys(u8),
    /// 0 = released, otherwise sensor number + 1
    HorizontalSensor(u8),
    /// Bit 6 set for the right side; low bits as for [`Self::HorizontalSensor`]
    VerticalSensor { right: bool, number: u8 },
    /// 0 = released, otherwise key number + 1
    RoutingKey(u8),
    FrontKeys6(u8),
    BackKeys6(u8),
    CommandKeys(u8),
    FrontKeys10(u16),
    BackKeys10(u16),
    EntryKeys(u16),
    Joystick(u8),
    ErrorCode(u8),
    InfoBlock(&'a [u8]),
    /// Identity text, trailing blanks removed
    DeviceIdentity(&'a [u8]),
    SerialNumber(&'a [u8]),
    BluetoothName(&'a [u8]),
}

impl<'a> BaumResponse<'a> {
    /// Decode a complete packet
    pub fn decode(packet: &'a Packet) -> Result<Self, FrameError> {
        let payload = packet.payload();
        let byte = |index: usize| payload.get(index).copied().ok_or(FrameError::Truncated);
        let word = |index: usize| -> Result<u16, FrameError> {
            Ok(u16::from_le_bytes([byte(index)?, byte(index + 1)?]))
        };

        let response = match packet.code() {
            RSP_CELL_COUNT => BaumResponse::CellCount(byte(0)?),
            RSP_VERSION_NUMBER => BaumResponse::VersionNumber(byte(0)?),
            RSP_MODE_SETTING => BaumResponse::ModeSetting {
                mode: byte(0)?,
                value: byte(1)?,
            },
            RSP_COMMUNICATION_CHANNEL => BaumResponse::CommunicationChannel(byte(0)?),
            RSP_POWERDOWN_SIGNAL => BaumResponse::PowerdownSignal(byte(0)?),
            RSP_HORIZONTAL_SENSORS => BaumResponse::HorizontalSensors(payload),
            RSP_VERTICAL_SENSORS => BaumResponse::VerticalSensors(byte(0)?),
            RSP_ROUTING_KEYS => BaumResponse::RoutingKeys(payload),
            RSP_SWITCHES => BaumResponse::Switches(byte(0)?),
            RSP_TOP_KEYS => BaumResponse::TopKeys(byte(0)?),
            RSP_HORIZONTAL_SENSOR => BaumResponse::HorizontalSensor(byte(0)?),
            RSP_VERTICAL_SENSOR => {
                let value = byte(0)?;
                BaumResponse::VerticalSensor {
                    right: value & 0x40 != 0,
                    number: value & 0x3F,
                }
            }
            RSP_ROUTING_KEY => BaumResponse::RoutingKey(byte(0)?),
            RSP_FRONT_KEYS6 => BaumResponse::FrontKeys6(byte(0)?),
            RSP_BACK_KEYS6 => BaumResponse::BackKeys6(byte(0)?),
            RSP_COMMAND_KEYS => BaumResponse::CommandKeys(byte(0)?),
            RSP_FRONT_KEYS10 => BaumResponse::FrontKeys10(word(0)?),
            RSP_BACK_KEYS10 => BaumResponse::BackKeys10(word(0)?),
            RSP_ENTRY_KEYS => BaumResponse::EntryKeys(word(0)?),
            RSP_JOYSTICK => BaumResponse::Joystick(byte(0)?),
            RSP_ERROR_CODE => BaumResponse::ErrorCode(byte(0)?),
            RSP_INFO_BLOCK => BaumResponse::InfoBlock(payload.get(1..).unwrap_or(&[])),
            RSP_DEVICE_IDENTITY => BaumResponse::DeviceIdentity(trim_text(payload)),
            RSP_SERIAL_NUMBER => BaumResponse::SerialNumber(trim_text(payload)),
            RSP_BLUETOOTH_NAME => BaumResponse::BluetoothName(trim_text(payload)),
            code => return Err(FrameError::UnknownCode(code)),
        };
        Ok(response)
    }
}

/// Host-originated packet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BaumRequest<'a> {
    /// Whole display contents; empty asks for the cell count
    DisplayData(&'a [u8]),
    /// Cells starting at `offset`
    DisplayDataRange { offset: u8, cells: &'a [u8] },
    GetKeys,
    SetMode { mode: u8, value: u8 },
    SetProtocolState(u8),
    GetDeviceIdentity,
    GetSerialNumber,
    GetBluetoothName,
}

impl<'a> BaumRequest<'a> {
    /// Empty display write, answered with a cell count
    pub const CELL_COUNT_QUERY: BaumRequest<'static> = BaumRequest::DisplayData(&[]);

    /// Request code
    pub fn code(&self) -> u8 {
        match self {
            BaumRequest::DisplayData(_) | BaumRequest::DisplayDataRange { .. } => REQ_DISPLAY_DATA,
            BaumRequest::GetKeys => REQ_GET_KEYS,
            BaumRequest::SetMode { .. } => REQ_SET_MODE,
            BaumRequest::SetProtocolState(_) => REQ_SET_PROTOCOL_STATE,
            BaumRequest::GetDeviceIdentity => REQ_GET_DEVICE_IDENTITY,
            BaumRequest::GetSerialNumber => REQ_GET_SERIAL_NUMBER,
            BaumRequest::GetBluetoothName => REQ_GET_BLUETOOTH_NAME,
        }
    }

    /// Request payload (code excluded)
    pub fn payload(&self) -> Result<Vec<u8, MAX_PACKET_SIZE>, FrameError> {
        let mut payload = Vec::new();
        match self {
            BaumRequest::DisplayData(cells) => payload
                .extend_from_slice(cells)
                .map_err(|_| FrameError::PayloadTooLarge)?,
            BaumRequest::DisplayDataRange { offset, cells } => {
                let count = u8::try_from(cells.len()).map_err(|_| FrameError::PayloadTooLarge)?;
                payload
                    .extend_from_slice(&[*offset, count])
                    .map_err(|_| FrameError::PayloadTooLarge)?;
                payload
                    .extend_from_slice(cells)
                    .map_err(|_| FrameError::PayloadTooLarge)?;
            }
            BaumRequest::SetMode { mode, value } => payload
                .extend_from_slice(&[*mode, *value])
                .map_err(|_| FrameError::PayloadTooLarge)?,
            BaumRequest::SetProtocolState(state) => payload
                .push(*state)
                .map_err(|_| FrameError::PayloadTooLarge)?,
            BaumRequest::GetKeys
            | BaumRequest::GetDeviceIdentity
            | BaumRequest::GetSerialNumber
            | BaumRequest::GetBluetoothName => {}
        }
        Ok(payload)
    }

    /// Escape-coded bytes for serial and Bluetooth links
    pub fn encode(&self) -> Result<Vec<u8, MAX_ENCODED_SIZE>, FrameError> {
        encode_escaped(self.code(), &self.payload()?)
    }

    /// Output report for USB HID links
    pub fn encode_report(&self) -> Result<Vec<u8, MAX_PACKET_SIZE>, FrameError> {
        let payload = self.payload()?;
        let mut report = Vec::new();
        report
            .push(self.code())
            .map_err(|_| FrameError::PayloadTooLarge)?;
        report
            .extend_from_slice(&payload)
            .map_err(|_| FrameError::PayloadTooLarge)?;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use crate::escape::{EscapeParser, ESCAPE};

    fn lengths(cells: u8) -> BaumLengths {
        BaumLengths {
            cell_count: cells,
            routing_key_bytes: None,
        }
    }

    fn parse(bytes: &[u8], lengths: &BaumLengths) -> Packet {
        let mut parser = EscapeParser::new();
        bytes
            .iter()
            .find_map(|&b| parser.feed(b, lengths).ok().flatten())
            .unwrap()
    }

    #[test]
    fn test_fixed_lengths() {
        let table = lengths(40);
        assert_eq!(table.expected_length(&[RSP_CELL_COUNT]), Some(2));
        assert_eq!(table.expected_length(&[RSP_ENTRY_KEYS]), Some(3));
        assert_eq!(table.expected_length(&[RSP_SERIAL_NUMBER]), Some(9));
        assert_eq!(table.expected_length(&[RSP_BLUETOOTH_NAME]), Some(15));
        assert_eq!(table.expected_length(&[0x99]), None);
    }

    #[test]
    fn test_key_lengths_follow_cell_count() {
        assert_eq!(lengths(40).expected_length(&[RSP_ROUTING_KEYS]), Some(6));
        assert_eq!(lengths(18).expected_length(&[RSP_HORIZONTAL_SENSORS]), Some(4));

        let fixed = BaumLengths {
            cell_count: 40,
            routing_key_bytes: Some(10),
        };
        assert_eq!(fixed.expected_length(&[RSP_ROUTING_KEYS]), Some(11));
    }

    #[test]
    fn test_info_block_length() {
        let table = lengths(40);
        assert_eq!(table.expected_length(&[RSP_INFO_BLOCK]), Some(2));
        assert_eq!(table.expected_length(&[RSP_INFO_BLOCK, 4]), Some(6));
    }

    #[test]
    fn test_long_identity_is_collected() {
        let mut bytes = std::vec![ESCAPE, RSP_DEVICE_IDENTITY];
        bytes.extend_from_slice(b"Refreshabraille 18");
        bytes.extend_from_slice(&[ESCAPE, RSP_CELL_COUNT, 18]);

        let packet = parse(&bytes, &lengths(0));
        assert_eq!(packet.len(), 19);
        assert_eq!(
            BaumResponse::decode(&packet),
            Ok(BaumResponse::DeviceIdentity(b"Refreshabraille 18"))
        );
    }

    #[test]
    fn test_conny_identity_length() {
        let mut partial = std::vec![RSP_DEVICE_IDENTITY];
        partial.extend_from_slice(b"Conny (NLS eRead");
        assert_eq!(lengths(0).expected_length(&partial), Some(20));
    }

    #[test]
    fn test_decode_identity_trims_padding() {
        let mut bytes = std::vec![RSP_DEVICE_IDENTITY];
        bytes.extend_from_slice(b"Baum VarioPro 40");
        let packet = Packet::new(&bytes).unwrap();
        assert_eq!(
            BaumResponse::decode(&packet),
            Ok(BaumResponse::DeviceIdentity(b"Baum VarioPro 40"))
        );

        let mut bytes = std::vec![RSP_SERIAL_NUMBER];
        bytes.extend_from_slice(b"1234\0\0\0\0");
        let packet = Packet::new(&bytes).unwrap();
        assert_eq!(
            BaumResponse::decode(&packet),
            Ok(BaumResponse::SerialNumber(b"1234"))
        );
    }

    #[test]
    fn test_decode_keys() {
        let packet = Packet::new(&[RSP_ENTRY_KEYS, 0x01, 0x80]).unwrap();
        assert_eq!(
            BaumResponse::decode(&packet),
            Ok(BaumResponse::EntryKeys(0x8001))
        );

        let packet = Packet::new(&[RSP_VERTICAL_SENSOR, 0x43]).unwrap();
        assert_eq!(
            BaumResponse::decode(&packet),
            Ok(BaumResponse::VerticalSensor {
                right: true,
                number: 3
            })
        );
    }

    #[test]
    fn test_decode_truncated() {
        let packet = Packet::new(&[RSP_FRONT_KEYS10, 0x01]).unwrap();
        assert_eq!(BaumResponse::decode(&packet), Err(FrameError::Truncated));
    }

    #[test]
    fn test_encode_requests() {
        let query = BaumRequest::CELL_COUNT_QUERY.encode().unwrap();
        assert_eq!(query.as_slice(), &[ESCAPE, REQ_DISPLAY_DATA]);

        let identity = BaumRequest::GetDeviceIdentity.encode().unwrap();
        assert_eq!(identity.as_slice(), &[ESCAPE, REQ_GET_DEVICE_IDENTITY]);

        let range = BaumRequest::DisplayDataRange {
            offset: 4,
            cells: &[0x1B, 0x01],
        };
        assert_eq!(
            range.encode().unwrap().as_slice(),
            &[ESCAPE, REQ_DISPLAY_DATA, 4, 2, ESCAPE, ESCAPE, 0x01]
        );
        assert_eq!(
            range.encode_report().unwrap().as_slice(),
            &[REQ_DISPLAY_DATA, 4, 2, 0x1B, 0x01]
        );
    }
}
