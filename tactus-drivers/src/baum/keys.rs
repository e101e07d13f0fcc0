//! Baum key and sensor packets to tracker updates
//!
//! All navigation keys share one group. Each packet family owns a fixed
//! window of key numbers:
//!
//! | Source        | Keys      |
//! |---------------|-----------|
//! | top keys      | 0..6      |
//! | switches      | 8..16     |
//! | front keys    | 16..26    |
//! | back keys     | 26..36    |
//! | command keys  | 36..43    |
//! | entry keys    | 44..60    |
//! | joystick      | 60..65    |

use tactus_core::descriptor::DeviceDescriptor;
use tactus_core::keys::{KeyEvents, KeyGroup, KeyId, KeyTracker, Scaling};
use tactus_protocol::baum::{BaumResponse, MAX_CELLS};
use tactus_protocol::legacy::LegacyEvent;

pub const TOP_BASE: u8 = 0;
pub const TOP_COUNT: usize = 6;
pub const SWITCH_BASE: u8 = 8;
pub const SWITCH_COUNT: usize = 8;
pub const FRONT_BASE: u8 = 16;
pub const BACK_BASE: u8 = 26;
pub const COMMAND_BASE: u8 = 36;
pub const COMMAND_COUNT: usize = 7;
pub const ENTRY_BASE: u8 = 44;
pub const ENTRY_COUNT: usize = 16;
pub const JOYSTICK_BASE: u8 = 60;
pub const JOYSTICK_COUNT: usize = 5;

/// Sensors on each vertical strip
pub const VERTICAL_SENSOR_COUNT: usize = 4;

/// Bits in the widest single-key bitmap
const SINGLE_KEY_BITS: usize = 256;

/// Display geometry as seen by the key decoder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyLayout {
    pub text_columns: u8,
    pub status_columns: u8,
    /// Routing-key packets carry the status keys ahead of the text keys
    pub status_routing_first: bool,
}

impl KeyLayout {
    pub fn new(descriptor: &DeviceDescriptor) -> Self {
        Self {
            text_columns: descriptor.text_columns,
            status_columns: descriptor.status_columns,
            status_routing_first: descriptor.quirks.routing_key_bytes.is_some()
                && descriptor.status_columns > 0,
        }
    }
}

/// Bitmap of a single-key packet: key `number - 1` set, or nothing for 0
fn single_key(number: u8) -> [u8; SINGLE_KEY_BITS / 8] {
    let mut bits = [0u8; SINGLE_KEY_BITS / 8];
    if number > 0 {
        let index = usize::from(number - 1);
        bits[index / 8] |= 1 << (index % 8);
    }
    bits
}

fn navigation(tracker: &mut KeyTracker, bits: &[u8], base: u8, count: usize) -> KeyEvents {
    tracker.update_group(KeyGroup::Navigation, bits, 0, base, count, Scaling::Direct)
}

fn routing(tracker: &mut KeyTracker, bits: &[u8], layout: &KeyLayout) -> KeyEvents {
    let text = usize::from(layout.text_columns);
    let status = usize::from(layout.status_columns);

    if !layout.status_routing_first {
        return tracker.update_group(KeyGroup::Routing, bits, 0, 0, text, Scaling::Direct);
    }

    let mut events =
        tracker.update_group(KeyGroup::StatusRouting, bits, 0, 0, status, Scaling::Direct);
    for event in tracker.update_group(KeyGroup::Routing, bits, status, 0, text, Scaling::Direct) {
        if events.push(event).is_err() {
            warn!("routing events overflow");
            break;
        }
    }
    events
}

fn vertical(tracker: &mut KeyTracker, right: bool, bits: &[u8], offset: usize, count: usize) -> KeyEvents {
    let group = if right {
        KeyGroup::VerticalRight
    } else {
        KeyGroup::VerticalLeft
    };
    tracker.update_group(group, bits, offset, 0, count, Scaling::Scaled)
}

/// Key events carried by a decoded response
///
/// Returns `None` for responses that are not key packets.
pub fn response_keys(
    response: &BaumResponse<'_>,
    layout: &KeyLayout,
    tracker: &mut KeyTracker,
) -> Option<KeyEvents> {
    let text = usize::from(layout.text_columns.min(MAX_CELLS));

    let events = match *response {
        BaumResponse::TopKeys(bits) => navigation(tracker, &[bits], TOP_BASE, TOP_COUNT),
        BaumResponse::Switches(bits) => navigation(tracker, &[bits], SWITCH_BASE, SWITCH_COUNT),
        BaumResponse::FrontKeys6(bits) => navigation(tracker, &[bits], FRONT_BASE, 6),
        BaumResponse::BackKeys6(bits) => navigation(tracker, &[bits], BACK_BASE, 6),
        BaumResponse::FrontKeys10(bits) => navigation(tracker, &bits.to_le_bytes(), FRONT_BASE, 10),
        BaumResponse::BackKeys10(bits) => navigation(tracker, &bits.to_le_bytes(), BACK_BASE, 10),
        BaumResponse::CommandKeys(bits) => {
            navigation(tracker, &[bits], COMMAND_BASE, COMMAND_COUNT)
        }
        BaumResponse::EntryKeys(bits) => {
            navigation(tracker, &bits.to_le_bytes(), ENTRY_BASE, ENTRY_COUNT)
        }
        BaumResponse::Joystick(bits) => {
            navigation(tracker, &[bits], JOYSTICK_BASE, JOYSTICK_COUNT)
        }
        BaumResponse::RoutingKeys(bits) => routing(tracker, bits, layout),
        BaumResponse::RoutingKey(number) => {
            tracker.update_group(KeyGroup::Routing, &single_key(number), 0, 0, text, Scaling::Direct)
        }
        BaumResponse::HorizontalSensors(bits) => tracker.update_group(
            KeyGroup::HorizontalSensors,
            bits,
            0,
            0,
            text,
            Scaling::Direct,
        ),
        BaumResponse::HorizontalSensor(number) => tracker.update_group(
            KeyGroup::HorizontalSensors,
            &single_key(number),
            0,
            0,
            text,
            Scaling::Direct,
        ),
        BaumResponse::VerticalSensors(bits) => {
            let mut events = vertical(tracker, false, &[bits], 0, VERTICAL_SENSOR_COUNT);
            for event in vertical(tracker, true, &[bits], 4, VERTICAL_SENSOR_COUNT) {
                let _ = events.push(event);
            }
            events
        }
        BaumResponse::VerticalSensor { right, number } => {
            vertical(tracker, right, &single_key(number), 0, VERTICAL_SENSOR_COUNT)
        }
        _ => return None,
    };
    Some(events)
}

/// Key event carried by a legacy packet
pub fn legacy_keys(event: &LegacyEvent, layout: &KeyLayout, tracker: &mut KeyTracker) -> KeyEvents {
    let mut events = KeyEvents::new();
    let key = match *event {
        LegacyEvent::TopKey { key, pressed } => {
            Some((KeyId::new(KeyGroup::Navigation, TOP_BASE + key), pressed))
        }
        LegacyEvent::RoutingKey { key, pressed } if key < layout.text_columns => {
            Some((KeyId::new(KeyGroup::Routing, key), pressed))
        }
        LegacyEvent::RoutingKey { key, pressed } => {
            let status = key - layout.text_columns;
            (status < layout.status_columns)
                .then(|| (KeyId::new(KeyGroup::StatusRouting, status), pressed))
        }
        LegacyEvent::Identity(_) | LegacyEvent::Ack => None,
    };

    if let Some(event) = key.and_then(|(key, pressed)| tracker.update_key(key, pressed)) {
        let _ = events.push(event);
    }
    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use tactus_core::keys::KeyEvent;

    const LAYOUT: KeyLayout = KeyLayout {
        text_columns: 40,
        status_columns: 0,
        status_routing_first: false,
    };

    #[test]
    fn test_top_keys() {
        let mut tracker = KeyTracker::new();
        let events = response_keys(&BaumResponse::TopKeys(0b0000_0101), &LAYOUT, &mut tracker).unwrap();
        assert_eq!(
            events.as_slice(),
            &[
                KeyEvent::press(KeyGroup::Navigation, 2),
                KeyEvent::press(KeyGroup::Navigation, 0)
            ]
        );
    }

    #[test]
    fn test_entry_keys_use_their_window() {
        let mut tracker = KeyTracker::new();
        let events = response_keys(&BaumResponse::EntryKeys(0x8000), &LAYOUT, &mut tracker).unwrap();
        assert_eq!(events.as_slice(), &[KeyEvent::press(KeyGroup::Navigation, 59)]);
    }

    #[test]
    fn test_single_routing_key_press_and_release() {
        let mut tracker = KeyTracker::new();
        let pressed = response_keys(&BaumResponse::RoutingKey(5), &LAYOUT, &mut tracker).unwrap();
        assert_eq!(pressed.as_slice(), &[KeyEvent::press(KeyGroup::Routing, 4)]);

        let released = response_keys(&BaumResponse::RoutingKey(0), &LAYOUT, &mut tracker).unwrap();
        assert_eq!(released.as_slice(), &[KeyEvent::release(KeyGroup::Routing, 4)]);
    }

    #[test]
    fn test_status_keys_lead_routing_packet() {
        let layout = KeyLayout {
            text_columns: 80,
            status_columns: 4,
            status_routing_first: true,
        };
        let mut tracker = KeyTracker::new();
        let mut bits = [0u8; 11];
        bits[0] = 0b0000_0010; // status key 1
        bits[0] |= 0b0010_0000; // text key 1

        let events = response_keys(&BaumResponse::RoutingKeys(&bits), &layout, &mut tracker).unwrap();
        assert_eq!(
            events.as_slice(),
            &[
                KeyEvent::press(KeyGroup::StatusRouting, 1),
                KeyEvent::press(KeyGroup::Routing, 1)
            ]
        );
    }

    #[test]
    fn test_vertical_sensors_are_scaled() {
        let mut tracker = KeyTracker::new();
        let events = response_keys(&BaumResponse::VerticalSensors(0x81), &LAYOUT, &mut tracker).unwrap();
        assert_eq!(
            events.as_slice(),
            &[
                KeyEvent::press(KeyGroup::VerticalLeft, 0),
                KeyEvent::press(KeyGroup::VerticalRight, 255)
            ]
        );
    }

    #[test]
    fn test_status_packets_are_not_keys() {
        let mut tracker = KeyTracker::new();
        assert!(response_keys(&BaumResponse::CellCount(40), &LAYOUT, &mut tracker).is_none());
    }

    #[test]
    fn test_legacy_routing_past_text_is_status() {
        let layout = KeyLayout {
            text_columns: 80,
            status_columns: 4,
            status_routing_first: false,
        };
        let mut tracker = KeyTracker::new();
        let events = legacy_keys(&LegacyEvent::RoutingKey { key: 81, pressed: true }, &layout, &mut tracker);
        assert_eq!(events.as_slice(), &[KeyEvent::press(KeyGroup::StatusRouting, 1)]);

        let ignored = legacy_keys(&LegacyEvent::RoutingKey { key: 90, pressed: true }, &layout, &mut tracker);
        assert!(ignored.is_empty());
    }
}
