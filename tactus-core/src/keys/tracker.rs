//! Press/release detection over bit-field key reports

use heapless::Vec;

use super::{KeyEvent, KeyGroup, KeyId, KeySet};

/// Most keys one report can describe
pub const MAX_GROUP_KEYS: usize = 256;

/// Events produced by one report
pub type KeyEvents = Vec<KeyEvent, MAX_GROUP_KEYS>;

/// How source bit positions map to key numbers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Scaling {
    /// Bit `i` is key `base + i`
    #[default]
    Direct,
    /// Bit `i` of `count` is key `base + i * 255 / (count - 1)`
    ///
    /// Used for sensor strips whose length varies between models so the
    /// host sees positions on one 0..=255 scale.
    Scaled,
}

impl Scaling {
    fn map(self, base: u8, index: usize, count: usize) -> Option<u8> {
        let offset = match self {
            Scaling::Direct => index,
            Scaling::Scaled if count > 1 => index * 255 / (count - 1),
            Scaling::Scaled => 0,
        };
        u8::try_from(base as usize + offset).ok()
    }
}

/// Current pressed state of every key group
#[derive(Debug, Clone, Default)]
pub struct KeyTracker {
    pressed: [KeySet; KeyGroup::COUNT],
}

impl KeyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compare a report against the stored state
    ///
    /// `new_bits` holds `count` key bits starting at bit `source_offset`,
    /// least significant bit first. Releases are returned in discovery
    /// order, followed by presses in reverse discovery order, so a host
    /// never sees a chord grow after one of its keys went up.
    pub fn update_group(
        &mut self,
        group: KeyGroup,
        new_bits: &[u8],
        source_offset: usize,
        base: u8,
        count: usize,
        scaling: Scaling,
    ) -> KeyEvents {
        let mut events = KeyEvents::new();
        let mut presses: Vec<u8, MAX_GROUP_KEYS> = Vec::new();
        let state = &mut self.pressed[group.index()];

        for index in 0..count.min(MAX_GROUP_KEYS) {
            let bit = source_offset + index;
            let Some(&byte) = new_bits.get(bit / 8) else {
                break;
            };
            let Some(number) = scaling.map(base, index, count) else {
                break;
            };

            let down = byte & (1 << (bit % 8)) != 0;
            match (state.contains(number), down) {
                (true, false) => {
                    state.remove(number);
                    let _ = events.push(KeyEvent::release(group, number));
                }
                (false, true) => {
                    state.insert(number);
                    let _ = presses.push(number);
                }
                _ => {}
            }
        }

        for &number in presses.iter().rev() {
            let _ = events.push(KeyEvent::press(group, number));
        }
        events
    }

    /// Set or clear one key, as reported by single-key packets
    pub fn update_key(&mut self, key: KeyId, pressed: bool) -> Option<KeyEvent> {
        let state = &mut self.pressed[key.group.index()];
        match (state.contains(key.number), pressed) {
            (false, true) => {
                state.insert(key.number);
                Some(KeyEvent { key, pressed })
            }
            (true, false) => {
                state.remove(key.number);
                Some(KeyEvent { key, pressed })
            }
            _ => None,
        }
    }

    /// Release every key of `group` numbered `limit` or above
    ///
    /// Called when the group shrinks (the display reported fewer cells).
    pub fn resize_group(&mut self, group: KeyGroup, limit: usize) -> KeyEvents {
        let mut events = KeyEvents::new();
        let state = &mut self.pressed[group.index()];
        let gone: Vec<u8, MAX_GROUP_KEYS> = state.iter().filter(|&n| n as usize >= limit).collect();
        for number in gone {
            state.remove(number);
            let _ = events.push(KeyEvent::release(group, number));
        }
        events
    }

    /// Release everything without reporting
    pub fn reset(&mut self) {
        self.pressed.iter_mut().for_each(KeySet::clear);
    }

    pub fn pressed(&self, group: KeyGroup) -> &KeySet {
        &self.pressed[group.index()]
    }

    pub fn any_pressed(&self) -> bool {
        self.pressed.iter().any(|set| !set.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_press_then_release() {
        let mut tracker = KeyTracker::new();
        let events = tracker.update_group(KeyGroup::Navigation, &[0b0000_0101], 0, 0, 6, Scaling::Direct);
        // Presses come out in reverse discovery order
        assert_eq!(
            events.as_slice(),
            &[
                KeyEvent::press(KeyGroup::Navigation, 2),
                KeyEvent::press(KeyGroup::Navigation, 0),
            ]
        );

        let events = tracker.update_group(KeyGroup::Navigation, &[0b0000_0100], 0, 0, 6, Scaling::Direct);
        assert_eq!(events.as_slice(), &[KeyEvent::release(KeyGroup::Navigation, 0)]);
        assert!(tracker.pressed(KeyGroup::Navigation).contains(2));
    }

    #[test]
    fn test_releases_precede_presses() {
        let mut tracker = KeyTracker::new();
        tracker.update_group(KeyGroup::Routing, &[0b0000_0010], 0, 0, 8, Scaling::Direct);
        let events = tracker.update_group(KeyGroup::Routing, &[0b0000_0001], 0, 0, 8, Scaling::Direct);
        assert_eq!(
            events.as_slice(),
            &[
                KeyEvent::release(KeyGroup::Routing, 1),
                KeyEvent::press(KeyGroup::Routing, 0),
            ]
        );
    }

    #[test]
    fn test_base_and_offset() {
        let mut tracker = KeyTracker::new();
        // Two-byte report, keys start at bit 4, numbered from 16
        let events = tracker.update_group(KeyGroup::Navigation, &[0x10, 0x01], 4, 16, 10, Scaling::Direct);
        assert_eq!(
            events.as_slice(),
            &[
                KeyEvent::press(KeyGroup::Navigation, 20),
                KeyEvent::press(KeyGroup::Navigation, 16),
            ]
        );
    }

    #[test]
    fn test_scaled_group_spans_full_range() {
        let mut tracker = KeyTracker::new();
        let events = tracker.update_group(KeyGroup::VerticalLeft, &[0b1001], 0, 0, 4, Scaling::Scaled);
        assert_eq!(
            events.as_slice(),
            &[
                KeyEvent::press(KeyGroup::VerticalLeft, 255),
                KeyEvent::press(KeyGroup::VerticalLeft, 0),
            ]
        );
    }

    #[test]
    fn test_unchanged_report_is_silent() {
        let mut tracker = KeyTracker::new();
        tracker.update_group(KeyGroup::Navigation, &[0xFF], 0, 0, 8, Scaling::Direct);
        let events = tracker.update_group(KeyGroup::Navigation, &[0xFF], 0, 0, 8, Scaling::Direct);
        assert!(events.is_empty());
    }

    #[test]
    fn test_single_key_updates() {
        let mut tracker = KeyTracker::new();
        let key = KeyId::new(KeyGroup::HorizontalSensors, 7);
        assert_eq!(tracker.update_key(key, true), Some(KeyEvent { key, pressed: true }));
        assert_eq!(tracker.update_key(key, true), None);
        assert_eq!(tracker.update_key(key, false), Some(KeyEvent { key, pressed: false }));
    }

    #[test]
    fn test_resize_releases_vanished_keys() {
        let mut tracker = KeyTracker::new();
        tracker.update_group(KeyGroup::Routing, &[0, 0, 0, 0, 0x81], 0, 0, 40, Scaling::Direct);
        let events = tracker.resize_group(KeyGroup::Routing, 36);
        assert_eq!(events.as_slice(), &[KeyEvent::release(KeyGroup::Routing, 39)]);
        assert!(tracker.pressed(KeyGroup::Routing).contains(32));

        tracker.reset();
        assert!(!tracker.any_pressed());
    }
}
