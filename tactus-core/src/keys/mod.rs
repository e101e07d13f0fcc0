//! Key and sensor state
//!
//! Displays report key state as bit fields, one packet per key group. The
//! tracker compares each report with what it last saw and turns the
//! difference into press and release events.

pub mod tracker;

pub use tracker::{KeyEvents, KeyTracker, Scaling, MAX_GROUP_KEYS};

/// Independent sets of keys on a display
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum KeyGroup {
    /// Function, navigation and entry keys
    Navigation,
    /// Cursor routing keys above the text cells
    Routing,
    /// Routing keys above the status cells
    StatusRouting,
    /// Horizontal sensor bar
    HorizontalSensors,
    /// Vertical sensors left of the cells
    VerticalLeft,
    /// Vertical sensors right of the cells
    VerticalRight,
}

impl KeyGroup {
    pub const COUNT: usize = 6;

    pub const ALL: [KeyGroup; Self::COUNT] = [
        KeyGroup::Navigation,
        KeyGroup::Routing,
        KeyGroup::StatusRouting,
        KeyGroup::HorizontalSensors,
        KeyGroup::VerticalLeft,
        KeyGroup::VerticalRight,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }
}

/// One physical key
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KeyId {
    pub group: KeyGroup,
    pub number: u8,
}

impl KeyId {
    pub const fn new(group: KeyGroup, number: u8) -> Self {
        Self { group, number }
    }

    /// Packed form used as a passthrough command argument
    pub const fn code(self) -> u16 {
        ((self.group as u16) << 8) | self.number as u16
    }
}

/// A key changed state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KeyEvent {
    pub key: KeyId,
    pub pressed: bool,
}

impl KeyEvent {
    pub const fn press(group: KeyGroup, number: u8) -> Self {
        Self {
            key: KeyId::new(group, number),
            pressed: true,
        }
    }

    pub const fn release(group: KeyGroup, number: u8) -> Self {
        Self {
            key: KeyId::new(group, number),
            pressed: false,
        }
    }
}

/// Set of key numbers 0..=255 within one group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KeySet {
    words: [u32; 8],
}

impl KeySet {
    pub const fn new() -> Self {
        Self { words: [0; 8] }
    }

    pub fn contains(&self, number: u8) -> bool {
        self.words[(number >> 5) as usize] & (1 << (number & 31)) != 0
    }

    pub fn insert(&mut self, number: u8) {
        self.words[(number >> 5) as usize] |= 1 << (number & 31);
    }

    pub fn remove(&mut self, number: u8) {
        self.words[(number >> 5) as usize] &= !(1 << (number & 31));
    }

    pub fn clear(&mut self) {
        self.words = [0; 8];
    }

    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    pub fn len(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Members in ascending order
    pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        (0..=255u8).filter(move |&n| self.contains(n))
    }
}
