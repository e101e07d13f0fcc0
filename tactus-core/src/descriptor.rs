//! What a probe learned about the attached display

use heapless::String;

/// Longest model name kept
pub const MAX_NAME_LEN: usize = 32;

/// Wire dialect spoken on the link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Dialect {
    /// Escape-coded packets over serial or Bluetooth
    Escape,
    /// One packet per USB HID report
    Hid,
    /// Unframed single-byte compatibility mode
    Legacy,
}

/// How the cell count was established
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Generation {
    /// The display reported its cell count
    #[default]
    Current,
    /// Inferred from an older firmware's behaviour or its name
    Legacy,
}

/// Model-specific behaviour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Quirks {
    /// Accepts `offset count cells` writes instead of the whole display
    pub partial_writes: bool,
    /// Sends a fixed-size routing-key packet regardless of cell count
    pub routing_key_bytes: Option<u8>,
    /// Uses the vario key layout by default
    pub vario_keys: bool,
}

/// Identity and geometry of the attached display
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeviceDescriptor {
    pub name: String<MAX_NAME_LEN>,
    pub text_columns: u8,
    pub status_columns: u8,
    pub dialect: Dialect,
    pub generation: Generation,
    pub quirks: Quirks,
}

impl DeviceDescriptor {
    pub fn new(dialect: Dialect, text_columns: u8) -> Self {
        Self {
            name: String::new(),
            text_columns,
            status_columns: 0,
            dialect,
            generation: Generation::Current,
            quirks: Quirks::default(),
        }
    }

    /// Set the name, cutting it at [`MAX_NAME_LEN`] bytes
    pub fn set_name(&mut self, name: &str) {
        self.name.clear();
        for ch in name.chars() {
            if self.name.push(ch).is_err() {
                break;
            }
        }
    }

    /// Set the name from device text, one byte per character
    pub fn set_name_bytes(&mut self, name: &[u8]) {
        self.name.clear();
        for &b in name {
            let ch = if b.is_ascii_graphic() || b == b' ' { b as char } else { '?' };
            if self.name.push(ch).is_err() {
                break;
            }
        }
    }

    /// Cells in the device buffer: status cells first, then text
    pub fn total_cells(&self) -> usize {
        self.status_columns as usize + self.text_columns as usize
    }
}
