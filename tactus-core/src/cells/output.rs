//! Dot translation from the host's cell encoding to the device's

/// Logical dot bits (ISO 11548-1)
pub const DOT1: u8 = 0x01;
pub const DOT2: u8 = 0x02;
pub const DOT3: u8 = 0x04;
pub const DOT4: u8 = 0x08;
pub const DOT5: u8 = 0x10;
pub const DOT6: u8 = 0x20;
pub const DOT7: u8 = 0x40;
pub const DOT8: u8 = 0x80;

/// 256-entry map from logical cells to device bytes
#[derive(Clone, PartialEq, Eq)]
pub struct OutputTable {
    map: [u8; 256],
}

impl core::fmt::Debug for OutputTable {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("OutputTable")
            .field("identity", &self.is_identity())
            .finish()
    }
}

impl Default for OutputTable {
    fn default() -> Self {
        Self::identity()
    }
}

impl OutputTable {
    /// Device wired in standard dot order
    pub const fn identity() -> Self {
        let mut map = [0u8; 256];
        let mut i = 0;
        while i < 256 {
            map[i] = i as u8;
            i += 1;
        }
        Self { map }
    }

    /// Build from the device bit carrying each of dots 1 to 8
    pub fn from_dot_bits(bits: [u8; 8]) -> Self {
        let mut map = [0u8; 256];
        for (cell, out) in map.iter_mut().enumerate() {
            *out = bits
                .iter()
                .enumerate()
                .filter(|(dot, _)| cell & (1 << dot) != 0)
                .fold(0, |acc, (_, &bit)| acc | bit);
        }
        Self { map }
    }

    pub fn translate(&self, cell: u8) -> u8 {
        self.map[cell as usize]
    }

    pub fn is_identity(&self) -> bool {
        self.map.iter().enumerate().all(|(i, &b)| i == b as usize)
    }
}
