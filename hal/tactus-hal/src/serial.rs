//! Serial line parameters
//!
//! Drivers publish the line settings their hardware expects; the platform
//! applies them when it opens the port.

/// Serial configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SerialConfig {
    /// Baud rate in bits per second
    pub baudrate: u32,
    /// Number of data bits (typically 8)
    pub data_bits: DataBits,
    /// Parity mode
    pub parity: Parity,
    /// Number of stop bits
    pub stop_bits: StopBits,
    /// Hardware (RTS/CTS) flow control
    pub flow_control: bool,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            baudrate: 9600,
            data_bits: DataBits::Eight,
            parity: Parity::None,
            stop_bits: StopBits::One,
            flow_control: false,
        }
    }
}

impl SerialConfig {
    /// 8N1 at the given baud rate
    pub const fn eight_n_one(baudrate: u32) -> Self {
        Self {
            baudrate,
            data_bits: DataBits::Eight,
            parity: Parity::None,
            stop_bits: StopBits::One,
            flow_control: false,
        }
    }

    /// Time to transmit `bytes` on the wire, rounded up to whole milliseconds
    pub fn transmit_time_ms(&self, bytes: usize) -> u32 {
        let bits_per_char = 1 + self.data_bits.count() + self.parity.bits() + self.stop_bits.count();
        let bits = bytes as u64 * bits_per_char as u64 * 1000;
        let baud = self.baudrate.max(1) as u64;
        bits.div_ceil(baud).min(u32::MAX as u64) as u32
    }
}

/// Number of data bits per character
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DataBits {
    Seven,
    Eight,
}

impl DataBits {
    fn count(self) -> u32 {
        match self {
            DataBits::Seven => 7,
            DataBits::Eight => 8,
        }
    }
}

/// Parity mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Parity {
    None,
    Even,
    Odd,
}

impl Parity {
    fn bits(self) -> u32 {
        match self {
            Parity::None => 0,
            Parity::Even | Parity::Odd => 1,
        }
    }
}

/// Number of stop bits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StopBits {
    One,
    Two,
}

impl StopBits {
    fn count(self) -> u32 {
        match self {
            StopBits::One => 1,
            StopBits::Two => 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transmit_time() {
        // 10 bits per char at 19200 baud: 84 cells + header take ~45 ms
        let config = SerialConfig::eight_n_one(19200);
        assert_eq!(config.transmit_time_ms(86), 45);
        assert_eq!(config.transmit_time_ms(0), 0);
    }

    #[test]
    fn test_parity_adds_a_bit() {
        let mut config = SerialConfig::eight_n_one(1000);
        assert_eq!(config.transmit_time_ms(1), 10);
        config.parity = Parity::Even;
        assert_eq!(config.transmit_time_ms(1), 11);
    }
}
