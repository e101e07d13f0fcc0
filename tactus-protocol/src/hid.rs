//! USB HID report framing
//!
//! A HID transport delivers one input report per read. The first byte is the
//! packet code; padding after the dialect's packet length is dropped.

use tactus_hal::{Clock, Connection, Transport, TransportError};

use crate::packet::{FrameError, Packet, PacketLengths, ReadBudget, MAX_PACKET_SIZE};

/// Total length of the packet at the start of `bytes`
///
/// Walks the length table the same way the byte-wise framers do, so length
/// bytes and identity quirks are honoured.
pub fn packet_length<L>(bytes: &[u8], lengths: &L) -> Result<usize, FrameError>
where
    L: PacketLengths + ?Sized,
{
    if bytes.is_empty() {
        return Err(FrameError::Truncated);
    }

    let mut seen = 1;
    loop {
        let expected = lengths
            .expected_length(&bytes[..seen])
            .ok_or(FrameError::UnknownCode(bytes[0]))?;
        if expected <= seen {
            return Ok(expected);
        }
        if expected > bytes.len() {
            return Err(FrameError::Truncated);
        }
        seen = expected;
    }
}

/// Turn one input report into a packet
pub fn parse_report<L>(report: &[u8], lengths: &L) -> Result<Packet, FrameError>
where
    L: PacketLengths + ?Sized,
{
    let length = packet_length(report, lengths)?;
    Packet::new(&report[..length])
}

/// Read one report from `conn`
///
/// Returns `Ok(None)` when no report arrived in time. Malformed reports are
/// logged and skipped, within the same budget as the byte-wise framers.
pub fn read_report<T, C, L>(
    conn: &mut Connection<T, C>,
    lengths: &L,
    timeout_ms: u32,
) -> Result<Option<Packet>, TransportError>
where
    T: Transport,
    C: Clock,
    L: PacketLengths + ?Sized,
{
    let mut report = [0u8; MAX_PACKET_SIZE];
    let mut budget = ReadBudget::start(conn, timeout_ms);
    loop {
        let Some(timeout) = budget.next_timeout(conn, timeout_ms) else {
            return Ok(None);
        };
        let count = conn.transport().read_bytes(&mut report, timeout, 0)?;
        if count == 0 {
            return Ok(None);
        }

        match parse_report(&report[..count], lengths) {
            Ok(packet) => {
                trace!("report {:#x}, {} bytes", packet.code(), count);
                return Ok(Some(packet));
            }
            Err(e) => warn!("dropping malformed report: {:?}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tactus_hal::mock::{MockClock, MockTransport};

    struct TestLengths;

    impl PacketLengths for TestLengths {
        fn expected_length(&self, partial: &[u8]) -> Option<usize> {
            match partial[0] {
                0x24 => Some(2),
                0x42 => match partial.get(1) {
                    Some(&n) => Some(2 + n as usize),
                    None => Some(2),
                },
                _ => None,
            }
        }
    }

    #[test]
    fn test_report_truncated_to_table_length() {
        let packet = parse_report(&[0x24, 0x05, 0, 0, 0, 0], &TestLengths).unwrap();
        assert_eq!(packet.as_bytes(), &[0x24, 0x05]);
    }

    #[test]
    fn test_variable_length_report() {
        let packet = parse_report(&[0x42, 3, 7, 8, 9, 0, 0], &TestLengths).unwrap();
        assert_eq!(packet.payload(), &[3, 7, 8, 9]);
    }

    #[test]
    fn test_short_and_unknown_reports() {
        assert_eq!(parse_report(&[0x24], &TestLengths), Err(FrameError::Truncated));
        assert_eq!(parse_report(&[0x42, 5, 1], &TestLengths), Err(FrameError::Truncated));
        assert_eq!(parse_report(&[0x99, 1], &TestLengths), Err(FrameError::UnknownCode(0x99)));
    }

    #[test]
    fn test_read_report_skips_malformed() {
        let clock = MockClock::new();
        let mut conn = Connection::new(MockTransport::hid(clock.clone()), clock);
        conn.transport().push_inbound(&[0x99, 0x00]);
        conn.transport().push_inbound(&[0x24, 0x01, 0x00]);

        let packet = read_report(&mut conn, &TestLengths, 0).unwrap().unwrap();
        assert_eq!(packet.as_bytes(), &[0x24, 0x01]);
        assert_eq!(read_report(&mut conn, &TestLengths, 0), Ok(None));
    }

    #[test]
    fn test_malformed_reports_end_at_timeout() {
        let clock = MockClock::new();
        let mut conn = Connection::new(MockTransport::hid(clock.clone()), clock.clone());
        conn.transport().set_byte_time(10);
        for _ in 0..100 {
            conn.transport().push_inbound(&[0x99, 0x00]);
        }

        assert_eq!(read_report(&mut conn, &TestLengths, 200), Ok(None));
        assert_eq!(clock.now_ms(), 200);
    }
}
