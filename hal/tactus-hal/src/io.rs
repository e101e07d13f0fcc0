//! Adapter for `embedded-io` ports
//!
//! Any port implementing the `embedded-io` blocking traits plus
//! [`ReadReady`] can serve as a [`Transport`]. Timeouts are enforced by
//! polling readiness against a [`Clock`].

use embedded_io::{Error as _, ErrorKind, Read, ReadReady, Write};

use crate::clock::Clock;
use crate::transport::{Transport, TransportError, TransportKind};

fn map_error(kind: ErrorKind) -> TransportError {
    match kind {
        ErrorKind::NotConnected | ErrorKind::BrokenPipe | ErrorKind::ConnectionReset => {
            TransportError::Disconnected
        }
        ErrorKind::Unsupported => TransportError::Unsupported,
        _ => TransportError::Io,
    }
}

/// `embedded-io` port wrapped as a [`Transport`]
pub struct EmbeddedIoTransport<P, C> {
    port: P,
    clock: C,
    kind: TransportKind,
}

impl<P, C> EmbeddedIoTransport<P, C>
where
    P: Read + Write + ReadReady,
    C: Clock,
{
    /// Wrap a port
    pub fn new(port: P, clock: C, kind: TransportKind) -> Self {
        Self { port, clock, kind }
    }

    /// Release the wrapped port
    pub fn into_inner(self) -> P {
        self.port
    }

    fn wait_ready(&mut self, timeout_ms: u32) -> Result<bool, TransportError> {
        let deadline = self.clock.now_ms().saturating_add(timeout_ms as u64);
        loop {
            if self.port.read_ready().map_err(|e| map_error(e.kind()))? {
                return Ok(true);
            }
            if self.clock.now_ms() >= deadline {
                return Ok(false);
            }
        }
    }
}

impl<P, C> Transport for EmbeddedIoTransport<P, C>
where
    P: Read + Write + ReadReady,
    C: Clock,
{
    fn kind(&self) -> TransportKind {
        self.kind
    }

    fn await_input(&mut self, timeout_ms: u32) -> Result<bool, TransportError> {
        self.wait_ready(timeout_ms)
    }

    fn read_bytes(
        &mut self,
        buf: &mut [u8],
        initial_timeout_ms: u32,
        subsequent_timeout_ms: u32,
    ) -> Result<usize, TransportError> {
        let mut count = 0;
        while count < buf.len() {
            let timeout = if count == 0 {
                initial_timeout_ms
            } else {
                subsequent_timeout_ms
            };
            if !self.wait_ready(timeout)? {
                break;
            }
            let n = self
                .port
                .read(&mut buf[count..])
                .map_err(|e| map_error(e.kind()))?;
            if n == 0 {
                return Err(TransportError::Disconnected);
            }
            count += n;
        }
        Ok(count)
    }

    fn write_bytes(&mut self, data: &[u8]) -> Result<(), TransportError> {
        self.port.write_all(data).map_err(|e| map_error(e.kind()))?;
        self.port.flush().map_err(|e| map_error(e.kind()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::Cell;

    #[derive(Debug)]
    struct PortError(ErrorKind);

    impl embedded_io::Error for PortError {
        fn kind(&self) -> ErrorKind {
            self.0
        }
    }

    struct Loopback<'a> {
        data: &'a [u8],
        pos: usize,
        written: usize,
        fail_writes: bool,
    }

    impl embedded_io::ErrorType for Loopback<'_> {
        type Error = PortError;
    }

    impl Read for Loopback<'_> {
        fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
            let n = buf.len().min(self.data.len() - self.pos).min(2);
            buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
            self.pos += n;
            Ok(n)
        }
    }

    impl ReadReady for Loopback<'_> {
        fn read_ready(&mut self) -> Result<bool, Self::Error> {
            Ok(self.pos < self.data.len())
        }
    }

    impl Write for Loopback<'_> {
        fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
            if self.fail_writes {
                return Err(PortError(ErrorKind::BrokenPipe));
            }
            self.written += buf.len();
            Ok(buf.len())
        }

        fn flush(&mut self) -> Result<(), Self::Error> {
            Ok(())
        }
    }

    struct TickClock(Cell<u64>);

    impl Clock for TickClock {
        fn now_ms(&self) -> u64 {
            let now = self.0.get();
            self.0.set(now + 1);
            now
        }
    }

    #[test]
    fn test_reads_across_small_chunks() {
        let port = Loopback {
            data: &[1, 2, 3, 4, 5],
            pos: 0,
            written: 0,
            fail_writes: false,
        };
        let mut t = EmbeddedIoTransport::new(port, TickClock(Cell::new(0)), TransportKind::Serial);
        let mut buf = [0u8; 8];
        let n = t.read_bytes(&mut buf, 10, 10).unwrap();
        assert_eq!(&buf[..n], &[1, 2, 3, 4, 5]);
        assert_eq!(t.read_bytes(&mut buf, 5, 5), Ok(0));
    }

    #[test]
    fn test_write_error_maps_to_disconnect() {
        let port = Loopback {
            data: &[],
            pos: 0,
            written: 0,
            fail_writes: true,
        };
        let mut t = EmbeddedIoTransport::new(port, TickClock(Cell::new(0)), TransportKind::Usb);
        assert_eq!(t.write_bytes(&[0x1B]), Err(TransportError::Disconnected));
    }
}
