//! Mock implementations for testing
//!
//! [`MockTransport`] replays scripted device output and records every write.
//! Responses can be tied to requests so a probe sees its answers only after
//! asking. [`MockClock`] is simulated time: it moves when a read times out,
//! and on every delivered byte once a line time is set, so bounded waits
//! finish instantly in tests.

use alloc::collections::VecDeque;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::Cell;

use crate::clock::Clock;
use crate::transport::{Transport, TransportError, TransportKind};

/// Simulated monotonic clock shared between a test and its transport
#[derive(Debug, Clone, Default)]
pub struct MockClock {
    now: Rc<Cell<u64>>,
}

impl MockClock {
    /// Clock starting at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Move time forward
    pub fn advance(&self, ms: u64) {
        self.now.set(self.now.get().saturating_add(ms));
    }
}

impl Clock for MockClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }
}

struct Script {
    request: Vec<u8>,
    response: Vec<u8>,
    repeat: bool,
}

/// Scripted transport
pub struct MockTransport {
    kind: TransportKind,
    clock: MockClock,
    inbound: VecDeque<Vec<u8>>,
    scripts: Vec<Script>,
    writes: Vec<Vec<u8>>,
    report_mode: bool,
    fail_reads: bool,
    fail_writes: bool,
    byte_time_ms: u64,
}

impl MockTransport {
    /// Byte-stream transport (serial or Bluetooth)
    pub fn new(kind: TransportKind, clock: MockClock) -> Self {
        Self {
            kind,
            clock,
            inbound: VecDeque::new(),
            scripts: Vec::new(),
            writes: Vec::new(),
            report_mode: false,
            fail_reads: false,
            fail_writes: false,
            byte_time_ms: 0,
        }
    }

    /// USB HID transport: each queued chunk is delivered as one report
    pub fn hid(clock: MockClock) -> Self {
        let mut mock = Self::new(TransportKind::Usb, clock);
        mock.report_mode = true;
        mock
    }

    /// Queue bytes the device sends unprompted
    pub fn push_inbound(&mut self, bytes: &[u8]) {
        if !bytes.is_empty() {
            self.inbound.push_back(bytes.to_vec());
        }
    }

    /// Reply with `response` the next time `request` is written
    ///
    /// Scripts for the same request answer in the order they were added.
    pub fn respond_once(&mut self, request: &[u8], response: &[u8]) {
        self.scripts.push(Script {
            request: request.to_vec(),
            response: response.to_vec(),
            repeat: false,
        });
    }

    /// Reply with `response` every time `request` is written
    pub fn respond_always(&mut self, request: &[u8], response: &[u8]) {
        self.scripts.push(Script {
            request: request.to_vec(),
            response: response.to_vec(),
            repeat: true,
        });
    }

    /// Make every subsequent read fail with `Disconnected`
    pub fn fail_reads(&mut self, fail: bool) {
        self.fail_reads = fail;
    }

    /// Make every subsequent write fail with `Disconnected`
    pub fn fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    /// Advance the clock by `ms` for every byte (or report) delivered
    pub fn set_byte_time(&mut self, ms: u64) {
        self.byte_time_ms = ms;
    }

    /// Everything written so far, one entry per `write_bytes` call
    pub fn writes(&self) -> &[Vec<u8>] {
        &self.writes
    }

    /// Forget recorded writes
    pub fn clear_writes(&mut self) {
        self.writes.clear();
    }

    /// Bytes still waiting to be read
    pub fn pending_inbound(&self) -> usize {
        self.inbound.iter().map(Vec::len).sum()
    }

    fn pop_byte(&mut self) -> Option<u8> {
        let chunk = self.inbound.front_mut()?;
        let byte = chunk.remove(0);
        if chunk.is_empty() {
            self.inbound.pop_front();
        }
        Some(byte)
    }
}

impl Transport for MockTransport {
    fn kind(&self) -> TransportKind {
        self.kind
    }

    fn await_input(&mut self, timeout_ms: u32) -> Result<bool, TransportError> {
        if self.fail_reads {
            return Err(TransportError::Disconnected);
        }
        if self.inbound.is_empty() {
            self.clock.advance(timeout_ms as u64);
            return Ok(false);
        }
        Ok(true)
    }

    fn read_bytes(
        &mut self,
        buf: &mut [u8],
        initial_timeout_ms: u32,
        _subsequent_timeout_ms: u32,
    ) -> Result<usize, TransportError> {
        if self.fail_reads {
            return Err(TransportError::Disconnected);
        }
        if self.inbound.is_empty() {
            self.clock.advance(initial_timeout_ms as u64);
            return Ok(0);
        }

        if self.report_mode {
            let report = self.inbound.pop_front().unwrap_or_default();
            if report.len() > buf.len() {
                return Err(TransportError::BufferTooSmall);
            }
            buf[..report.len()].copy_from_slice(&report);
            self.clock.advance(self.byte_time_ms);
            return Ok(report.len());
        }

        let mut count = 0;
        while count < buf.len() {
            match self.pop_byte() {
                Some(byte) => {
                    buf[count] = byte;
                    count += 1;
                    self.clock.advance(self.byte_time_ms);
                }
                None => break,
            }
        }
        Ok(count)
    }

    fn write_bytes(&mut self, data: &[u8]) -> Result<(), TransportError> {
        if self.fail_writes {
            return Err(TransportError::Disconnected);
        }
        self.writes.push(data.to_vec());

        if let Some(index) = self.scripts.iter().position(|s| s.request.as_slice() == data) {
            let reply = if self.scripts[index].repeat {
                self.scripts[index].response.clone()
            } else {
                self.scripts.remove(index).response
            };
            self.push_inbound(&reply);
        }
        Ok(())
    }
}
