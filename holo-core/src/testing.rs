//! Host-side test doubles for ports, buses, clocks, and delays.

#![allow(dead_code)]

extern crate std;

use core::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;
use std::vec::Vec;

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::{ErrorKind, I2c, NoAcknowledgeSource, Operation};
use embedded_io::{ErrorKind as IoErrorKind, Read, ReadReady, Write};

use crate::link::BusGuard;
use crate::schedule::Clock;

/// In-memory serial port.
pub struct MockPort {
    input: VecDeque<u8>,
    written: Rc<RefCell<Vec<u8>>>,
    fail_writes: bool,
}

impl MockPort {
    pub fn new() -> Self {
        Self {
            input: VecDeque::new(),
            written: Rc::new(RefCell::new(Vec::new())),
            fail_writes: false,
        }
    }

    pub fn with_input(bytes: &[u8]) -> Self {
        let mut port = Self::new();
        port.input.extend(bytes.iter().copied());
        port
    }

    pub fn failing_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }

    /// Shared view of everything written so far.
    pub fn written(&self) -> Rc<RefCell<Vec<u8>>> {
        self.written.clone()
    }
}

impl embedded_io::ErrorType for MockPort {
    type Error = IoErrorKind;
}

impl Read for MockPort {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let mut n = 0;
        while n < buf.len() {
            match self.input.pop_front() {
                Some(b) => {
                    buf[n] = b;
                    n += 1;
                }
                None => break,
            }
        }
        Ok(n)
    }
}

impl ReadReady for MockPort {
    fn read_ready(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.input.is_empty())
    }
}

impl Write for MockPort {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        if self.fail_writes {
            return Err(IoErrorKind::Other);
        }
        self.written.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Everything a [`MockBus`] was asked to do.
#[derive(Default)]
pub struct BusLog {
    pub writes: Vec<(u8, Vec<u8>)>,
    pub reads: Vec<(u8, usize)>,
}

/// Scripted I2C bus.
///
/// Writes consume queued results (success once the queue is empty). Reads
/// return the configured response padded with `0xFF`, or fail with an address
/// NACK when the peripheral is absent.
pub struct MockBus {
    log: Rc<RefCell<BusLog>>,
    write_results: VecDeque<Result<(), ErrorKind>>,
    response: Vec<u8>,
    present: bool,
}

impl MockBus {
    pub fn new() -> Self {
        Self {
            log: Rc::new(RefCell::new(BusLog::default())),
            write_results: VecDeque::new(),
            response: Vec::new(),
            present: true,
        }
    }

    pub fn with_write_results(mut self, results: &[Result<(), ErrorKind>]) -> Self {
        self.write_results.extend(results.iter().copied());
        self
    }

    pub fn with_response(mut self, bytes: &[u8]) -> Self {
        self.response = bytes.to_vec();
        self
    }

    pub fn absent(mut self) -> Self {
        self.present = false;
        self
    }

    pub fn log(&self) -> Rc<RefCell<BusLog>> {
        self.log.clone()
    }
}

impl embedded_hal::i2c::ErrorType for MockBus {
    type Error = ErrorKind;
}

impl I2c for MockBus {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        for op in operations {
            match op {
                Operation::Write(bytes) => {
                    self.log.borrow_mut().writes.push((address, bytes.to_vec()));
                    self.write_results.pop_front().unwrap_or(Ok(()))?;
                }
                Operation::Read(buf) => {
                    self.log.borrow_mut().reads.push((address, buf.len()));
                    if !self.present {
                        return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address));
                    }
                    for (i, b) in buf.iter_mut().enumerate() {
                        *b = self.response.get(i).copied().unwrap_or(0xFF);
                    }
                }
            }
        }
        Ok(())
    }
}

/// Manually advanced millisecond clock.
#[derive(Clone, Default)]
pub struct FakeClock {
    now: Rc<Cell<u64>>,
}

impl FakeClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, ms: u64) {
        self.now.set(ms);
    }

    pub fn advance(&self, ms: u64) {
        self.now.set(self.now.get() + ms);
    }
}

impl Clock for FakeClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }
}

/// Delay that records requested time instead of sleeping.
#[derive(Clone, Default)]
pub struct RecordingDelay {
    total_ns: Rc<Cell<u64>>,
}

impl RecordingDelay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total_ms(&self) -> u64 {
        self.total_ns.get() / 1_000_000
    }
}

impl DelayNs for RecordingDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ns.set(self.total_ns.get() + u64::from(ns));
    }
}

/// Bus guard whose clock moves `step_us` every time it is read.
pub struct SteppingGuard {
    now: Cell<u64>,
    step_us: u64,
    resets: Rc<Cell<u32>>,
}

impl SteppingGuard {
    pub fn new(step_us: u64) -> Self {
        Self {
            now: Cell::new(0),
            step_us,
            resets: Rc::new(Cell::new(0)),
        }
    }

    /// Shared count of bus resets.
    pub fn resets(&self) -> Rc<Cell<u32>> {
        self.resets.clone()
    }
}

impl<B> BusGuard<B> for SteppingGuard {
    fn now_us(&self) -> Option<u64> {
        let now = self.now.get();
        self.now.set(now + self.step_us);
        Some(now)
    }

    fn reset(&mut self, _bus: &mut B) {
        self.resets.set(self.resets.get() + 1);
    }
}
