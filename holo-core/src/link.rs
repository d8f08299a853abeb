//! Transport selection: serial and I2C links behind one sum type.
//!
//! A [`Link`] is chosen once at construction and never changes variant.
//! Unused variant slots default to [`Detached`], an uninhabited type, so a
//! bus-only link never has to name a serial port type and vice versa.
//!
//! ```
//! use holo_core::{Link, LinkMode, Transport};
//!
//! let link = Link::unconfigured();
//! assert_eq!(link.mode(), LinkMode::Detached);
//! ```

use core::convert::Infallible;

use embedded_hal::i2c::{ErrorKind, I2c, Operation};
use embedded_io::{Read, ReadReady, Write};
use heapless::Vec;

use crate::transport::{BusStatus, LinkMode, Transport, WriteStatus};

/// Default serial baud rate.
pub const DEFAULT_SERIAL_BAUD: u32 = 9_600;

/// Default I2C clock in Hz.
pub const DEFAULT_BUS_CLOCK_HZ: u32 = 400_000;

/// I2C transaction timeout in microseconds.
pub const BUS_TIMEOUT_US: u32 = 3_000;

/// Largest frame a single bus write may carry.
pub const BUS_BUFFER_LEN: usize = 32;

/// Largest response a single bus request may return.
pub const MAX_BUS_REQUEST: usize = 32;

/// Timing and recovery hooks for a bus link.
///
/// A blocking I2C driver cannot be interrupted, so the deadline is checked
/// when the transaction returns: a failed transaction that took longer than
/// [`BusConfig::timeout_us`] is reported as [`BusStatus::Timeout`], and the
/// bus is reset if [`BusConfig::reset_on_timeout`] is set.
pub trait BusGuard<B> {
    /// Monotonic microseconds, or `None` if transactions are not timed.
    fn now_us(&self) -> Option<u64>;

    /// Return the bus to idle after a timed-out transaction.
    fn reset(&mut self, bus: &mut B);
}

/// Guard for buses that are not timed.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unguarded;

impl<B> BusGuard<B> for Unguarded {
    fn now_us(&self) -> Option<u64> {
        None
    }

    fn reset(&mut self, _bus: &mut B) {}
}

/// Placeholder for link slots that are never used.
///
/// Uninhabited: a value can never exist, so every method is unreachable.
#[derive(Debug)]
pub enum Detached {}

impl embedded_io::ErrorType for Detached {
    type Error = Infallible;
}

impl Read for Detached {
    fn read(&mut self, _buf: &mut [u8]) -> Result<usize, Self::Error> {
        match *self {}
    }
}

impl ReadReady for Detached {
    fn read_ready(&mut self) -> Result<bool, Self::Error> {
        match *self {}
    }
}

impl Write for Detached {
    fn write(&mut self, _buf: &[u8]) -> Result<usize, Self::Error> {
        match *self {}
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        match *self {}
    }
}

impl embedded_hal::i2c::ErrorType for Detached {
    type Error = ErrorKind;
}

impl I2c for Detached {
    fn transaction(
        &mut self,
        _address: u8,
        _operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        match *self {}
    }
}

/// Byte-stream link over any `embedded-io` port.
///
/// Writes are fire-and-forget: the peripheral gives no feedback, so errors
/// are logged and otherwise ignored.
#[derive(Debug)]
pub struct SerialLink<P> {
    port: P,
    baud: u32,
}

impl<P> SerialLink<P>
where
    P: Read + ReadReady + Write,
{
    /// Wrap a port already configured for `baud`.
    #[must_use]
    pub fn new(port: P, baud: u32) -> Self {
        Self { port, baud }
    }

    #[inline]
    #[must_use]
    pub fn baud(&self) -> u32 {
        self.baud
    }

    fn write(&mut self, frame: &[u8]) -> WriteStatus {
        if self.port.write_all(frame).is_err() || self.port.flush().is_err() {
            debug!("serial write failed");
        }
        WriteStatus::Streamed
    }

    fn available(&mut self) -> bool {
        self.port.read_ready().unwrap_or(false)
    }

    fn read_byte(&mut self) -> Option<u8> {
        let mut byte = [0u8; 1];
        match self.port.read(&mut byte) {
            Ok(1) => Some(byte[0]),
            _ => None,
        }
    }
}

/// I2C bus parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BusConfig {
    /// 7-bit peripheral address.
    pub address: u8,
    /// Bus clock in Hz, applied by the platform when it builds the bus.
    pub clock_hz: u32,
    /// Failed transactions slower than this report [`BusStatus::Timeout`].
    /// Only enforced on links built with a [`BusGuard`].
    pub timeout_us: u32,
    /// Reset the bus through its [`BusGuard`] after a timeout.
    pub reset_on_timeout: bool,
}

impl BusConfig {
    /// Defaults for `address`: 400 kHz, 3 ms timeout with reset.
    #[must_use]
    pub const fn new(address: u8) -> Self {
        Self {
            address,
            clock_hz: DEFAULT_BUS_CLOCK_HZ,
            timeout_us: BUS_TIMEOUT_US,
            reset_on_timeout: true,
        }
    }

    #[must_use]
    pub const fn with_clock(mut self, clock_hz: u32) -> Self {
        self.clock_hz = clock_hz;
        self
    }
}

/// Addressed I2C link.
///
/// Every write is one complete START..STOP transaction, so a failed write
/// never leaves the bus mid-transaction. Reads are pulled on demand with
/// [`Transport::request`] into a staging buffer and then drained byte by byte.
#[derive(Debug)]
pub struct BusLink<B, G = Unguarded> {
    bus: B,
    guard: G,
    config: BusConfig,
    rx: Vec<u8, MAX_BUS_REQUEST>,
    rx_pos: usize,
}

impl<B: I2c, G: BusGuard<B>> BusLink<B, G> {
    #[must_use]
    pub fn new(bus: B, config: BusConfig, guard: G) -> Self {
        Self {
            bus,
            guard,
            config,
            rx: Vec::new(),
            rx_pos: 0,
        }
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &BusConfig {
        &self.config
    }

    fn write(&mut self, frame: &[u8]) -> WriteStatus {
        if frame.len() > BUS_BUFFER_LEN {
            return WriteStatus::Bus(BusStatus::DataTooLong);
        }
        let started = self.guard.now_us();
        let result = self.bus.write(self.config.address, frame);
        WriteStatus::Bus(self.status(started, result))
    }

    fn request(&mut self, len: usize) -> usize {
        self.rx.clear();
        self.rx_pos = 0;

        let len = len.min(MAX_BUS_REQUEST);
        if self.rx.resize(len, 0).is_err() {
            return 0;
        }
        let started = self.guard.now_us();
        let result = self.bus.read(self.config.address, &mut self.rx);
        if !self.status(started, result).is_success() {
            self.rx.clear();
        }
        self.rx.len()
    }

    /// Classify a finished transaction, resetting the bus if it overran.
    fn status(&mut self, started: Option<u64>, result: Result<(), B::Error>) -> BusStatus {
        let Err(e) = result else {
            return BusStatus::Success;
        };
        let elapsed = match (started, self.guard.now_us()) {
            (Some(start), Some(end)) => end.saturating_sub(start),
            _ => return BusStatus::from_i2c_error(&e),
        };
        if elapsed <= u64::from(self.config.timeout_us) {
            return BusStatus::from_i2c_error(&e);
        }

        warn!("bus transaction timed out after {} us", elapsed);
        if self.config.reset_on_timeout {
            self.guard.reset(&mut self.bus);
        }
        BusStatus::Timeout
    }

    fn available(&self) -> bool {
        self.rx_pos < self.rx.len()
    }

    fn read_byte(&mut self) -> Option<u8> {
        let byte = self.rx.get(self.rx_pos).copied()?;
        self.rx_pos += 1;
        Some(byte)
    }
}

/// The active transport, fixed for the lifetime of the instance.
///
/// `H` and `S` are the hardware and software serial port types, `B` the I2C
/// bus type and `G` its [`BusGuard`]; slots the chosen variant does not use
/// stay [`Detached`].
#[derive(Debug)]
pub enum Link<H = Detached, S = Detached, B = Detached, G = Unguarded> {
    /// Hardware UART.
    Hardware(SerialLink<H>),
    /// Software (bit-banged or PIO) UART.
    Software(SerialLink<S>),
    /// I2C bus.
    Bus(BusLink<B, G>),
    /// Nothing selected; the instance is an inert sink.
    Unconfigured,
}

impl Link {
    /// A link that drops everything.
    #[must_use]
    pub fn unconfigured() -> Self {
        Self::Unconfigured
    }
}

impl<H: Read + ReadReady + Write> Link<H> {
    /// Hardware serial port already running at `baud`.
    #[must_use]
    pub fn hardware(port: H, baud: u32) -> Self {
        Self::Hardware(SerialLink::new(port, baud))
    }
}

impl<S: Read + ReadReady + Write> Link<Detached, S> {
    /// Software serial port already running at `baud`.
    #[must_use]
    pub fn software(port: S, baud: u32) -> Self {
        Self::Software(SerialLink::new(port, baud))
    }
}

impl<B: I2c> Link<Detached, Detached, B> {
    /// I2C peripheral at `address` with default bus parameters.
    #[must_use]
    pub fn bus(bus: B, address: u8) -> Self {
        Self::Bus(BusLink::new(bus, BusConfig::new(address), Unguarded))
    }

    /// I2C peripheral at `address` clocked at `clock_hz`.
    #[must_use]
    pub fn bus_with_clock(bus: B, address: u8, clock_hz: u32) -> Self {
        Self::Bus(BusLink::new(
            bus,
            BusConfig::new(address).with_clock(clock_hz),
            Unguarded,
        ))
    }

    /// I2C peripheral with explicit bus parameters.
    #[must_use]
    pub fn bus_with_config(bus: B, config: BusConfig) -> Self {
        Self::Bus(BusLink::new(bus, config, Unguarded))
    }
}

impl<B: I2c, G: BusGuard<B>> Link<Detached, Detached, B, G> {
    /// I2C peripheral whose transactions are timed by `guard`.
    ///
    /// A failed transaction that overruns `config.timeout_us` reports
    /// [`BusStatus::Timeout`] and resets the bus if `config.reset_on_timeout`.
    #[must_use]
    pub fn guarded_bus(bus: B, config: BusConfig, guard: G) -> Self {
        Self::Bus(BusLink::new(bus, config, guard))
    }
}

impl<H, S, B, G> Link<H, S, B, G> {
    /// Serial baud rate, if this is a serial link.
    #[must_use]
    pub fn baud(&self) -> Option<u32> {
        match self {
            Self::Hardware(l) => Some(l.baud),
            Self::Software(l) => Some(l.baud),
            _ => None,
        }
    }

    /// Bus parameters, if this is a bus link.
    #[must_use]
    pub fn bus_config(&self) -> Option<&BusConfig> {
        match self {
            Self::Bus(l) => Some(&l.config),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_configured(&self) -> bool {
        !matches!(self, Self::Unconfigured)
    }
}

impl<H, S, B, G> Transport for Link<H, S, B, G>
where
    H: Read + ReadReady + Write,
    S: Read + ReadReady + Write,
    B: I2c,
    G: BusGuard<B>,
{
    fn mode(&self) -> LinkMode {
        match self {
            Self::Hardware(_) | Self::Software(_) => LinkMode::Stream,
            Self::Bus(_) => LinkMode::Transaction,
            Self::Unconfigured => LinkMode::Detached,
        }
    }

    fn write(&mut self, frame: &[u8]) -> WriteStatus {
        match self {
            Self::Hardware(l) => l.write(frame),
            Self::Software(l) => l.write(frame),
            Self::Bus(l) => l.write(frame),
            Self::Unconfigured => WriteStatus::NoLink,
        }
    }

    fn request(&mut self, len: usize) -> usize {
        match self {
            Self::Bus(l) => l.request(len),
            _ => 0,
        }
    }

    fn available(&mut self) -> bool {
        match self {
            Self::Hardware(l) => l.available(),
            Self::Software(l) => l.available(),
            Self::Bus(l) => l.available(),
            Self::Unconfigured => false,
        }
    }

    fn read_byte(&mut self) -> Option<u8> {
        match self {
            Self::Hardware(l) => l.read_byte(),
            Self::Software(l) => l.read_byte(),
            Self::Bus(l) => l.read_byte(),
            Self::Unconfigured => None,
        }
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use crate::testing::{MockBus, MockPort, SteppingGuard};
    use embedded_hal::i2c::NoAcknowledgeSource;
    use std::vec;

    const DATA_NACK: Result<(), ErrorKind> =
        Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data));

    #[test]
    fn test_constructors_pick_variant() {
        let hw = Link::hardware(MockPort::new(), 115_200);
        assert_eq!(hw.mode(), LinkMode::Stream);
        assert_eq!(hw.baud(), Some(115_200));
        assert!(hw.bus_config().is_none());

        let sw = Link::software(MockPort::new(), DEFAULT_SERIAL_BAUD);
        assert_eq!(sw.mode(), LinkMode::Stream);
        assert_eq!(sw.baud(), Some(9_600));

        let bus = Link::bus(MockBus::new(), 0x10);
        assert_eq!(bus.mode(), LinkMode::Transaction);
        assert_eq!(bus.baud(), None);
        assert_eq!(bus.bus_config(), Some(&BusConfig::new(0x10)));

        assert!(!Link::unconfigured().is_configured());
    }

    #[test]
    fn test_bus_config_defaults() {
        let config = BusConfig::new(0x19);
        assert_eq!(config.clock_hz, 400_000);
        assert_eq!(config.timeout_us, 3_000);
        assert!(config.reset_on_timeout);

        let link = Link::bus_with_clock(MockBus::new(), 0x19, 100_000);
        assert_eq!(link.bus_config().map(|c| c.clock_hz), Some(100_000));
    }

    #[test]
    fn test_serial_write_is_fire_and_forget() {
        let port = MockPort::new();
        let written = port.written();
        let mut link = Link::hardware(port, 9_600);

        assert_eq!(link.write(b"S4\n"), WriteStatus::Streamed);
        assert_eq!(written.borrow().as_slice(), b"S4\n");
    }

    #[test]
    fn test_serial_write_error_is_swallowed() {
        let port = MockPort::new().failing_writes();
        let mut link = Link::software(port, 9_600);
        assert_eq!(link.write(b"S4\n"), WriteStatus::Streamed);
    }

    #[test]
    fn test_serial_reads_one_byte_at_a_time() {
        let port = MockPort::with_input(b"OK");
        let mut link = Link::hardware(port, 9_600);

        assert_eq!(link.request(8), 0);
        assert!(link.available());
        assert_eq!(link.read_byte(), Some(b'O'));
        assert_eq!(link.read_byte(), Some(b'K'));
        assert!(!link.available());
        assert_eq!(link.read_byte(), None);
    }

    #[test]
    fn test_bus_write_reports_status() {
        let bus = MockBus::new();
        let log = bus.log();
        let mut link = Link::bus(bus, 0x10);

        assert_eq!(link.write(b"FO33|5\n"), WriteStatus::Bus(BusStatus::Success));
        let log = log.borrow();
        assert_eq!(log.writes.len(), 1);
        assert_eq!(log.writes[0], (0x10, vec![b'F', b'O', b'3', b'3', b'|', b'5', b'\n']));
    }

    #[test]
    fn test_bus_write_maps_errors() {
        let bus = MockBus::new().with_write_results(&[
            Err(ErrorKind::NoAcknowledge(embedded_hal::i2c::NoAcknowledgeSource::Address)),
            Err(ErrorKind::NoAcknowledge(embedded_hal::i2c::NoAcknowledgeSource::Data)),
            Err(ErrorKind::Bus),
        ]);
        let mut link = Link::bus(bus, 0x10);

        assert_eq!(link.write(b"S4\n"), WriteStatus::Bus(BusStatus::AddressNack));
        assert_eq!(link.write(b"S4\n"), WriteStatus::Bus(BusStatus::DataNack));
        assert_eq!(link.write(b"S4\n"), WriteStatus::Bus(BusStatus::Other));
        assert_eq!(link.write(b"S4\n"), WriteStatus::Bus(BusStatus::Success));
    }

    #[test]
    fn test_bus_rejects_oversized_frame_without_writing() {
        let bus = MockBus::new();
        let log = bus.log();
        let mut link = Link::bus(bus, 0x10);

        let frame = [b'x'; BUS_BUFFER_LEN + 1];
        assert_eq!(link.write(&frame), WriteStatus::Bus(BusStatus::DataTooLong));
        assert!(log.borrow().writes.is_empty());
    }

    #[test]
    fn test_bus_request_then_drain() {
        let bus = MockBus::new().with_response(b"QD,1");
        let log = bus.log();
        let mut link = Link::bus(bus, 0x10);

        assert!(!link.available());
        assert_eq!(link.request(8), 8);
        assert_eq!(log.borrow().reads, vec![(0x10, 8)]);

        let mut got = vec![];
        while link.available() {
            got.push(link.read_byte().unwrap());
        }
        // Short responses are padded out to the requested length
        assert_eq!(&got[..4], b"QD,1");
        assert_eq!(got.len(), 8);
        assert_eq!(link.read_byte(), None);
    }

    #[test]
    fn test_bus_request_failure_yields_nothing() {
        let bus = MockBus::new().absent();
        let mut link = Link::bus(bus, 0x10);

        assert_eq!(link.request(8), 0);
        assert!(!link.available());
    }

    #[test]
    fn test_slow_failed_write_times_out_and_resets() {
        let bus = MockBus::new().with_write_results(&[DATA_NACK]);
        let guard = SteppingGuard::new(4_000);
        let resets = guard.resets();
        let mut link = Link::guarded_bus(bus, BusConfig::new(0x19), guard);

        assert_eq!(link.write(b"S4\n"), WriteStatus::Bus(BusStatus::Timeout));
        assert_eq!(resets.get(), 1);
    }

    #[test]
    fn test_timeout_without_reset_leaves_bus_alone() {
        let bus = MockBus::new().with_write_results(&[DATA_NACK]);
        let guard = SteppingGuard::new(4_000);
        let resets = guard.resets();
        let config = BusConfig {
            reset_on_timeout: false,
            ..BusConfig::new(0x19)
        };
        let mut link = Link::guarded_bus(bus, config, guard);

        assert_eq!(link.write(b"S4\n"), WriteStatus::Bus(BusStatus::Timeout));
        assert_eq!(resets.get(), 0);
    }

    #[test]
    fn test_fast_failure_keeps_its_status() {
        let bus = MockBus::new().with_write_results(&[DATA_NACK]);
        let guard = SteppingGuard::new(BUS_TIMEOUT_US.into());
        let resets = guard.resets();
        let mut link = Link::guarded_bus(bus, BusConfig::new(0x19), guard);

        assert_eq!(link.write(b"S4\n"), WriteStatus::Bus(BusStatus::DataNack));
        assert_eq!(resets.get(), 0);
    }

    #[test]
    fn test_slow_success_is_still_success() {
        let guard = SteppingGuard::new(10_000);
        let resets = guard.resets();
        let mut link = Link::guarded_bus(MockBus::new(), BusConfig::new(0x19), guard);

        assert_eq!(link.write(b"S4\n"), WriteStatus::Bus(BusStatus::Success));
        assert_eq!(resets.get(), 0);
    }

    #[test]
    fn test_timed_out_request_yields_nothing() {
        let bus = MockBus::new().absent();
        let guard = SteppingGuard::new(4_000);
        let resets = guard.resets();
        let mut link = Link::guarded_bus(bus, BusConfig::new(0x19), guard);

        assert_eq!(link.request(8), 0);
        assert!(!link.available());
        assert_eq!(resets.get(), 1);
    }

    #[test]
    fn test_custom_timeout_is_honored() {
        let bus = MockBus::new().with_write_results(&[DATA_NACK, DATA_NACK]);
        let guard = SteppingGuard::new(4_000);
        let config = BusConfig {
            timeout_us: 5_000,
            ..BusConfig::new(0x19)
        };
        let mut link = Link::guarded_bus(bus, config, guard);

        assert_eq!(link.write(b"S4\n"), WriteStatus::Bus(BusStatus::DataNack));
    }

    #[test]
    fn test_unconfigured_is_inert() {
        let mut link = Link::unconfigured();
        assert_eq!(link.write(b"S4\n"), WriteStatus::NoLink);
        assert_eq!(link.request(8), 0);
        assert!(!link.available());
        assert_eq!(link.read_byte(), None);
    }
}
