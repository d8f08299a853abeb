//! Frame transmission with a single retry on bus faults.

use embedded_hal::delay::DelayNs;
use holo_proto::SerializeError;

use crate::transport::{BusStatus, Transport, WriteStatus};

/// Pause before retrying a faulted bus write.
pub const DEFAULT_RETRY_DELAY_MS: u32 = 100;

/// What happened to a frame handed to the [`Transmitter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Delivery {
    /// Written on the first attempt (or streamed).
    Sent,
    /// First bus attempt faulted, the retry went through.
    Retried,
    /// Given up with this final bus status.
    Dropped(BusStatus),
    /// Nothing to send.
    Empty,
    /// The command could not be serialized; nothing was written.
    Unencodable(SerializeError),
    /// No link configured.
    NoLink,
}

impl Delivery {
    /// Whether the frame reached the wire.
    #[inline]
    #[must_use]
    pub const fn is_delivered(self) -> bool {
        matches!(self, Self::Sent | Self::Retried)
    }
}

/// Writes frames to a [`Transport`], retrying a faulted bus write once.
///
/// Serial writes report nothing back and are never retried. A bus write
/// whose status is a fault ([`BusStatus::is_fault`]) is retried after
/// `retry_delay_ms`, unless it was already a retry.
pub struct Transmitter<D> {
    delay: D,
    retry_delay_ms: u32,
}

impl<D: DelayNs> Transmitter<D> {
    pub fn new(delay: D) -> Self {
        Self::with_retry_delay(delay, DEFAULT_RETRY_DELAY_MS)
    }

    pub fn with_retry_delay(delay: D, retry_delay_ms: u32) -> Self {
        Self {
            delay,
            retry_delay_ms,
        }
    }

    #[inline]
    #[must_use]
    pub fn retry_delay_ms(&self) -> u32 {
        self.retry_delay_ms
    }

    pub fn set_retry_delay_ms(&mut self, retry_delay_ms: u32) {
        self.retry_delay_ms = retry_delay_ms;
    }

    pub fn into_inner(self) -> D {
        self.delay
    }

    /// Send a fresh frame; a bus fault earns one retry.
    pub fn send<T: Transport>(&mut self, link: &mut T, frame: &[u8]) -> Delivery {
        self.send_attempt(link, frame, false)
    }

    /// Send `frame`. With `is_retry` set, a fault is final.
    pub fn send_attempt<T: Transport>(
        &mut self,
        link: &mut T,
        frame: &[u8],
        is_retry: bool,
    ) -> Delivery {
        if frame.is_empty() {
            return Delivery::Empty;
        }

        match link.write(frame) {
            WriteStatus::Streamed => Delivery::Sent,
            WriteStatus::NoLink => Delivery::NoLink,
            WriteStatus::Bus(BusStatus::Success) => Delivery::Sent,
            WriteStatus::Bus(status) if status.is_fault() && !is_retry => {
                debug!("bus fault {}, retrying in {} ms", status, self.retry_delay_ms);
                self.delay.delay_ms(self.retry_delay_ms);
                match self.send_attempt(link, frame, true) {
                    Delivery::Sent => Delivery::Retried,
                    other => other,
                }
            }
            WriteStatus::Bus(status) => {
                warn!("bus write dropped: {}", status);
                Delivery::Dropped(status)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use crate::link::{BusConfig, Link};
    use crate::testing::{MockBus, MockPort, RecordingDelay, SteppingGuard};
    use embedded_hal::i2c::{ErrorKind, NoAcknowledgeSource};

    const DATA_NACK: Result<(), ErrorKind> =
        Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data));

    #[test]
    fn test_empty_frame_is_noop() {
        let bus = MockBus::new();
        let log = bus.log();
        let mut link = Link::bus(bus, 0x10);
        let mut tx = Transmitter::new(RecordingDelay::new());

        assert_eq!(tx.send(&mut link, b""), Delivery::Empty);
        assert!(log.borrow().writes.is_empty());
    }

    #[test]
    fn test_bus_success_single_write() {
        let bus = MockBus::new();
        let log = bus.log();
        let mut link = Link::bus(bus, 0x10);
        let delay = RecordingDelay::new();
        let mut tx = Transmitter::new(delay.clone());

        assert_eq!(tx.send(&mut link, b"S4\n"), Delivery::Sent);
        assert_eq!(log.borrow().writes.len(), 1);
        assert_eq!(delay.total_ms(), 0);
    }

    #[test]
    fn test_fault_then_success_writes_twice() {
        let bus = MockBus::new().with_write_results(&[DATA_NACK]);
        let log = bus.log();
        let mut link = Link::bus(bus, 0x10);
        let delay = RecordingDelay::new();
        let mut tx = Transmitter::new(delay.clone());

        assert_eq!(tx.send(&mut link, b"FO33|5\n"), Delivery::Retried);
        let log = log.borrow();
        assert_eq!(log.writes.len(), 2);
        assert_eq!(log.writes[0], log.writes[1]);
        assert_eq!(delay.total_ms(), 100);
    }

    #[test]
    fn test_fault_twice_never_writes_a_third_time() {
        let bus = MockBus::new().with_write_results(&[DATA_NACK, Err(ErrorKind::Bus), Ok(())]);
        let log = bus.log();
        let mut link = Link::bus(bus, 0x10);
        let delay = RecordingDelay::new();
        let mut tx = Transmitter::new(delay.clone());

        assert_eq!(
            tx.send(&mut link, b"S4\n"),
            Delivery::Dropped(BusStatus::Other)
        );
        assert_eq!(log.borrow().writes.len(), 2);
        assert_eq!(delay.total_ms(), 100);
    }

    #[test]
    fn test_retry_flag_suppresses_retry() {
        let bus = MockBus::new().with_write_results(&[DATA_NACK]);
        let log = bus.log();
        let mut link = Link::bus(bus, 0x10);
        let delay = RecordingDelay::new();
        let mut tx = Transmitter::new(delay.clone());

        assert_eq!(
            tx.send_attempt(&mut link, b"<QD>\n", true),
            Delivery::Dropped(BusStatus::DataNack)
        );
        assert_eq!(log.borrow().writes.len(), 1);
        assert_eq!(delay.total_ms(), 0);
    }

    #[test]
    fn test_address_nack_is_not_retried() {
        let bus = MockBus::new().with_write_results(&[Err(ErrorKind::NoAcknowledge(
            NoAcknowledgeSource::Address,
        ))]);
        let log = bus.log();
        let mut link = Link::bus(bus, 0x10);
        let mut tx = Transmitter::new(RecordingDelay::new());

        assert_eq!(
            tx.send(&mut link, b"S4\n"),
            Delivery::Dropped(BusStatus::AddressNack)
        );
        assert_eq!(log.borrow().writes.len(), 1);
    }

    #[test]
    fn test_serial_is_never_retried() {
        let port = MockPort::new().failing_writes();
        let mut link = Link::hardware(port, 9_600);
        let delay = RecordingDelay::new();
        let mut tx = Transmitter::new(delay.clone());

        assert_eq!(tx.send(&mut link, b"S4\n"), Delivery::Sent);
        assert_eq!(delay.total_ms(), 0);
    }

    #[test]
    fn test_custom_retry_delay() {
        let bus = MockBus::new().with_write_results(&[Err(ErrorKind::Overrun)]);
        let mut link = Link::bus(bus, 0x10);
        let delay = RecordingDelay::new();
        let mut tx = Transmitter::with_retry_delay(delay.clone(), 20);

        assert_eq!(tx.send(&mut link, b"S4\n"), Delivery::Retried);
        assert_eq!(delay.total_ms(), 20);
    }

    #[test]
    fn test_timed_out_write_is_retried() {
        let bus = MockBus::new().with_write_results(&[DATA_NACK, DATA_NACK]);
        let log = bus.log();
        let mut link = Link::guarded_bus(bus, BusConfig::new(0x19), SteppingGuard::new(5_000));
        let delay = RecordingDelay::new();
        let mut tx = Transmitter::new(delay.clone());

        assert_eq!(
            tx.send(&mut link, b"S4\n"),
            Delivery::Dropped(BusStatus::Timeout)
        );
        assert_eq!(log.borrow().writes.len(), 2);
        assert_eq!(delay.total_ms(), 100);
    }

    #[test]
    fn test_unconfigured_link() {
        let mut link = Link::unconfigured();
        let mut tx = Transmitter::new(RecordingDelay::new());
        assert_eq!(tx.send(&mut link, b"S4\n"), Delivery::NoLink);
        assert!(!Delivery::NoLink.is_delivered());
        assert!(Delivery::Retried.is_delivered());
    }
}
