//! Byte-level transport capability and bus status codes.

/// How a transport moves bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkMode {
    /// Continuous serial byte stream, no write feedback.
    Stream,
    /// Addressed request/response transactions with a status per write.
    Transaction,
    /// No link configured; everything is a no-op.
    Detached,
}

/// Completion code of a bus write, numbered like the Arduino `Wire` driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum BusStatus {
    Success = 0,
    /// Frame does not fit the bus transmit buffer; nothing was sent.
    DataTooLong = 1,
    /// Address not acknowledged.
    AddressNack = 2,
    /// Data byte not acknowledged.
    DataNack = 3,
    /// Bus error, arbitration loss, overrun, or anything unclassified.
    Other = 4,
    /// Transaction timed out.
    Timeout = 5,
}

impl BusStatus {
    /// Highest status that is not treated as a bus fault.
    pub const FAULT_THRESHOLD: u8 = Self::AddressNack as u8;

    #[inline]
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }

    #[inline]
    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }

    /// Whether the peripheral looks unresponsive and a retry may help.
    #[inline]
    #[must_use]
    pub const fn is_fault(self) -> bool {
        self.code() > Self::FAULT_THRESHOLD
    }

    /// Classify an `embedded-hal` I2C error.
    #[must_use]
    pub fn from_i2c_error<E: embedded_hal::i2c::Error>(err: &E) -> Self {
        use embedded_hal::i2c::{ErrorKind, NoAcknowledgeSource};

        match err.kind() {
            ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address) => Self::AddressNack,
            ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data) => Self::DataNack,
            _ => Self::Other,
        }
    }
}

impl core::fmt::Display for BusStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::DataTooLong => write!(f, "data too long"),
            Self::AddressNack => write!(f, "address nack"),
            Self::DataNack => write!(f, "data nack"),
            Self::Other => write!(f, "bus error"),
            Self::Timeout => write!(f, "timeout"),
        }
    }
}

/// Result of handing one frame to a transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WriteStatus {
    /// Written to a stream; streams report nothing back.
    Streamed,
    /// Bus transaction finished with this status.
    Bus(BusStatus),
    /// No link configured.
    NoLink,
}

/// Uniform byte capability over every link kind.
///
/// Stream links read continuously. Transaction links must be asked for data
/// with [`Transport::request`] before [`Transport::available`] can report
/// anything.
pub trait Transport {
    /// Link kind, used to pick write and poll policy.
    fn mode(&self) -> LinkMode;

    /// Write one complete frame.
    fn write(&mut self, frame: &[u8]) -> WriteStatus;

    /// Ask the peripheral for up to `len` bytes and return how many arrived.
    ///
    /// Stream links have nothing to request and return 0.
    fn request(&mut self, len: usize) -> usize {
        let _ = len;
        0
    }

    /// Whether a byte can be read without blocking.
    fn available(&mut self) -> bool;

    /// Read one byte, or `None` if nothing is pending.
    fn read_byte(&mut self) -> Option<u8>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn mode(&self) -> LinkMode {
        T::mode(self)
    }

    fn write(&mut self, frame: &[u8]) -> WriteStatus {
        T::write(self, frame)
    }

    fn request(&mut self, len: usize) -> usize {
        T::request(self, len)
    }

    fn available(&mut self) -> bool {
        T::available(self)
    }

    fn read_byte(&mut self) -> Option<u8> {
        T::read_byte(self)
    }
}
