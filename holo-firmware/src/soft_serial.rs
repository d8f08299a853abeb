//! PIO software UART as a blocking `embedded-io` port.
//!
//! The PIO UART programs only expose async byte reads and writes, while
//! [`holo_core::Link`] drives its ports synchronously from the device task.
//! Writes block until every byte is in the TX FIFO; readiness is checked by
//! polling a read once and parking the byte if one arrived.

use core::task::Poll;

use embassy_futures::{block_on, poll_once};
use embassy_rp::pio::Instance;
use embassy_rp::pio_programs::uart::{PioUartRx, PioUartTx};
use embedded_io::{ErrorKind, ErrorType, Read, ReadReady, Write};

/// Two PIO state machines acting as one serial port.
pub struct SoftSerial<'d, PIO: Instance, const TX: usize, const RX: usize> {
    tx: PioUartTx<'d, PIO, TX>,
    rx: PioUartRx<'d, PIO, RX>,
    parked: Option<u8>,
}

impl<'d, PIO: Instance, const TX: usize, const RX: usize> SoftSerial<'d, PIO, TX, RX> {
    pub fn new(tx: PioUartTx<'d, PIO, TX>, rx: PioUartRx<'d, PIO, RX>) -> Self {
        Self {
            tx,
            rx,
            parked: None,
        }
    }
}

impl<PIO: Instance, const TX: usize, const RX: usize> ErrorType for SoftSerial<'_, PIO, TX, RX> {
    type Error = ErrorKind;
}

impl<PIO: Instance, const TX: usize, const RX: usize> Read for SoftSerial<'_, PIO, TX, RX> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let Some(slot) = buf.first_mut() else {
            return Ok(0);
        };
        *slot = match self.parked.take() {
            Some(byte) => byte,
            None => block_on(self.rx.read_u8()),
        };
        Ok(1)
    }
}

impl<PIO: Instance, const TX: usize, const RX: usize> ReadReady for SoftSerial<'_, PIO, TX, RX> {
    fn read_ready(&mut self) -> Result<bool, Self::Error> {
        if self.parked.is_none() {
            if let Poll::Ready(byte) = block_on(poll_once(self.rx.read_u8())) {
                self.parked = Some(byte);
            }
        }
        Ok(self.parked.is_some())
    }
}

impl<PIO: Instance, const TX: usize, const RX: usize> Write for SoftSerial<'_, PIO, TX, RX> {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        for &byte in buf {
            block_on(self.tx.write_u8(byte));
        }
        Ok(buf.len())
    }

    // The state machine shifts out whatever is in its FIFO on its own
    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}
