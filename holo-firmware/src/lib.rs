//! Holoprojector controller firmware for RP2040.
//!
//! Drives a holoprojector peripheral from a Raspberry Pi Pico over I2C, a
//! hardware UART or a PIO software UART, using [`holo_core`] for framing,
//! retries and status polling.
//!
//! # Hardware Configuration
//!
//! | Function | GPIO | Feature |
//! |----------|------|---------|
//! | I2C0 SDA | 4    | `link-bus` |
//! | I2C0 SCL | 5    | `link-bus` |
//! | UART1 TX | 8    | `link-serial` |
//! | UART1 RX | 9    | `link-serial` |
//! | PIO0 TX  | 12   | `link-soft-serial` |
//! | PIO0 RX  | 13   | `link-soft-serial` |
//! | LED      | 25   | heartbeat while the device task runs |
//!
//! # Architecture
//!
//! Two Embassy tasks share a command [`Channel`]:
//!
//! - **Show Task**: Queues light show commands on a fixed script
//! - **Holo Task**: Owns the device, sends queued commands and calls
//!   `update()` on every tick
//!
//! # Features
//!
//! - **`dev-panic`** (default): Use `panic-probe` for development (prints panic info via RTT)
//! - **`prod-panic`**: Use `panic-reset` for production (silent watchdog reset)
//! - **`link-bus`** (default): Talk to the peripheral over I2C
//! - **`link-serial`**: Talk to the peripheral over UART
//! - **`link-soft-serial`**: Talk to the peripheral over a PIO software UART
//!
//! Exactly one `link-*` feature must be enabled.

#![no_std]

#[cfg(any(
    all(feature = "link-bus", feature = "link-serial"),
    all(feature = "link-bus", feature = "link-soft-serial"),
    all(feature = "link-serial", feature = "link-soft-serial"),
))]
compile_error!("Only one of `link-bus`, `link-serial` and `link-soft-serial` may be enabled");

#[cfg(not(any(feature = "link-bus", feature = "link-serial", feature = "link-soft-serial")))]
compile_error!("Enable one of `link-bus`, `link-serial` or `link-soft-serial` to pick a link");

#[cfg(feature = "link-soft-serial")]
pub mod soft_serial;

use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_time::{Delay, Duration, Instant, Ticker};
use holo_core::{Clock, Delivery, Holoprojector, ResponseHandler, Transport};
use holo_proto::{Command, Response};

// Re-export core types for convenience
pub use holo_core::{
    BusConfig, Framing, HoloConfig, Link, DEFAULT_BUS_CLOCK_HZ, DEFAULT_REFRESH_MS,
    DEFAULT_SERIAL_BAUD,
};

/// I2C address of the holoprojector controller.
pub const HOLO_ADDRESS: u8 = 0x19;

/// How often the device task runs `update()`.
pub const UPDATE_PERIOD: Duration = Duration::from_millis(5);

/// Commands waiting for the device task.
pub type CommandQueue = Channel<CriticalSectionRawMutex, Command, 4>;

/// Millisecond clock backed by the Embassy time driver.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbassyClock;

impl Clock for EmbassyClock {
    #[inline]
    fn now_ms(&self) -> u64 {
        Instant::now().as_millis()
    }
}

/// Logs the response code and first value of each status frame.
#[derive(Debug, Default)]
pub struct StatusLogger;

impl ResponseHandler for StatusLogger {
    fn on_frame(&mut self, frame: &[u8]) {
        let response = Response::new(frame);
        if response.is_empty() {
            return;
        }
        match (response.code(), response.field_u32(1)) {
            (Some(code), Some(value)) => {
                defmt::info!("status {=[u8]:a} = {}", code, value);
            }
            _ => defmt::debug!("status {=[u8]:a}", response.body()),
        }
    }
}

/// Board device type: Embassy clock and delay, logged responses.
pub type Device<L> = Holoprojector<L, EmbassyClock, Delay, StatusLogger>;

/// Build and start a device on `link` with the default refresh.
pub fn start<L: Transport>(link: L) -> Device<L> {
    let mut holo = Holoprojector::new(link, EmbassyClock, Delay).with_handler(StatusLogger);
    holo.initialize();
    holo
}

/// Serve queued commands and run `update()` every [`UPDATE_PERIOD`].
///
/// `on_update` runs after each update, e.g. to drive a heartbeat LED.
pub async fn run<L: Transport>(
    holo: &mut Device<L>,
    queue: &CommandQueue,
    mut on_update: impl FnMut(),
) -> ! {
    let mut ticker = Ticker::every(UPDATE_PERIOD);
    loop {
        match select(queue.receive(), ticker.next()).await {
            Either::First(command) => match holo.send(&command) {
                Delivery::Sent | Delivery::Retried => {
                    defmt::debug!("sent {}", command.opcode());
                }
                Delivery::Unencodable(e) => {
                    defmt::error!("{} could not be encoded: {}", command.opcode(), e);
                }
                other => defmt::warn!("{} not delivered: {}", command.opcode(), other),
            },
            Either::Second(()) => {
                holo.update();
                on_update();
            }
        }
    }
}
