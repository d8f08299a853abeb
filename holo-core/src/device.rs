//! Holoprojector device: link, scheduler, transmitter and receiver in one.

use embedded_hal::delay::DelayNs;
use holo_proto::{Command, SerializeError, ValidationError, WireFrame};

use crate::receive::{
    self, FrameAssembler, Framing, LogResponses, PollOutcome, ResponseHandler,
    DEFAULT_BUS_REQUEST_LEN, RX_BUFFER_SIZE,
};
use crate::schedule::{Clock, Schedule, DEFAULT_REFRESH_MS};
use crate::transmit::{Delivery, Transmitter, DEFAULT_RETRY_DELAY_MS};
use crate::transport::{LinkMode, Transport};

/// Runtime tuning for a [`Holoprojector`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HoloConfig {
    /// Status query interval used by [`Holoprojector::initialize`].
    pub refresh_ms: u32,
    /// Pause before the single retry of a faulted bus write.
    pub retry_delay_ms: u32,
    /// Bytes requested from a bus peripheral on every update.
    pub bus_request_len: usize,
}

impl Default for HoloConfig {
    fn default() -> Self {
        Self {
            refresh_ms: DEFAULT_REFRESH_MS,
            retry_delay_ms: DEFAULT_RETRY_DELAY_MS,
            bus_request_len: DEFAULT_BUS_REQUEST_LEN,
        }
    }
}

/// One holoprojector peripheral on one link.
///
/// Command methods are fire-and-forget: invalid arguments and failed writes
/// are logged and otherwise ignored. Use [`Holoprojector::send`] to observe
/// what happened to a command.
///
/// Call [`Holoprojector::update`] from the main loop; it sends the periodic
/// status query and feeds inbound bytes to the response handler.
///
/// # Example
///
/// ```
/// use embedded_hal::delay::DelayNs;
/// use holo_core::{Clock, Holoprojector, Link};
///
/// struct Millis;
/// impl Clock for Millis {
///     fn now_ms(&self) -> u64 {
///         0
///     }
/// }
///
/// struct NoDelay;
/// impl DelayNs for NoDelay {
///     fn delay_ns(&mut self, _ns: u32) {}
/// }
///
/// let mut holo = Holoprojector::new(Link::unconfigured(), Millis, NoDelay);
/// holo.initialize();
/// holo.set_color("f", 5, None);
/// holo.update();
/// ```
pub struct Holoprojector<L, C, D, H = LogResponses, const N: usize = RX_BUFFER_SIZE> {
    link: L,
    clock: C,
    transmitter: Transmitter<D>,
    handler: H,
    assembler: FrameAssembler<N>,
    schedule: Schedule,
    config: HoloConfig,
}

impl<L, C, D> Holoprojector<L, C, D>
where
    L: Transport,
    C: Clock,
    D: DelayNs,
{
    /// Device on `link` with default settings that logs responses.
    pub fn new(link: L, clock: C, delay: D) -> Self {
        let config = HoloConfig::default();
        Self {
            link,
            clock,
            transmitter: Transmitter::with_retry_delay(delay, config.retry_delay_ms),
            handler: LogResponses,
            assembler: FrameAssembler::new(),
            schedule: Schedule::Idle,
            config,
        }
    }
}

impl<L, C, D, H, const N: usize> Holoprojector<L, C, D, H, N>
where
    L: Transport,
    C: Clock,
    D: DelayNs,
    H: ResponseHandler,
{
    /// Replace the response handler.
    pub fn with_handler<H2: ResponseHandler>(self, handler: H2) -> Holoprojector<L, C, D, H2, N> {
        Holoprojector {
            link: self.link,
            clock: self.clock,
            transmitter: self.transmitter,
            handler,
            assembler: self.assembler,
            schedule: self.schedule,
            config: self.config,
        }
    }

    /// Use a receive buffer of `M` bytes instead of the default.
    pub fn with_buffer<const M: usize>(self) -> Holoprojector<L, C, D, H, M> {
        Holoprojector {
            link: self.link,
            clock: self.clock,
            transmitter: self.transmitter,
            handler: self.handler,
            assembler: FrameAssembler::with_framing(self.assembler.framing()),
            schedule: self.schedule,
            config: self.config,
        }
    }

    pub fn with_framing(mut self, framing: Framing) -> Self {
        self.assembler.set_framing(framing);
        self
    }

    pub fn with_config(mut self, config: HoloConfig) -> Self {
        self.transmitter.set_retry_delay_ms(config.retry_delay_ms);
        self.config = config;
        self
    }

    /// Start polling every [`HoloConfig::refresh_ms`].
    pub fn initialize(&mut self) {
        self.initialize_with_refresh(self.config.refresh_ms);
    }

    /// Start polling every `refresh_ms`; zero disables the status query.
    pub fn initialize_with_refresh(&mut self, refresh_ms: u32) {
        match self.link.mode() {
            LinkMode::Stream => info!("holoprojector on serial, refresh {} ms", refresh_ms),
            LinkMode::Transaction => info!("holoprojector on bus, refresh {} ms", refresh_ms),
            LinkMode::Detached => warn!("holoprojector has no link, commands are dropped"),
        }
        self.assembler.reset();
        self.schedule = Schedule::new(refresh_ms, self.clock.now_ms());
    }

    /// Run one cooperative step: query status if due, then poll for bytes.
    pub fn update(&mut self) -> PollOutcome {
        if self.schedule.tick(self.clock.now_ms()) {
            // Status queries are never retried; the next one is a refresh away
            match Command::status_query().to_frame() {
                Ok(frame) => {
                    let _ = self
                        .transmitter
                        .send_attempt(&mut self.link, frame.as_bytes(), true);
                }
                Err(e) => warn!("status query not encoded: {}", e),
            }
        }
        receive::poll(
            &mut self.link,
            &mut self.assembler,
            &mut self.handler,
            self.config.bus_request_len,
        )
    }

    /// Serialize and transmit `command`, reporting the outcome.
    pub fn send(&mut self, command: &Command) -> Delivery {
        self.send_encoded(command.to_frame())
    }

    fn send_encoded(&mut self, encoded: Result<WireFrame, SerializeError>) -> Delivery {
        match encoded {
            Ok(frame) => {
                trace!("sending {}", frame.payload_str());
                self.transmitter.send(&mut self.link, frame.as_bytes())
            }
            Err(e) => {
                warn!("command not encoded: {}", e);
                Delivery::Unencodable(e)
            }
        }
    }

    fn submit(&mut self, command: Result<Command, ValidationError>) {
        match command {
            Ok(command) => {
                let _ = self.send(&command);
            }
            Err(e) => debug!("command rejected: {}", e),
        }
    }

    /// Trigger the Leia sequence.
    pub fn leia(&mut self) {
        self.submit(Ok(Command::leia()));
    }

    /// Stop all servos and lights.
    pub fn stop(&mut self) {
        self.submit(Ok(Command::stop()));
    }

    pub fn stop_lights(&mut self) {
        self.submit(Ok(Command::stop_lights()));
    }

    pub fn stop_servos(&mut self) {
        self.submit(Ok(Command::stop_servos()));
    }

    /// Hold `color` (0-9, 0 random) on `target`, optionally for `duration`
    /// seconds.
    pub fn set_color(&mut self, target: &str, color: i32, duration: Option<i32>) {
        self.submit(Command::set_color(target, color, duration));
    }

    pub fn set_color_all(&mut self, color: i32, duration: Option<i32>) {
        self.set_color("A", color, duration);
    }

    /// Pulse `color` on `target`, optionally for `duration` seconds.
    pub fn pulse(&mut self, target: &str, color: i32, duration: Option<i32>) {
        self.submit(Command::pulse(target, color, duration));
    }

    pub fn pulse_all(&mut self, color: i32, duration: Option<i32>) {
        self.pulse("A", color, duration);
    }

    /// Rainbow sequence on `target`, optionally for `duration` seconds.
    pub fn rainbow(&mut self, target: &str, duration: Option<i32>) {
        self.submit(Command::rainbow(target, duration));
    }

    pub fn rainbow_all(&mut self, duration: Option<i32>) {
        self.rainbow("A", duration);
    }

    #[inline]
    pub fn link(&self) -> &L {
        &self.link
    }

    #[inline]
    pub fn link_mut(&mut self) -> &mut L {
        &mut self.link
    }

    #[inline]
    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    #[inline]
    pub fn config(&self) -> &HoloConfig {
        &self.config
    }

    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }

    /// Bytes received since the last dispatched frame.
    pub fn pending(&self) -> &[u8] {
        self.assembler.pending()
    }

    /// Decompose into link, clock, delay and handler.
    pub fn into_parts(self) -> (L, C, D, H) {
        (
            self.link,
            self.clock,
            self.transmitter.into_inner(),
            self.handler,
        )
    }
}
