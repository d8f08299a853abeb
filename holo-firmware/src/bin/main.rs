#![no_std]
#![no_main]

use defmt::info;
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_rp::gpio::{Level, Output};
use embassy_time::Timer;
use holo_firmware::{run, start, CommandQueue, Device};
use holo_proto::{Color, Command, CommandBuilder, Opcode};
use static_cell::StaticCell;

#[cfg(feature = "dev-panic")]
use panic_probe as _;
#[cfg(feature = "prod-panic")]
use panic_reset as _;

#[cfg(feature = "link-bus")]
mod board {
    use embassy_rp::i2c::{Blocking, Config as I2cConfig, I2c};
    use embassy_rp::peripherals::{I2C0, PIN_4, PIN_5};
    use embassy_rp::Peri;
    use embassy_time::Instant;
    use holo_core::{BusGuard, Detached};
    use holo_firmware::{BusConfig, Link, HOLO_ADDRESS};

    pub type Bus = I2c<'static, I2C0, Blocking>;
    pub type BoardLink = Link<Detached, Detached, Bus, I2c0Guard>;

    /// Times I2C0 transactions and aborts a stuck transfer.
    pub struct I2c0Guard;

    impl BusGuard<Bus> for I2c0Guard {
        fn now_us(&self) -> Option<u64> {
            Some(Instant::now().as_micros())
        }

        fn reset(&mut self, _bus: &mut Bus) {
            let regs = embassy_rp::pac::I2C0;
            regs.ic_enable().modify(|w| w.set_abort(true));
            // Hardware clears the bit once both FIFOs are flushed
            for _ in 0..1_000 {
                if !regs.ic_enable().read().abort() {
                    break;
                }
            }
            defmt::warn!("I2C0 transfer aborted");
        }
    }

    pub fn link(i2c: Peri<'static, I2C0>, scl: Peri<'static, PIN_5>, sda: Peri<'static, PIN_4>) -> BoardLink {
        let bus_config = BusConfig::new(HOLO_ADDRESS);
        let mut config = I2cConfig::default();
        config.frequency = bus_config.clock_hz;
        let bus = I2c::new_blocking(i2c, scl, sda, config);
        Link::guarded_bus(bus, bus_config, I2c0Guard)
    }
}

#[cfg(feature = "link-serial")]
mod board {
    use embassy_rp::bind_interrupts;
    use embassy_rp::peripherals::{PIN_8, PIN_9, UART1};
    use embassy_rp::uart::{BufferedInterruptHandler, BufferedUart, Config as UartConfig};
    use embassy_rp::Peri;
    use holo_firmware::{Link, DEFAULT_SERIAL_BAUD};
    use static_cell::StaticCell;

    bind_interrupts!(struct Irqs {
        UART1_IRQ => BufferedInterruptHandler<UART1>;
    });

    static TX_BUF: StaticCell<[u8; 64]> = StaticCell::new();
    static RX_BUF: StaticCell<[u8; 64]> = StaticCell::new();

    pub type BoardLink = Link<BufferedUart>;

    pub fn link(uart: Peri<'static, UART1>, tx: Peri<'static, PIN_8>, rx: Peri<'static, PIN_9>) -> BoardLink {
        let mut config = UartConfig::default();
        config.baudrate = DEFAULT_SERIAL_BAUD;
        let uart = BufferedUart::new(
            uart,
            tx,
            rx,
            Irqs,
            TX_BUF.init([0; 64]),
            RX_BUF.init([0; 64]),
            config,
        );
        Link::hardware(uart, DEFAULT_SERIAL_BAUD)
    }
}

#[cfg(feature = "link-soft-serial")]
mod board {
    use embassy_rp::bind_interrupts;
    use embassy_rp::peripherals::{PIN_12, PIN_13, PIO0};
    use embassy_rp::pio::{Common, InterruptHandler, Pio};
    use embassy_rp::pio_programs::uart::{PioUartRx, PioUartRxProgram, PioUartTx, PioUartTxProgram};
    use embassy_rp::Peri;
    use holo_core::Detached;
    use holo_firmware::soft_serial::SoftSerial;
    use holo_firmware::{Link, DEFAULT_SERIAL_BAUD};
    use static_cell::StaticCell;

    bind_interrupts!(struct Irqs {
        PIO0_IRQ_0 => InterruptHandler<PIO0>;
    });

    static COMMON: StaticCell<Common<'static, PIO0>> = StaticCell::new();

    pub type BoardLink = Link<Detached, SoftSerial<'static, PIO0, 0, 1>>;

    pub fn link(pio: Peri<'static, PIO0>, tx: Peri<'static, PIN_12>, rx: Peri<'static, PIN_13>) -> BoardLink {
        let Pio { common, sm0, sm1, .. } = Pio::new(pio, Irqs);
        let common = COMMON.init(common);
        let tx_program = PioUartTxProgram::new(common);
        let rx_program = PioUartRxProgram::new(common);
        let tx = PioUartTx::new(DEFAULT_SERIAL_BAUD, common, sm0, tx, &tx_program);
        let rx = PioUartRx::new(DEFAULT_SERIAL_BAUD, common, sm1, rx, &rx_program);
        Link::software(SoftSerial::new(tx, rx), DEFAULT_SERIAL_BAUD)
    }
}

/// Commands from the show task to the device task.
static COMMANDS: StaticCell<CommandQueue> = StaticCell::new();

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Holoprojector controller starting...");

    let p = embassy_rp::init(embassy_rp::config::Config::default());

    #[cfg(feature = "link-bus")]
    let link = board::link(p.I2C0, p.PIN_5, p.PIN_4);
    #[cfg(feature = "link-serial")]
    let link = board::link(p.UART1, p.PIN_8, p.PIN_9);
    #[cfg(feature = "link-soft-serial")]
    let link = board::link(p.PIO0, p.PIN_12, p.PIN_13);

    let holo = start(link);
    let queue = COMMANDS.init(CommandQueue::new());

    // On-board LED as a heartbeat
    let led = Output::new(p.PIN_25, Level::Low);

    spawner.spawn(holo_task(holo, queue, led).unwrap());
    spawner.spawn(show_task(queue).unwrap());

    info!("Holoprojector controller initialized");
}

/// Device task - owns the holoprojector and its link.
#[embassy_executor::task]
async fn holo_task(
    mut holo: Device<board::BoardLink>,
    queue: &'static CommandQueue,
    mut led: Output<'static>,
) {
    let mut ticks: u32 = 0;
    run(&mut holo, queue, || {
        ticks = ticks.wrapping_add(1);
        if ticks % 100 == 0 {
            led.toggle();
        }
    })
    .await
}

/// Show task - plays a fixed light show on a loop.
#[embassy_executor::task]
async fn show_task(queue: &'static CommandQueue) {
    // Give the peripheral time to boot
    Timer::after_secs(2).await;
    queue.send(Command::leia()).await;
    Timer::after_secs(10).await;

    loop {
        let steps = [
            Command::set_color("F", Color::Blue.code(), Some(4)),
            Command::pulse("R", Color::Red.code(), Some(4)),
            CommandBuilder::new(Opcode::SetColor)
                .target("t")
                .color(Color::Random)
                .build(),
            Command::rainbow("A", Some(6)),
        ];
        for step in steps {
            match step {
                Ok(command) => queue.send(command).await,
                Err(e) => defmt::warn!("show step rejected: {}", e),
            }
            Timer::after_secs(5).await;
        }

        queue.send(Command::stop_lights()).await;
        Timer::after_secs(3).await;
    }
}
