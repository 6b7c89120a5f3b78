#![no_std]
//! Board glue shared by the sample applications: a Notecard on TWIM0 of an
//! nRF52840, with its ATTN line on P1.02.

use core::mem::MaybeUninit;

use defmt::{info, warn};
use embassy_nrf::gpio::{Input, Pull};
use embassy_nrf::interrupt::{self, InterruptExt};
use embassy_nrf::{bind_interrupts, peripherals, twim, Peri, Peripherals};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_time::Delay;
use notecard::{
    Arbiter, Control, Hooks, I2cConfig, I2cFramer, Notecard, Platform,
    SerialHooks, TransportError,
};
use static_cell::ConstStaticCell;

pub mod uart;

pub const VERSION: &str = env!("SAMPLES_VERSION");

pub type NotecardMutex = CriticalSectionRawMutex;
pub type I2cTransport = I2cFramer<twim::Twim<'static>, Delay>;
pub type I2cNotecard = Notecard<'static, NotecardMutex, I2cTransport>;
pub type I2cControl = Control<'static, NotecardMutex, I2cTransport>;

/// The one arbiter every Notecard on this board goes through.
pub static ARBITER: Arbiter<NotecardMutex> = Arbiter::new();

const ARENA_SIZE: usize = 8 * 1024;
const TWIM_BUFFER_SIZE: usize = 256;

/// Response polling gives up after this many empty reads.
const POLL_ATTEMPTS: usize = 100;
const POLL_INTERVAL_MS: u32 = 20;

bind_interrupts!(struct TwimIrqs {
    TWISPI0 => twim::InterruptHandler<peripherals::TWISPI0>;
});

/// Pins wired to the Notecarrier.
pub struct NotecardResources {
    pub twim: Peri<'static, peripherals::TWISPI0>,
    pub sda: Peri<'static, peripherals::P0_26>,
    pub scl: Peri<'static, peripherals::P0_27>,
    pub attn: Peri<'static, peripherals::P1_02>,
}

impl NotecardResources {
    pub fn take(p: Peripherals) -> Self {
        Self { twim: p.TWISPI0, sda: p.P0_26, scl: p.P0_27, attn: p.P1_02 }
    }

    /// Split into the I2C transport and the attention input.
    pub fn into_parts(self) -> (I2cTransport, Input<'static>) {
        static RAM_BUFFER: ConstStaticCell<[u8; TWIM_BUFFER_SIZE]> =
            ConstStaticCell::new([0; TWIM_BUFFER_SIZE]);

        interrupt::TWISPI0.set_priority(interrupt::Priority::P3);
        let mut config = twim::Config::default();
        config.frequency = twim::Frequency::K100;

        let bus = twim::Twim::new(
            self.twim,
            TwimIrqs,
            self.sda,
            self.scl,
            config,
            RAM_BUFFER.take(),
        );
        let transport = I2cFramer::new(bus, Delay, I2cConfig::default());
        let attn = Input::new(self.attn, Pull::None);

        (transport, attn)
    }
}

/// Give the arbiter's scratch arena its memory. Call once from `main`.
pub fn init_arena() {
    static ARENA: ConstStaticCell<[MaybeUninit<u8>; ARENA_SIZE]> =
        ConstStaticCell::new([MaybeUninit::uninit(); ARENA_SIZE]);

    match ARBITER.init_arena(ARENA.take()) {
        Ok(()) => info!("arena: {} bytes free", ARBITER.available_memory()),
        Err(e) => warn!("arena: {}", e),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub enum RequestError {
    Transport(TransportError),
    /// No complete line arrived in time.
    Timeout,
    /// The response did not fit the caller's buffer.
    Overflow,
}

impl From<TransportError> for RequestError {
    fn from(e: TransportError) -> Self {
        RequestError::Transport(e)
    }
}

/// Send one newline-terminated JSON request and read back one response line.
///
/// Returns the length of the response in `response`, terminator included.
pub async fn request(
    control: &mut I2cControl,
    req: &[u8],
    response: &mut [u8],
) -> Result<usize, RequestError> {
    let table = control.hooks();
    let i2c = match table.transport {
        Hooks::I2c(i2c) => i2c,
        Hooks::Serial(never) => match *never {},
    };
    let address = i2c.address();
    let max_chunk = usize::from(i2c.max_chunk());

    for chunk in req.chunks(max_chunk) {
        i2c.transmit(address, chunk).await?;
    }

    let mut len = 0;
    let mut available = 0usize;
    for _ in 0..POLL_ATTEMPTS {
        if len == response.len() {
            return Err(RequestError::Overflow);
        }
        let want = available.min(max_chunk).min(response.len() - len);
        let received = i2c.receive(address, &mut response[len..len + want]).await?;
        len += received.len;
        available = received.available as usize;

        if response[..len].contains(&b'\n') {
            return Ok(len);
        }
        if available == 0 {
            table.platform.delay(POLL_INTERVAL_MS).await;
        }
    }
    Err(RequestError::Timeout)
}

/// Serial flavour of [`request`]: the whole line goes out in one transmit
/// and the response is collected a byte at a time.
pub async fn serial_request<S: SerialHooks>(
    platform: &Platform<NotecardMutex>,
    serial: &mut S,
    req: &[u8],
    response: &mut [u8],
) -> Result<usize, RequestError> {
    serial.reset().await;
    serial.transmit(req, true).await?;

    let mut len = 0;
    let mut idle = 0;
    while idle < POLL_ATTEMPTS {
        if !serial.available().await {
            idle += 1;
            platform.delay(POLL_INTERVAL_MS).await;
            continue;
        }
        if len == response.len() {
            return Err(RequestError::Overflow);
        }
        let byte = serial.receive().await;
        response[len] = byte;
        len += 1;
        if byte == b'\n' {
            return Ok(len);
        }
    }
    Err(RequestError::Timeout)
}
