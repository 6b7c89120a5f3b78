//! Polls `card.version` over UARTE0, for Notecards wired to the serial
//! header instead of I2C. Notecard TX goes to P0.08, Notecard RX to P0.06.

#![no_std]
#![no_main]

use defmt::{info, warn};
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_nrf::{bind_interrupts, buffered_uarte, peripherals, uarte};
use embassy_time::{Delay, Timer};
use notecard::{Config, DeviceId, Hooks, Notecard, SerialConfig, SerialFramer};
use notecard_samples::uart::ReadyUart;
use notecard_samples::{init_arena, serial_request, ARBITER, VERSION};
use panic_probe as _;

bind_interrupts!(struct UartIrqs {
    UARTE0 => buffered_uarte::InterruptHandler<peripherals::UARTE0>;
});

/// Notecard serial default.
const BAUD: uarte::Baudrate = uarte::Baudrate::BAUD9600;

#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    info!("notecard samples {}: uart_version", VERSION);
    let p = embassy_nrf::init(Default::default());
    init_arena();

    let mut config = uarte::Config::default();
    config.baudrate = BAUD;

    let mut rx_buffer = [0u8; 512];
    let mut tx_buffer = [0u8; 64];
    let uart = buffered_uarte::BufferedUarte::new(
        p.UARTE0,
        p.TIMER0,
        p.PPI_CH0,
        p.PPI_CH1,
        p.PPI_GROUP0,
        p.P0_08,
        p.P0_06,
        UartIrqs,
        config,
        &mut rx_buffer,
        &mut tx_buffer,
    );

    let transport =
        SerialFramer::new(ReadyUart(uart), Delay, SerialConfig::default());
    let notecard = Notecard::new(DeviceId(0), &ARBITER, transport, Config::default());

    let mut response = [0u8; 512];
    loop {
        let mut control = notecard.acquire().await;
        if !control.is_present().await {
            warn!("no Notecard answering on UARTE0");
        } else {
            let table = control.hooks();
            let serial = match table.transport {
                Hooks::Serial(serial) => serial,
                Hooks::I2c(never) => match *never {},
            };
            match serial_request(
                table.platform,
                serial,
                b"{\"req\":\"card.version\"}\n",
                &mut response,
            )
            .await
            {
                Ok(len) => info!(
                    "card.version: {}",
                    core::str::from_utf8(&response[..len]).unwrap_or("<binary>")
                ),
                Err(e) => warn!("card.version failed: {}", e),
            }
        }
        control.release();

        Timer::after_secs(10).await;
    }
}
