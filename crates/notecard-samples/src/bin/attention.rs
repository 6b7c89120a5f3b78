//! Arms the Notecard's ATTN pin and reads `card.attn` each time it fires.
//!
//! The attention callback runs in the monitor task and only raises a signal;
//! the request itself happens in the worker task, which takes control first.

#![no_std]
#![no_main]

use defmt::{error, info, warn};
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_nrf::gpio::Input;
use embassy_sync::signal::Signal;
use notecard::{
    AttentionMonitor, Config, DeviceId, Notecard, Polarity, UserData,
};
use notecard_samples::{
    init_arena, request, I2cNotecard, I2cTransport, NotecardMutex,
    NotecardResources, ARBITER, VERSION,
};
use panic_probe as _;
use static_cell::StaticCell;

type AttentionSignal = Signal<NotecardMutex, DeviceId>;

static NOTECARD: StaticCell<I2cNotecard> = StaticCell::new();
static ATTENTION: AttentionSignal = Signal::new();

const ARM: &[u8] = b"{\"req\":\"card.attn\",\"mode\":\"arm,files\",\"files\":[\"data.qi\"]}\n";
const READ: &[u8] = b"{\"req\":\"card.attn\"}\n";

fn on_attention(id: DeviceId, data: UserData) {
    if let Some(signal) = data.downcast_ref::<AttentionSignal>() {
        signal.signal(id);
    }
}

#[embassy_executor::task]
async fn monitor_task(
    monitor: AttentionMonitor<'static, NotecardMutex, I2cTransport, Input<'static>>,
) {
    // The nRF input pin cannot fail, so `run` never returns.
    match monitor.run().await {}
}

#[embassy_executor::task]
async fn worker_task(notecard: &'static I2cNotecard) {
    let mut response = [0u8; 256];
    loop {
        {
            let mut control = notecard.acquire().await;
            if let Err(e) = request(&mut control, ARM, &mut response).await {
                warn!("arming failed: {}", e);
            }
        }

        let id = ATTENTION.wait().await;
        info!("notecard {}: attention", id.0);

        let mut control = notecard.acquire().await;
        match request(&mut control, READ, &mut response).await {
            Ok(len) => info!(
                "card.attn: {}",
                core::str::from_utf8(&response[..len]).unwrap_or("<binary>")
            ),
            Err(e) => warn!("card.attn failed: {}", e),
        }
    }
}

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("notecard samples {}: attention", VERSION);
    let p = embassy_nrf::init(Default::default());
    init_arena();

    let (transport, attn) = NotecardResources::take(p).into_parts();
    let notecard: &'static I2cNotecard = NOTECARD.init(Notecard::new(
        DeviceId(0),
        &ARBITER,
        transport,
        Config { attention: Some(Polarity::ActiveHigh) },
    ));
    notecard.register_attention_callback(on_attention, &ATTENTION);

    match AttentionMonitor::new(notecard, attn) {
        Ok(monitor) => spawner.must_spawn(monitor_task(monitor)),
        Err(_) => error!("attention line is not configured"),
    }
    spawner.must_spawn(worker_task(notecard));
}
