//! Reports whether a Notecard answers on the bus, and how much of the scratch
//! arena is left, every few seconds.

#![no_std]
#![no_main]

use defmt::info;
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_time::Timer;
use notecard::{Config, DeviceId, Notecard};
use notecard_samples::{
    init_arena, I2cNotecard, NotecardResources, ARBITER, VERSION,
};
use panic_probe as _;
use static_cell::StaticCell;

static NOTECARD: StaticCell<I2cNotecard> = StaticCell::new();

#[embassy_executor::task]
async fn presence_task(notecard: &'static I2cNotecard) {
    let mut last = None;
    loop {
        let present = notecard.acquire().await.is_present().await;
        if last != Some(present) {
            info!(
                "notecard {}: {}",
                notecard.id().0,
                if present { "present" } else { "absent" }
            );
            last = Some(present);
        }
        info!("arena: {} bytes free", ARBITER.available_memory());

        Timer::after_secs(5).await;
    }
}

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("notecard samples {}: presence", VERSION);
    let p = embassy_nrf::init(Default::default());
    init_arena();

    let (transport, _attn) = NotecardResources::take(p).into_parts();
    let notecard = NOTECARD.init(Notecard::new(
        DeviceId(0),
        &ARBITER,
        transport,
        Config::default(),
    ));

    spawner.must_spawn(presence_task(notecard));
}
