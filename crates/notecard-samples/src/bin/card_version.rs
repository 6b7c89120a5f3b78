//! Polls `card.version` over I2C, taking and releasing control around each
//! request.

#![no_std]
#![no_main]

use core::sync::atomic::{AtomicU32, Ordering};

use defmt::{info, warn};
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_time::Timer;
use notecard::{Config, DeviceId, Notecard, UserData};
use notecard_samples::{
    init_arena, request, I2cNotecard, NotecardResources, ARBITER, VERSION,
};
use panic_probe as _;
use static_cell::StaticCell;

static NOTECARD: StaticCell<I2cNotecard> = StaticCell::new();
static SESSIONS: AtomicU32 = AtomicU32::new(0);

fn on_acquire(id: DeviceId, data: UserData) {
    if let Some(sessions) = data.downcast_ref::<AtomicU32>() {
        let n = sessions.fetch_add(1, Ordering::Relaxed) + 1;
        defmt::trace!("notecard {}: session {}", id.0, n);
    }
}

fn on_release(id: DeviceId, _data: UserData) {
    defmt::trace!("notecard {}: session over", id.0);
}

#[embassy_executor::task]
async fn version_task(notecard: &'static I2cNotecard) {
    let mut response = [0u8; 512];
    loop {
        let mut control = notecard.acquire().await;
        if !control.is_present().await {
            warn!("no Notecard answering");
        } else {
            match request(&mut control, b"{\"req\":\"card.version\"}\n", &mut response).await {
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

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("notecard samples {}: card_version", VERSION);
    let p = embassy_nrf::init(Default::default());
    init_arena();

    let (transport, _attn) = NotecardResources::take(p).into_parts();
    let notecard = NOTECARD.init(Notecard::new(
        DeviceId(0),
        &ARBITER,
        transport,
        Config::default(),
    ));
    notecard.register_pre_acquire_callback(on_acquire, &SESSIONS);
    notecard.register_pre_release_callback(on_release, &SESSIONS);

    spawner.must_spawn(version_task(notecard));
}
