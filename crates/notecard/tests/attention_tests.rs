mod common;

use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};

use common::{MockLink, MockPin};
use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use notecard::{
    Arbiter, AttentionMonitor, Config, DeviceId, InitError, Notecard, Polarity,
    UserData, Watch,
};

struct Hits {
    count: AtomicUsize,
    last_device: AtomicU8,
}

impl Hits {
    const fn new() -> Self {
        Self { count: AtomicUsize::new(0), last_device: AtomicU8::new(u8::MAX) }
    }

    fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

fn on_attention(id: DeviceId, data: UserData) {
    let hits = data.downcast_ref::<Hits>().expect("hits");
    hits.count.fetch_add(1, Ordering::SeqCst);
    hits.last_device.store(id.0, Ordering::SeqCst);
}

fn with_attention(polarity: Polarity) -> Config {
    Config { attention: Some(polarity) }
}

#[futures_test::test]
async fn fires_once_per_activation() {
    static HITS: Hits = Hits::new();

    let arbiter = Arbiter::<NoopRawMutex>::new();
    let device = Notecard::new(
        DeviceId(7),
        &arbiter,
        MockLink::default(),
        with_attention(Polarity::ActiveHigh),
    );
    device.register_attention_callback(on_attention, &HITS);

    // Setup sample, then one sample per interrupt: rise, glitch, fall, rise.
    let pin = MockPin::with_levels(&[false, true, true, false, true]);
    let mut monitor = AttentionMonitor::new(&device, pin.clone()).unwrap();
    assert_eq!(monitor.state().watching(), Watch::Active);

    assert!(monitor.service().await.unwrap());
    assert!(!monitor.service().await.unwrap());
    assert!(!monitor.service().await.unwrap());
    assert!(monitor.service().await.unwrap());

    assert_eq!(HITS.count(), 2);
    assert_eq!(HITS.last_device.load(Ordering::SeqCst), 7);
    assert_eq!(pin.waits(), vec![true, false, false, true]);
}

#[futures_test::test]
async fn active_low_line_waits_for_low() {
    static HITS: Hits = Hits::new();

    let arbiter = Arbiter::<NoopRawMutex>::new();
    let device = Notecard::new(
        DeviceId(0),
        &arbiter,
        MockLink::default(),
        with_attention(Polarity::ActiveLow),
    );
    device.register_attention_callback(on_attention, &HITS);

    let pin = MockPin::with_levels(&[true, false, true]);
    let mut monitor = AttentionMonitor::new(&device, pin.clone()).unwrap();
    assert!(!monitor.state().is_active());

    assert!(monitor.service().await.unwrap());
    assert!(monitor.state().is_active());
    assert!(!monitor.service().await.unwrap());

    assert_eq!(HITS.count(), 1);
    assert_eq!(pin.waits(), vec![false, true]);
}

#[futures_test::test]
async fn line_active_at_setup_waits_for_release_first() {
    static HITS: Hits = Hits::new();

    let arbiter = Arbiter::<NoopRawMutex>::new();
    let device = Notecard::new(
        DeviceId(0),
        &arbiter,
        MockLink::default(),
        with_attention(Polarity::ActiveHigh),
    );
    device.register_attention_callback(on_attention, &HITS);

    let pin = MockPin::with_levels(&[true, true, false, true]);
    let mut monitor = AttentionMonitor::new(&device, pin.clone()).unwrap();
    assert_eq!(monitor.state().watching(), Watch::Inactive);

    assert!(!monitor.service().await.unwrap());
    assert!(!monitor.service().await.unwrap());
    assert_eq!(HITS.count(), 0);

    assert!(monitor.service().await.unwrap());
    assert_eq!(HITS.count(), 1);
    assert_eq!(pin.waits(), vec![false, false, true]);
}

#[futures_test::test]
async fn activation_without_callback_is_harmless() {
    let arbiter = Arbiter::<NoopRawMutex>::new();
    let device = Notecard::new(
        DeviceId(0),
        &arbiter,
        MockLink::default(),
        with_attention(Polarity::ActiveHigh),
    );

    let pin = MockPin::with_levels(&[false, true]);
    let mut monitor = AttentionMonitor::new(&device, pin).unwrap();
    assert!(monitor.service().await.unwrap());
}

#[futures_test::test]
async fn callback_does_not_need_the_gate() {
    static HITS: Hits = Hits::new();

    let arbiter = Arbiter::<NoopRawMutex>::new();
    let device = Notecard::new(
        DeviceId(1),
        &arbiter,
        MockLink::default(),
        with_attention(Polarity::ActiveHigh),
    );
    device.register_attention_callback(on_attention, &HITS);

    let pin = MockPin::with_levels(&[false, true]);
    let mut monitor = AttentionMonitor::new(&device, pin).unwrap();

    let control = device.acquire().await;
    assert!(monitor.service().await.unwrap());
    assert_eq!(HITS.count(), 1);
    control.release();
}

#[test]
fn monitor_requires_attention_line() {
    let arbiter = Arbiter::<NoopRawMutex>::new();
    let device = Notecard::new(
        DeviceId(0),
        &arbiter,
        MockLink::default(),
        Config::default(),
    );

    let result = AttentionMonitor::new(&device, MockPin::default());
    assert!(matches!(result, Err(InitError::AttentionLineMissing)));
}
