mod common;

use common::{event_log, Event, MockDelay, MockUart};
use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use notecard::{
    Arbiter, Config, DeviceId, Hooks, Notecard, SerialConfig, SerialFramer,
    SerialHooks, Transport, TransportKind,
};

fn framer(uart: &MockUart) -> SerialFramer<MockUart, MockDelay> {
    let log = event_log();
    SerialFramer::new(uart.clone(), MockDelay::new(&log), SerialConfig::default())
}

#[futures_test::test]
async fn peeked_byte_is_delivered_exactly_once() {
    let uart = MockUart::default();
    uart.feed(b"ab");
    let mut serial = framer(&uart);

    assert!(serial.rx_available().await);
    // A second check must not read ahead past the peeked byte.
    assert!(serial.rx_available().await);
    assert_eq!(uart.pending(), 1);

    assert_eq!(serial.receive().await, b'a');
    assert_eq!(serial.receive().await, b'b');
    assert!(!serial.rx_available().await);
}

#[futures_test::test]
async fn receive_without_peek_reads_directly() {
    let uart = MockUart::default();
    uart.feed(b"{");
    let mut serial = framer(&uart);

    assert_eq!(serial.receive().await, b'{');
    assert_eq!(serial.receive().await, 0);
}

#[futures_test::test]
async fn reset_discards_stale_input_and_peek() {
    let uart = MockUart::default();
    uart.feed(b"stale");
    let mut serial = framer(&uart);

    assert!(serial.rx_available().await);
    assert!(serial.reset().await);
    assert_eq!(uart.pending(), 0);
    assert!(!serial.rx_available().await);

    uart.feed(b"x");
    assert_eq!(serial.receive().await, b'x');
}

#[futures_test::test]
async fn transmit_pauses_after_every_byte() {
    let log = event_log();
    let uart = MockUart::default();
    let mut serial = SerialFramer::new(
        uart.clone(),
        MockDelay::new(&log),
        SerialConfig { byte_gap_us: 100 },
    );

    serial.transmit(b"{}\n").await.unwrap();

    assert_eq!(uart.sent(), b"{}\n");
    let delays = log.lock().unwrap().clone();
    assert_eq!(delays, vec![Event::DelayNs(100_000); 3]);
}

#[futures_test::test]
async fn zero_gap_skips_delays() {
    let log = event_log();
    let uart = MockUart::default();
    let mut serial = SerialFramer::new(
        uart.clone(),
        MockDelay::new(&log),
        SerialConfig { byte_gap_us: 0 },
    );

    serial.transmit(b"hello").await.unwrap();

    assert_eq!(uart.sent(), b"hello");
    assert!(log.lock().unwrap().is_empty());
}

#[futures_test::test]
async fn presence_check_expects_echo() {
    let uart = MockUart::default();
    uart.state.lock().unwrap().echo = Some((b"\r\n".to_vec(), b"\r\n".to_vec()));
    uart.feed(b"leftover");
    let mut serial = framer(&uart);

    assert!(serial.probe().await);
    assert_eq!(uart.sent(), b"\r\n");
}

#[futures_test::test]
async fn presence_check_fails_on_silence_or_garbage() {
    let silent = MockUart::default();
    assert!(!framer(&silent).probe().await);

    let noisy = MockUart::default();
    noisy.state.lock().unwrap().echo = Some((b"\r\n".to_vec(), b"?!".to_vec()));
    assert!(!framer(&noisy).probe().await);
}

#[futures_test::test]
async fn hooks_drive_the_framer_through_control() {
    let arbiter = Arbiter::<NoopRawMutex>::new();
    let uart = MockUart::default();
    let device = Notecard::new(DeviceId(0), &arbiter, framer(&uart), Config::default());

    let mut control = device.acquire().await;
    assert_eq!(control.binding().kind, TransportKind::Serial);

    uart.feed(b"{\"version\":\"notecard-8.1\"}\r\n");
    let hooks = control.hooks();
    let Hooks::Serial(serial) = hooks.transport else {
        panic!("expected serial hooks");
    };

    assert!(serial.reset().await);
    SerialHooks::transmit(&mut *serial, b"{\"req\":\"card.version\"}\n", true)
        .await
        .unwrap();
    uart.feed(b"{}\r\n");

    let mut line = Vec::new();
    while serial.available().await {
        line.push(serial.receive().await);
    }
    assert_eq!(line, b"{}\r\n");
    assert_eq!(uart.sent(), b"{\"req\":\"card.version\"}\n");
}

#[test]
fn serial_framer_reports_serial_kind() {
    let uart = MockUart::default();
    assert_eq!(framer(&uart).kind(), TransportKind::Serial);
}
