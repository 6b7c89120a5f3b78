#![allow(dead_code)]

use std::collections::VecDeque;
use std::convert::Infallible;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use embedded_hal::digital::{ErrorType as PinErrorType, InputPin};
use embedded_hal::i2c::{
    ErrorKind, ErrorType as I2cErrorType, NoAcknowledgeSource, Operation,
};
use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::digital::Wait;
use embedded_hal_async::i2c::I2c;
use embedded_io_async::{ErrorType as IoErrorType, Read, ReadReady, Write};
use notecard::{Hooks, SerialHooks, Transport, TransportError, TransportKind};

// ---------------------------------------------------------------------------
// Shared event log
// ---------------------------------------------------------------------------

/// Everything the mocks observed, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    DelayNs(u32),
    Write(u8, Vec<u8>),
    Read(u8, usize),
}

pub type EventLog = Arc<Mutex<Vec<Event>>>;

pub fn event_log() -> EventLog {
    Arc::new(Mutex::new(Vec::new()))
}

// ---------------------------------------------------------------------------
// Delay
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct MockDelay {
    log: EventLog,
}

impl MockDelay {
    pub fn new(log: &EventLog) -> Self {
        Self { log: log.clone() }
    }
}

impl DelayNs for MockDelay {
    async fn delay_ns(&mut self, ns: u32) {
        self.log.lock().unwrap().push(Event::DelayNs(ns));
    }
}

// ---------------------------------------------------------------------------
// I2C
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct I2cScript {
    /// Responses handed out to successive reads.
    pub responses: VecDeque<Vec<u8>>,
    /// Fail the write with this index (0-based, counting all writes).
    pub fail_write: Option<usize>,
    pub fail_reads: bool,
    writes: usize,
}

#[derive(Clone)]
pub struct MockI2c {
    log: EventLog,
    pub script: Arc<Mutex<I2cScript>>,
}

impl MockI2c {
    pub fn new(log: &EventLog) -> Self {
        Self { log: log.clone(), script: Arc::default() }
    }

    pub fn respond_with(&self, response: &[u8]) {
        self.script.lock().unwrap().responses.push_back(response.to_vec());
    }
}

impl I2cErrorType for MockI2c {
    type Error = ErrorKind;
}

impl I2c for MockI2c {
    async fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        let mut script = self.script.lock().unwrap();
        for op in operations {
            match op {
                Operation::Write(bytes) => {
                    self.log
                        .lock()
                        .unwrap()
                        .push(Event::Write(address, bytes.to_vec()));
                    let index = script.writes;
                    script.writes += 1;
                    if script.fail_write == Some(index) {
                        return Err(ErrorKind::NoAcknowledge(
                            NoAcknowledgeSource::Address,
                        ));
                    }
                }
                Operation::Read(buffer) => {
                    self.log
                        .lock()
                        .unwrap()
                        .push(Event::Read(address, buffer.len()));
                    if script.fail_reads {
                        return Err(ErrorKind::Bus);
                    }
                    let response = script.responses.pop_front().unwrap_or_default();
                    let n = response.len().min(buffer.len());
                    buffer[..n].copy_from_slice(&response[..n]);
                }
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// UART
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct UartState {
    pub rx: VecDeque<u8>,
    pub tx: Vec<u8>,
    /// Bytes pushed into `rx` whenever the host writes this sequence.
    pub echo: Option<(Vec<u8>, Vec<u8>)>,
}

#[derive(Clone, Default)]
pub struct MockUart {
    pub state: Arc<Mutex<UartState>>,
}

impl MockUart {
    pub fn feed(&self, bytes: &[u8]) {
        self.state.lock().unwrap().rx.extend(bytes.iter().copied());
    }

    pub fn sent(&self) -> Vec<u8> {
        self.state.lock().unwrap().tx.clone()
    }

    pub fn pending(&self) -> usize {
        self.state.lock().unwrap().rx.len()
    }
}

impl IoErrorType for MockUart {
    type Error = Infallible;
}

impl Read for MockUart {
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let mut state = self.state.lock().unwrap();
        match (buf.first_mut(), state.rx.pop_front()) {
            (Some(slot), Some(byte)) => {
                *slot = byte;
                Ok(1)
            }
            _ => Ok(0),
        }
    }
}

impl ReadReady for MockUart {
    fn read_ready(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.state.lock().unwrap().rx.is_empty())
    }
}

impl Write for MockUart {
    async fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        let mut state = self.state.lock().unwrap();
        state.tx.extend_from_slice(buf);
        if let Some((trigger, reply)) = state.echo.clone() {
            if state.tx.ends_with(&trigger) {
                state.rx.extend(reply);
            }
        }
        Ok(buf.len())
    }

    async fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Attention pin
// ---------------------------------------------------------------------------

#[derive(Clone, Default)]
pub struct MockPin {
    /// Levels returned by successive `is_high` calls; the last one repeats.
    pub levels: Arc<Mutex<VecDeque<bool>>>,
    /// `true` for every `wait_for_high`, `false` for every `wait_for_low`.
    pub waits: Arc<Mutex<Vec<bool>>>,
}

impl MockPin {
    pub fn with_levels(levels: &[bool]) -> Self {
        let pin = Self::default();
        pin.levels.lock().unwrap().extend(levels.iter().copied());
        pin
    }

    pub fn waits(&self) -> Vec<bool> {
        self.waits.lock().unwrap().clone()
    }

    fn sample(&self) -> bool {
        let mut levels = self.levels.lock().unwrap();
        if levels.len() > 1 {
            levels.pop_front().unwrap_or(false)
        } else {
            levels.front().copied().unwrap_or(false)
        }
    }
}

impl PinErrorType for MockPin {
    type Error = Infallible;
}

impl InputPin for MockPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.sample())
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.sample())
    }
}

impl Wait for MockPin {
    async fn wait_for_high(&mut self) -> Result<(), Self::Error> {
        self.waits.lock().unwrap().push(true);
        Ok(())
    }

    async fn wait_for_low(&mut self) -> Result<(), Self::Error> {
        self.waits.lock().unwrap().push(false);
        Ok(())
    }

    async fn wait_for_rising_edge(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    async fn wait_for_falling_edge(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    async fn wait_for_any_edge(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Minimal serial transport for arbiter tests
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MockLink {
    pub sent: Vec<u8>,
    pub present: bool,
    /// Bumped every time the arbiter asks for the binding.
    pub kind_calls: Option<&'static AtomicUsize>,
}

impl SerialHooks for MockLink {
    async fn reset(&mut self) -> bool {
        true
    }

    async fn transmit(
        &mut self,
        data: &[u8],
        _flush: bool,
    ) -> Result<(), TransportError> {
        self.sent.extend_from_slice(data);
        Ok(())
    }

    async fn available(&mut self) -> bool {
        false
    }

    async fn receive(&mut self) -> u8 {
        0
    }
}

impl Transport for MockLink {
    type Serial = Self;
    type I2c = Infallible;

    fn kind(&self) -> TransportKind {
        if let Some(calls) = self.kind_calls {
            calls.fetch_add(1, Ordering::SeqCst);
        }
        TransportKind::Serial
    }

    fn hooks(&mut self) -> Hooks<'_, Self, Infallible> {
        Hooks::Serial(self)
    }

    async fn probe(&mut self) -> bool {
        self.present
    }
}
