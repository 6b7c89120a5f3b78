//! Byte-stream framer for Notecards attached over a UART.

use core::convert::Infallible;

use embedded_hal_async::delay::DelayNs;
use embedded_io_async::{Error as _, Read, ReadReady, Write};

use crate::error::TransportError;
use crate::transport::{Hooks, SerialHooks, Transport, TransportKind};

/// The Notecard echoes a bare line terminator back when it is alive.
const PROBE_SEQUENCE: &[u8] = b"\r\n";
const PROBE_WAIT_MS: u32 = 250;

#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SerialConfig {
    /// Pause after every transmitted byte. Some UART drivers fall into a
    /// slow path when polled back to back.
    pub byte_gap_us: u32,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self { byte_gap_us: 100 }
    }
}

/// Holds at most one byte read ahead by [`SerialFramer::rx_available`].
///
/// A byte put in here is handed out by the next `take()` exactly once.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PeekCell(Option<u8>);

impl PeekCell {
    pub const fn new() -> Self {
        Self(None)
    }

    pub fn is_full(&self) -> bool {
        self.0.is_some()
    }

    fn fill(&mut self, byte: u8) {
        debug_assert!(self.0.is_none(), "peek cell overwritten");
        self.0 = Some(byte);
    }

    pub fn take(&mut self) -> Option<u8> {
        self.0.take()
    }

    fn clear(&mut self) {
        self.0 = None;
    }
}

/// UART transport framer with a single byte of lookahead.
pub struct SerialFramer<U, D> {
    uart: U,
    delay: D,
    peek: PeekCell,
    config: SerialConfig,
}

impl<U, D> SerialFramer<U, D>
where
    U: Read + Write + ReadReady,
    D: DelayNs,
{
    pub fn new(uart: U, delay: D, config: SerialConfig) -> Self {
        Self { uart, delay, peek: PeekCell::new(), config }
    }

    /// Give back the UART and delay provider.
    pub fn release(self) -> (U, D) {
        (self.uart, self.delay)
    }

    /// Read one byte if the UART already has one, without waiting.
    async fn read_pending(&mut self) -> Option<u8> {
        match self.uart.read_ready() {
            Ok(true) => {}
            Ok(false) => return None,
            Err(e) => {
                warn!("serial: read_ready failed: {:?}", e.kind());
                return None;
            }
        }

        let mut byte = [0u8; 1];
        match self.uart.read(&mut byte).await {
            Ok(1) => Some(byte[0]),
            Ok(_) => None,
            Err(e) => {
                warn!("serial: read failed: {:?}", e.kind());
                None
            }
        }
    }

    /// `true` if a byte is waiting, either already peeked or read right now.
    pub async fn rx_available(&mut self) -> bool {
        if self.peek.is_full() {
            return true;
        }
        match self.read_pending().await {
            Some(byte) => {
                self.peek.fill(byte);
                true
            }
            None => false,
        }
    }

    /// Next byte: the peeked one if present, otherwise one fresh read.
    /// Returns `0` when no data surfaces.
    pub async fn receive(&mut self) -> u8 {
        match self.peek.take() {
            Some(byte) => byte,
            None => self.read_pending().await.unwrap_or(0),
        }
    }

    /// Drop any leftover input from a previous transaction.
    pub async fn reset(&mut self) -> bool {
        self.peek.clear();
        let mut drained = 0usize;
        while self.read_pending().await.is_some() {
            drained += 1;
        }
        if drained > 0 {
            trace!("serial: discarded {} stale bytes", drained);
        }
        true
    }

    pub async fn transmit(&mut self, data: &[u8]) -> Result<(), TransportError> {
        for &byte in data {
            self.uart.write_all(&[byte]).await.map_err(|e| {
                warn!("serial: write failed: {:?}", e.kind());
                TransportError::SerialWrite
            })?;
            if self.config.byte_gap_us > 0 {
                self.delay.delay_us(self.config.byte_gap_us).await;
            }
        }
        self.uart.flush().await.map_err(|e| {
            warn!("serial: flush failed: {:?}", e.kind());
            TransportError::SerialWrite
        })
    }

    /// Send a line terminator and expect it echoed back.
    pub async fn probe(&mut self) -> bool {
        self.reset().await;
        if self.transmit(PROBE_SEQUENCE).await.is_err() {
            return false;
        }
        self.delay.delay_ms(PROBE_WAIT_MS).await;

        for &expected in PROBE_SEQUENCE {
            if !self.rx_available().await || self.receive().await != expected {
                return false;
            }
        }
        true
    }
}

impl<U, D> SerialHooks for SerialFramer<U, D>
where
    U: Read + Write + ReadReady,
    D: DelayNs,
{
    async fn reset(&mut self) -> bool {
        SerialFramer::reset(self).await
    }

    async fn transmit(
        &mut self,
        data: &[u8],
        _flush: bool,
    ) -> Result<(), TransportError> {
        // Every transmit ends with a flush.
        SerialFramer::transmit(self, data).await
    }

    async fn available(&mut self) -> bool {
        self.rx_available().await
    }

    async fn receive(&mut self) -> u8 {
        SerialFramer::receive(self).await
    }
}

impl<U, D> Transport for SerialFramer<U, D>
where
    U: Read + Write + ReadReady,
    D: DelayNs,
{
    type Serial = Self;
    type I2c = Infallible;

    fn kind(&self) -> TransportKind {
        TransportKind::Serial
    }

    fn hooks(&mut self) -> Hooks<'_, Self, Infallible> {
        Hooks::Serial(self)
    }

    async fn probe(&mut self) -> bool {
        SerialFramer::probe(self).await
    }
}
