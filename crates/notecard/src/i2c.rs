//! Addressed bus framer for Notecards attached over I2C.
//!
//! Writes go out as `[len, payload..]`. Reads are two transactions: a
//! `[0, size]` request announcing how much the host wants, then a read of
//! `size + 2` bytes whose first two bytes are `[available, valid]`.

use core::convert::Infallible;

use embedded_hal::i2c::Error as _;
use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::i2c::I2c;

use crate::error::TransportError;
use crate::transport::{Hooks, I2cHooks, Received, Transport, TransportKind};

/// Factory default Notecard address.
pub const DEFAULT_ADDRESS: u8 = 0x17;
/// Envelope length is a single byte.
pub const MAX_TRANSFER: usize = 255;

const REQUEST_HEADER_SIZE: usize = 2;
/// The Notecard needs a moment to finish the previous transaction.
const TURNAROUND_MS: u32 = 1;

#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct I2cConfig {
    pub address: u8,
    /// Largest chunk the engine should request per transaction.
    pub max_chunk: u8,
}

impl Default for I2cConfig {
    fn default() -> Self {
        Self { address: DEFAULT_ADDRESS, max_chunk: 127 }
    }
}

/// I2C transport framer.
pub struct I2cFramer<I, D> {
    bus: I,
    delay: D,
    config: I2cConfig,
}

impl<I, D> I2cFramer<I, D>
where
    I: I2c,
    D: DelayNs,
{
    pub fn new(bus: I, delay: D, config: I2cConfig) -> Self {
        Self { bus, delay, config }
    }

    pub fn release(self) -> (I, D) {
        (self.bus, self.delay)
    }

    pub fn address(&self) -> u8 {
        self.config.address
    }

    /// Largest chunk to move per transaction, never below one.
    pub fn max_chunk(&self) -> u8 {
        self.config.max_chunk.max(1)
    }

    /// Nothing to drain: every read is its own request/response pair.
    pub async fn reset(&mut self, _address: u8) -> bool {
        true
    }

    /// Send `data` to `address` wrapped in a one-byte length envelope.
    ///
    /// # Panics
    ///
    /// If `data` does not fit the envelope (`data.len() >= 256`).
    pub async fn transmit(
        &mut self,
        address: u8,
        data: &[u8],
    ) -> Result<(), TransportError> {
        assert!(
            data.len() <= MAX_TRANSFER,
            "i2c transmit size needs to be less than 256"
        );

        let mut envelope = [0u8; MAX_TRANSFER + 1];
        envelope[0] = data.len() as u8;
        envelope[1..=data.len()].copy_from_slice(data);

        self.delay.delay_ms(TURNAROUND_MS).await;

        self.bus
            .write(address, &envelope[..=data.len()])
            .await
            .map_err(|e| self.fail(TransportError::Transmit, e.kind()))
    }

    /// Fill `buffer` from `address`.
    ///
    /// Only the bytes the peer marks valid are copied, to the front of
    /// `buffer`; the rest of `buffer` is left untouched.
    ///
    /// # Panics
    ///
    /// If `buffer.len() >= 256`.
    pub async fn receive(
        &mut self,
        address: u8,
        buffer: &mut [u8],
    ) -> Result<Received, TransportError> {
        let size = buffer.len();
        assert!(
            size <= MAX_TRANSFER,
            "i2c receive size needs to be less than 256"
        );

        self.delay.delay_ms(TURNAROUND_MS).await;

        let request = [0u8, size as u8];
        self.bus
            .write(address, &request)
            .await
            .map_err(|e| self.fail(TransportError::InitiateRead, e.kind()))?;

        let mut response = [0u8; MAX_TRANSFER + REQUEST_HEADER_SIZE];
        let response = &mut response[..size + REQUEST_HEADER_SIZE];
        self.bus
            .read(address, response)
            .await
            .map_err(|e| self.fail(TransportError::Receive, e.kind()))?;

        let available = u32::from(response[0]);
        let mut valid = usize::from(response[1]);
        if valid > size {
            warn!("i2c: peer reported {} valid bytes for a {} byte read", valid, size);
            valid = size;
        }
        buffer[..valid].copy_from_slice(
            &response[REQUEST_HEADER_SIZE..REQUEST_HEADER_SIZE + valid],
        );

        Ok(Received { available, len: valid })
    }

    /// A write that completes means something acknowledged `address`.
    ///
    /// A missing card is an expected answer here, so the bus error is
    /// dropped without going through `fail` and nothing is logged.
    pub async fn probe(&mut self, address: u8) -> bool {
        self.delay.delay_ms(TURNAROUND_MS).await;
        self.bus.write(address, &[0u8, 0u8]).await.is_ok()
    }

    fn fail(
        &self,
        error: TransportError,
        kind: embedded_hal::i2c::ErrorKind,
    ) -> TransportError {
        warn!("{}: {:?}", error.message(), kind);
        error
    }
}

impl<I, D> I2cHooks for I2cFramer<I, D>
where
    I: I2c,
    D: DelayNs,
{
    async fn reset(&mut self, address: u8) -> bool {
        I2cFramer::reset(self, address).await
    }

    async fn transmit(
        &mut self,
        address: u8,
        data: &[u8],
    ) -> Result<(), TransportError> {
        I2cFramer::transmit(self, address, data).await
    }

    async fn receive(
        &mut self,
        address: u8,
        buffer: &mut [u8],
    ) -> Result<Received, TransportError> {
        I2cFramer::receive(self, address, buffer).await
    }
}

impl<I, D> Transport for I2cFramer<I, D>
where
    I: I2c,
    D: DelayNs,
{
    type Serial = Infallible;
    type I2c = Self;

    fn kind(&self) -> TransportKind {
        TransportKind::I2c {
            address: self.config.address,
            max_chunk: self.max_chunk(),
        }
    }

    fn hooks(&mut self) -> Hooks<'_, Infallible, Self> {
        Hooks::I2c(self)
    }

    async fn probe(&mut self) -> bool {
        let address = self.config.address;
        I2cFramer::probe(self, address).await
    }
}
