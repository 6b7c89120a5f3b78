use core::convert::Infallible;

use crate::device::DeviceId;
use crate::error::TransportError;

/// Which physical link a device talks over, with the parameters the engine
/// needs to address it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransportKind {
    Serial,
    I2c {
        /// 7-bit peer address.
        address: u8,
        /// Largest payload the engine should move per transaction.
        max_chunk: u8,
    },
}

/// The transport currently wired into the engine context.
///
/// Only observable while the arbiter gate is held, through
/// [`Control::binding`](crate::Control::binding).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Binding {
    pub device: DeviceId,
    pub kind: TransportKind,
}

/// Outcome of a bus read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Received {
    /// Bytes still queued at the peer beyond this read.
    pub available: u32,
    /// Valid bytes copied to the front of the caller's buffer.
    pub len: usize,
}

/// Byte-stream hooks the engine drives one character at a time.
#[allow(async_fn_in_trait)]
pub trait SerialHooks {
    /// Drain anything pending so a new transaction starts clean.
    async fn reset(&mut self) -> bool;
    /// Write `data`; always flushed before returning.
    async fn transmit(
        &mut self,
        data: &[u8],
        flush: bool,
    ) -> Result<(), TransportError>;
    /// Whether a byte can be received without waiting.
    async fn available(&mut self) -> bool;
    /// Next byte, or `0` if nothing arrived.
    async fn receive(&mut self) -> u8;
}

/// Addressed bus hooks the engine drives one chunk at a time.
#[allow(async_fn_in_trait)]
pub trait I2cHooks {
    async fn reset(&mut self, address: u8) -> bool;
    async fn transmit(
        &mut self,
        address: u8,
        data: &[u8],
    ) -> Result<(), TransportError>;
    async fn receive(
        &mut self,
        address: u8,
        buffer: &mut [u8],
    ) -> Result<Received, TransportError>;
}

/// The transport half of the hook table: exactly one of the two shapes.
pub enum Hooks<'a, S, I> {
    Serial(&'a mut S),
    I2c(&'a mut I),
}

/// A transport framer that can be bound into the engine context.
///
/// The side a framer does not implement is [`Infallible`], so the unused
/// [`Hooks`] variant cannot be constructed.
#[allow(async_fn_in_trait)]
pub trait Transport {
    type Serial: SerialHooks;
    type I2c: I2cHooks;

    /// Binding parameters installed on every acquisition.
    fn kind(&self) -> TransportKind;

    fn hooks(&mut self) -> Hooks<'_, Self::Serial, Self::I2c>;

    /// Best-effort check that a peer answers on this link.
    async fn probe(&mut self) -> bool;
}

impl SerialHooks for Infallible {
    async fn reset(&mut self) -> bool {
        match *self {}
    }

    async fn transmit(
        &mut self,
        _data: &[u8],
        _flush: bool,
    ) -> Result<(), TransportError> {
        match *self {}
    }

    async fn available(&mut self) -> bool {
        match *self {}
    }

    async fn receive(&mut self) -> u8 {
        match *self {}
    }
}

impl I2cHooks for Infallible {
    async fn reset(&mut self, _address: u8) -> bool {
        match *self {}
    }

    async fn transmit(
        &mut self,
        _address: u8,
        _data: &[u8],
    ) -> Result<(), TransportError> {
        match *self {}
    }

    async fn receive(
        &mut self,
        _address: u8,
        _buffer: &mut [u8],
    ) -> Result<Received, TransportError> {
        match *self {}
    }
}
