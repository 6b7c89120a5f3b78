/// Errors raised while bringing up a Notecard device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InitError<E> {
    /// The device was configured without an attention line.
    AttentionLineMissing,
    /// The attention pin could not be read.
    Pin(E),
}

impl<E: core::fmt::Debug> core::fmt::Display for InitError<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            InitError::AttentionLineMissing => {
                write!(f, "attention line was not configured for this device")
            }
            InitError::Pin(err) => {
                write!(f, "failed to read attention pin: {:?}", err)
            }
        }
    }
}

/// A single transport transaction that did not complete.
///
/// Transport errors are reported to the caller as-is; retrying is up to the
/// protocol engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransportError {
    /// The I2C envelope write failed.
    Transmit,
    /// The I2C read request (`[0, size]`) failed.
    InitiateRead,
    /// The I2C read phase failed.
    Receive,
    /// A byte could not be written to the UART.
    SerialWrite,
}

impl TransportError {
    pub const fn message(&self) -> &'static str {
        match self {
            TransportError::Transmit => {
                "i2c: Unable to transmit data to the Notecard"
            }
            TransportError::InitiateRead => {
                "i2c: Unable to initiate read from the Notecard"
            }
            TransportError::Receive => {
                "i2c: Unable to receive data from the Notecard"
            }
            TransportError::SerialWrite => {
                "serial: Unable to transmit data to the Notecard"
            }
        }
    }
}

impl core::fmt::Display for TransportError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.message())
    }
}

/// Scratch arena failures. Never fatal at this layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AllocError {
    /// No memory region has been handed to the arena yet.
    Uninitialized,
    /// The arena already owns a memory region.
    AlreadyInitialized,
    /// Not enough contiguous free memory for `size` bytes.
    OutOfMemory { size: usize },
}

impl core::fmt::Display for AllocError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            AllocError::Uninitialized => write!(f, "arena is not initialized"),
            AllocError::AlreadyInitialized => {
                write!(f, "arena is already initialized")
            }
            AllocError::OutOfMemory { size } => {
                write!(f, "memory allocation of {} bytes failed", size)
            }
        }
    }
}
