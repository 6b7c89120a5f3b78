#![no_std]
//! Shared access to Blues Notecard peers over UART or I2C.
//!
//! The Notecard protocol engine keeps its platform and transport hooks in
//! process-wide state, so it can only ever talk to one peer at a time. This
//! crate serializes that access: every [`Notecard`] device goes through the
//! single [`Arbiter`], which binds the device's transport into the engine's
//! [`HookTable`] for as long as the returned [`Control`] guard lives.
//!
//! An optional [`AttentionMonitor`] watches a Notecard's ATTN line and runs a
//! registered callback each time the line becomes active.

mod fmt;

mod arbiter;
mod arena;
mod attention;
mod control;
mod device;
mod error;
mod hooks;
mod i2c;
mod platform;
mod serial;
mod transport;

pub use arbiter::Arbiter;
pub use arena::ScratchArena;
pub use attention::{AttentionMonitor, AttentionState, Watch};
pub use control::Control;
pub use device::{
    Config, DeviceId, Notecard, NotecardCallback, Polarity, UserData,
};
pub use error::{AllocError, InitError, TransportError};
pub use hooks::HookTable;
pub use i2c::{I2cConfig, I2cFramer, DEFAULT_ADDRESS, MAX_TRANSFER};
pub use platform::{clean_line, Level, Platform};
pub use serial::{PeekCell, SerialConfig, SerialFramer};
pub use transport::{
    Binding, Hooks, I2cHooks, Received, SerialHooks, Transport, TransportKind,
};
