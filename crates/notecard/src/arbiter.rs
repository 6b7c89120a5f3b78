use core::mem::MaybeUninit;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::mutex::Mutex;

use crate::control::Control;
use crate::device::Notecard;
use crate::error::AllocError;
use crate::platform::Platform;
use crate::transport::{Binding, Transport};

/// Process-wide gate serializing all communication with Notecard peers.
///
/// The protocol engine keeps its hooks in global state and cannot tell peers
/// apart, so a single gate covers every [`Notecard`] no matter which bus it
/// sits on. The gate also owns the binding of the transport currently wired
/// into the engine, which only the holder can see.
///
/// [`Arbiter::new`] is a public `const fn`, so nothing stops a second arbiter
/// from being built. Uniqueness is a convention: create exactly one, normally
/// as a `static`, and pass it to every [`Notecard`]. A device only accepts
/// control from the arbiter it was created with, and [`Arbiter::acquire`]
/// panics otherwise.
pub struct Arbiter<M: RawMutex> {
    gate: Mutex<M, Option<Binding>>,
    platform: Platform<M>,
}

impl<M: RawMutex> Arbiter<M> {
    pub const fn new() -> Self {
        Self { gate: Mutex::new(None), platform: Platform::new() }
    }

    /// Hand the engine's scratch arena its memory. Call once at startup.
    pub fn init_arena(
        &self,
        memory: &'static mut [MaybeUninit<u8>],
    ) -> Result<(), AllocError> {
        let size = memory.len();
        self.platform.arena().init(memory)?;
        debug!("notecard arena ready: {} bytes", size);
        Ok(())
    }

    /// Free bytes left in the scratch arena.
    pub fn available_memory(&self) -> usize {
        self.platform.arena().available()
    }

    pub fn platform(&self) -> &Platform<M> {
        &self.platform
    }

    /// Wait until no other device holds the gate, then take it for `device`.
    ///
    /// The device's pre-acquire callback runs first, inside the critical
    /// section, and only then is the device's transport bound into the
    /// engine context. When this returns the binding is in place.
    ///
    /// There is no timeout: a holder that never releases blocks every other
    /// device forever.
    ///
    /// # Panics
    ///
    /// If `device` was created with a different arbiter.
    pub async fn acquire<'a, T: Transport>(
        &'a self,
        device: &'a Notecard<'a, M, T>,
    ) -> Control<'a, M, T> {
        assert!(
            core::ptr::eq(self, device.arbiter),
            "device is registered with a different arbiter"
        );

        let mut gate = self.gate.lock().await;
        let id = device.id();
        trace!("notecard {}: control taken", id.0);

        device.pre_acquire.fire(id);

        // SAFETY: We hold the gate, and no `Control` exists yet, so nothing
        // else can be referencing the transport.
        let kind = unsafe { device.transport_ref() }.kind();
        let binding = Binding { device: id, kind };
        if gate.is_some_and(|previous| previous.device != id) {
            trace!("notecard {}: rebinding transport", id.0);
        }
        *gate = Some(binding);

        Control::new(device, gate, binding)
    }

    /// Non-blocking check whether some device currently holds the gate.
    pub fn is_locked(&self) -> bool {
        self.gate.try_lock().is_err()
    }
}

impl<M: RawMutex> Default for Arbiter<M> {
    fn default() -> Self {
        Self::new()
    }
}
