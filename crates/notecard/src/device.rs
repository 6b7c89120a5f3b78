use core::any::Any;
use core::cell::{Cell, UnsafeCell};

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex as BlockingMutex;

use crate::arbiter::Arbiter;
use crate::control::Control;
use crate::transport::Transport;

/// Identifies one logical Notecard device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeviceId(pub u8);

/// Electrical level at which the attention line is asserted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Polarity {
    #[default]
    ActiveHigh,
    ActiveLow,
}

impl Polarity {
    /// Translate a physical pin level into "asserted".
    pub const fn is_active(self, high: bool) -> bool {
        match self {
            Polarity::ActiveHigh => high,
            Polarity::ActiveLow => !high,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    /// `Some` when the board wires the Notecard ATTN pin to this host.
    pub attention: Option<Polarity>,
}

/// Opaque data handed back to a callback.
pub type UserData = &'static (dyn Any + Send + Sync);

/// Callback signature shared by all three slots.
pub type NotecardCallback = fn(DeviceId, UserData);

#[derive(Clone, Copy)]
pub(crate) struct Callback {
    handler: NotecardCallback,
    user_data: UserData,
}

impl Callback {
    fn invoke(self, id: DeviceId) {
        (self.handler)(id, self.user_data)
    }
}

/// A single callback slot. Empty means "do nothing".
pub(crate) struct Slot<M: RawMutex> {
    inner: BlockingMutex<M, Cell<Option<Callback>>>,
}

impl<M: RawMutex> Slot<M> {
    const fn new() -> Self {
        Self { inner: BlockingMutex::new(Cell::new(None)) }
    }

    fn set(&self, handler: NotecardCallback, user_data: UserData) {
        self.inner
            .lock(|slot| slot.set(Some(Callback { handler, user_data })));
    }

    /// Run the registered callback, if any. The slot lock is not held while
    /// the callback runs.
    pub(crate) fn fire(&self, id: DeviceId) {
        if let Some(callback) = self.inner.lock(|slot| slot.get()) {
            callback.invoke(id);
        }
    }
}

/// One logical Notecard: a transport plus callback slots, tied to the
/// process-wide [`Arbiter`].
///
/// The transport is only reachable through a [`Control`] guard, which exists
/// only while the arbiter gate is held.
pub struct Notecard<'a, M: RawMutex, T: Transport> {
    id: DeviceId,
    config: Config,
    pub(crate) arbiter: &'a Arbiter<M>,
    transport: UnsafeCell<T>,
    pub(crate) attention: Slot<M>,
    pub(crate) pre_acquire: Slot<M>,
    pub(crate) pre_release: Slot<M>,
}

// SAFETY: The transport cell is only dereferenced through a `Control`, and a
// `Control` can only exist while this device's arbiter gate is locked. The
// gate is process-wide, so at most one `&mut T` exists at a time, which may
// be handed to another thread (hence `T: Send`). Callback slots are guarded by
// `M`.
unsafe impl<M: RawMutex + Sync, T: Transport + Send> Sync
    for Notecard<'_, M, T>
{
}

impl<'a, M: RawMutex, T: Transport> Notecard<'a, M, T> {
    pub const fn new(
        id: DeviceId,
        arbiter: &'a Arbiter<M>,
        transport: T,
        config: Config,
    ) -> Self {
        Self {
            id,
            config,
            arbiter,
            transport: UnsafeCell::new(transport),
            attention: Slot::new(),
            pre_acquire: Slot::new(),
            pre_release: Slot::new(),
        }
    }

    pub fn id(&self) -> DeviceId {
        self.id
    }

    pub fn attention_polarity(&self) -> Option<Polarity> {
        self.config.attention
    }

    /// Wait for exclusive control of the peer.
    ///
    /// See [`Arbiter::acquire`].
    pub async fn acquire(&'a self) -> Control<'a, M, T> {
        self.arbiter.acquire(self).await
    }

    /// Register the callback run when the attention line becomes active.
    /// Replaces any previous attention callback.
    ///
    /// # Panics
    ///
    /// If the device has no attention line configured.
    pub fn register_attention_callback(
        &self,
        handler: NotecardCallback,
        user_data: UserData,
    ) {
        assert!(
            self.config.attention.is_some(),
            "attention line was not configured for this device"
        );
        self.attention.set(handler, user_data);
    }

    /// Register the callback run right after the gate is taken and before
    /// the transport is bound.
    pub fn register_pre_acquire_callback(
        &self,
        handler: NotecardCallback,
        user_data: UserData,
    ) {
        self.pre_acquire.set(handler, user_data);
    }

    /// Register the callback run right before the gate is released.
    pub fn register_pre_release_callback(
        &self,
        handler: NotecardCallback,
        user_data: UserData,
    ) {
        self.pre_release.set(handler, user_data);
    }

    /// # Safety
    ///
    /// The caller must hold this device's arbiter gate and must not create
    /// a second reference for the lifetime of the returned one.
    #[allow(clippy::mut_from_ref)]
    pub(crate) unsafe fn transport_mut(&self) -> &mut T {
        &mut *self.transport.get()
    }

    /// # Safety
    ///
    /// Same requirements as [`Self::transport_mut`].
    pub(crate) unsafe fn transport_ref(&self) -> &T {
        &*self.transport.get()
    }
}
