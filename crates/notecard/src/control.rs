use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::mutex::MutexGuard;

use crate::device::{DeviceId, Notecard};
use crate::hooks::HookTable;
use crate::transport::{Binding, Transport};

/// Exclusive control of the Notecard peer on behalf of one device.
///
/// Holding a `Control` means holding the arbiter gate. Dropping it (or
/// calling [`Control::release`]) runs the device's pre-release callback and
/// then opens the gate. The transport binding is left in place; nothing can
/// use it until the next holder rebinds.
pub struct Control<'a, M: RawMutex, T: Transport> {
    device: &'a Notecard<'a, M, T>,
    binding: Binding,
    _gate: MutexGuard<'a, M, Option<Binding>>,
}

impl<'a, M: RawMutex, T: Transport> Control<'a, M, T> {
    /// Only called by `Arbiter::acquire`, with the gate held.
    pub(crate) fn new(
        device: &'a Notecard<'a, M, T>,
        gate: MutexGuard<'a, M, Option<Binding>>,
        binding: Binding,
    ) -> Self {
        Self { device, binding, _gate: gate }
    }

    pub fn device_id(&self) -> DeviceId {
        self.device.id()
    }

    /// The transport currently wired into the engine context.
    pub fn binding(&self) -> Binding {
        self.binding
    }

    /// Direct access to the bound transport framer.
    pub fn transport(&mut self) -> &mut T {
        // SAFETY: `self` holds the arbiter gate, the gate is unique per
        // process, and the returned borrow is tied to `&mut self`.
        unsafe { self.device.transport_mut() }
    }

    /// The complete hook table the protocol engine drives.
    pub fn hooks(&mut self) -> HookTable<'_, M, T> {
        let device = self.device;
        let platform = device.arbiter.platform();
        let binding = self.binding;
        HookTable { platform, binding, transport: self.transport().hooks() }
    }

    /// Best-effort check that a Notecard answers on this device's link.
    pub async fn is_present(&mut self) -> bool {
        let present = self.transport().probe().await;
        debug!("notecard {}: present = {}", self.device.id().0, present);
        present
    }

    /// Give control back. Same as dropping the guard.
    pub fn release(self) {}
}

impl<M: RawMutex, T: Transport> Drop for Control<'_, M, T> {
    fn drop(&mut self) {
        // The gate guard is a field, so it is still locked here and only
        // unlocks after this body returns.
        self.device.pre_release.fire(self.device.id());
        trace!("notecard {}: control released", self.device.id().0);
    }
}
