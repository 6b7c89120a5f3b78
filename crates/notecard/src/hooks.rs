use embassy_sync::blocking_mutex::raw::RawMutex;

use crate::platform::Platform;
use crate::transport::{Binding, Hooks, Transport};

/// Everything the protocol engine is allowed to call.
///
/// Built by [`Control::hooks`](crate::Control::hooks), so a table can only
/// exist while its device holds the arbiter gate, and only one table is live
/// at a time.
pub struct HookTable<'a, M: RawMutex, T: Transport> {
    /// Memory, delay, clock and debug output.
    pub platform: &'a Platform<M>,
    /// Whom the transport hooks talk to.
    pub binding: Binding,
    /// Either the serial or the I2C hook set.
    pub transport: Hooks<'a, T::Serial, T::I2c>,
}
