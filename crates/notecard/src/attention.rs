//! Attention (ATTN) line monitoring.
//!
//! The Notecard asserts ATTN to ask for the host's attention. The line is
//! level-sensitive and may re-trigger while it stays asserted, so every
//! wake-up is compared against the last stable level: only a real change to
//! the active level reaches the application callback.

use embassy_sync::blocking_mutex::raw::RawMutex;
use embedded_hal::digital::InputPin;
use embedded_hal_async::digital::Wait;

use crate::device::{Notecard, Polarity};
use crate::error::InitError;
use crate::transport::Transport;

/// Which logical level the monitor is waiting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Watch {
    Active,
    Inactive,
}

/// Debounce state for one attention line.
///
/// The watched level is always the complement of the stored stable level,
/// so the same edge can never be reported twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AttentionState {
    active: bool,
}

impl AttentionState {
    /// Seed the state from the level sampled at setup.
    pub const fn new(active: bool) -> Self {
        Self { active }
    }

    pub const fn is_active(&self) -> bool {
        self.active
    }

    pub const fn watching(&self) -> Watch {
        if self.active {
            Watch::Inactive
        } else {
            Watch::Active
        }
    }

    /// Feed one sample taken on interrupt entry.
    ///
    /// Returns `true` when the line just became active. A sample equal to
    /// the stored level is a spurious re-trigger and changes nothing.
    pub fn on_interrupt(&mut self, active: bool) -> bool {
        if active == self.active {
            return false;
        }
        self.active = active;
        active
    }
}

/// Drives the attention callback of one [`Notecard`] from its ATTN pin.
///
/// Run [`AttentionMonitor::run`] from a dedicated task. The callback is
/// invoked directly from that task and must not block; in particular it must
/// not wait on the arbiter.
pub struct AttentionMonitor<'a, M: RawMutex, T: Transport, P> {
    device: &'a Notecard<'a, M, T>,
    pin: P,
    polarity: Polarity,
    state: AttentionState,
}

impl<'a, M, T, P> AttentionMonitor<'a, M, T, P>
where
    M: RawMutex,
    T: Transport,
    P: InputPin + Wait,
{
    /// Sample the line once and arm for the opposite level, so a line that
    /// is already asserted at setup does not fire until it has been released.
    pub fn new(
        device: &'a Notecard<'a, M, T>,
        mut pin: P,
    ) -> Result<Self, InitError<P::Error>> {
        let Some(polarity) = device.attention_polarity() else {
            error!("notecard {}: no attention line configured", device.id().0);
            return Err(InitError::AttentionLineMissing);
        };
        let high = pin.is_high().map_err(InitError::Pin)?;
        let state = AttentionState::new(polarity.is_active(high));
        debug!(
            "notecard {}: attention line starts {}",
            device.id().0,
            if state.is_active() { "active" } else { "inactive" }
        );

        Ok(Self { device, pin, polarity, state })
    }

    pub fn state(&self) -> AttentionState {
        self.state
    }

    async fn wait_for(&mut self, watch: Watch) -> Result<(), P::Error> {
        let active = watch == Watch::Active;
        if self.polarity.is_active(true) == active {
            self.pin.wait_for_high().await
        } else {
            self.pin.wait_for_low().await
        }
    }

    /// Handle one interrupt: wait for the watched level, sample the line,
    /// and fire the callback on a transition to active.
    ///
    /// Nothing waits on the pin while the sample is processed, which keeps
    /// the handler from re-entering itself. The next call re-arms for the
    /// complement of the new stable level. Returns whether the callback
    /// fired.
    pub async fn service(&mut self) -> Result<bool, P::Error> {
        self.wait_for(self.state.watching()).await?;

        let high = self.pin.is_high()?;
        let fired = self.state.on_interrupt(self.polarity.is_active(high));
        if fired {
            trace!("notecard {}: attention", self.device.id().0);
            self.device.attention.fire(self.device.id());
        }
        Ok(fired)
    }

    /// Service interrupts forever. Only returns if the pin fails.
    pub async fn run(mut self) -> P::Error {
        loop {
            if let Err(e) = self.service().await {
                error!("notecard {}: attention pin failed", self.device.id().0);
                return e;
            }
        }
    }
}
