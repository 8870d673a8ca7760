//! Actuation timer: owns the door relay.
//!
//! The relay rests de-energized (locked).  A grant energizes it for a fixed
//! pulse; the deadline is checked every scheduler pass and the relay falls
//! back to locked on its own.  A second grant mid-pulse restarts the deadline
//! instead of stacking.  An explicit lock drops the relay immediately.
//!
//! ## Safety contract
//!
//! The relay is only ever energized through [`ActuationTimer::pulse`], so an
//! unlock can never outlive `pulse_duration_ms` after the last trigger.

use log::{debug, info};

use crate::app::ports::RelayPort;
use crate::scheduler::Millis;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayState {
    /// Safe rest level, relay de-energized.
    Locked,
    /// Relay energized until `deadline`.
    PulseActive { deadline: Millis },
}

pub struct ActuationTimer {
    state: RelayState,
    duration_ms: Millis,
}

impl ActuationTimer {
    pub fn new(duration_ms: Millis) -> Self {
        Self {
            state: RelayState::Locked,
            duration_ms,
        }
    }

    /// Drive the output to the rest level.  Call once at boot.
    pub fn init(&mut self, relay: &mut dyn RelayPort) {
        relay.de_energize();
        self.state = RelayState::Locked;
    }

    /// Energize now and (re)arm the deadline.
    pub fn pulse(&mut self, now: Millis, relay: &mut dyn RelayPort) {
        relay.energize();
        let deadline = now + self.duration_ms;
        if let RelayState::PulseActive { .. } = self.state {
            debug!("Relay: pulse re-armed until {}ms", deadline);
        } else {
            info!("Relay: unlock pulse ({}ms)", self.duration_ms);
        }
        self.state = RelayState::PulseActive { deadline };
    }

    /// De-energize immediately, cancelling any pending pulse.
    pub fn hold_lock(&mut self, relay: &mut dyn RelayPort) {
        relay.de_energize();
        if self.is_energized() {
            info!("Relay: pulse cancelled by lock");
        }
        self.state = RelayState::Locked;
    }

    /// Revert to locked once the deadline has passed.  Returns `true` on the
    /// pass that released the relay.
    pub fn tick(&mut self, now: Millis, relay: &mut dyn RelayPort) -> bool {
        match self.state {
            RelayState::PulseActive { deadline } if now >= deadline => {
                relay.de_energize();
                self.state = RelayState::Locked;
                debug!("Relay: pulse ended at {}ms", now);
                true
            }
            _ => false,
        }
    }

    pub fn state(&self) -> RelayState {
        self.state
    }

    pub fn is_energized(&self) -> bool {
        matches!(self.state, RelayState::PulseActive { .. })
    }

    pub fn duration_ms(&self) -> Millis {
        self.duration_ms
    }
}
