//! Door strike relay on a GPIO output.
//!
//! The reference relay module is active-low: driving the pin LOW energizes
//! the coil and releases the strike.  The rest level (HIGH) keeps the door
//! locked.  Modules wired active-high construct with
//! [`GpioRelay::active_high`].

use embedded_hal::digital::OutputPin;
use log::warn;

use crate::app::ports::RelayPort;

pub struct GpioRelay<P: OutputPin> {
    pin: P,
    active_low: bool,
}

impl<P: OutputPin> GpioRelay<P> {
    pub fn active_low(pin: P) -> Self {
        Self {
            pin,
            active_low: true,
        }
    }

    pub fn active_high(pin: P) -> Self {
        Self {
            pin,
            active_low: false,
        }
    }

    fn drive(&mut self, energized: bool) {
        let high = energized != self.active_low;
        let result = if high {
            self.pin.set_high()
        } else {
            self.pin.set_low()
        };
        if let Err(e) = result {
            warn!("Relay: GPIO write failed: {:?}", e);
        }
    }
}

impl<P: OutputPin> RelayPort for GpioRelay<P> {
    fn energize(&mut self) {
        self.drive(true);
    }

    fn de_energize(&mut self) {
        self.drive(false);
    }
}
