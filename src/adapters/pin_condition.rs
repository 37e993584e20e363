//! Digital input adapter.
//!
//! Turns any `embedded-hal` 1.0 [`InputPin`] (limit switch, beam break,
//! panel button) into a [`ConditionSource`] for triggers.

use embedded_hal::digital::InputPin;
use log::warn;

use crate::app::ports::ConditionSource;

/// Reads a digital pin as a trigger condition.
pub struct PinCondition<P> {
    pin: P,
    active_low: bool,
}

impl<P: InputPin> PinCondition<P> {
    /// Condition is true while the pin reads high.
    pub fn active_high(pin: P) -> Self {
        Self {
            pin,
            active_low: false,
        }
    }

    /// Condition is true while the pin reads low (pulled-up switches).
    pub fn active_low(pin: P) -> Self {
        Self {
            pin,
            active_low: true,
        }
    }

    pub fn release(self) -> P {
        self.pin
    }
}

impl<P: InputPin> ConditionSource for PinCondition<P> {
    /// A read error counts as "not asserted".
    fn read_boolean_condition(&mut self) -> bool {
        let level = if self.active_low {
            self.pin.is_low()
        } else {
            self.pin.is_high()
        };
        level.unwrap_or_else(|e| {
            warn!("PinCondition: read failed: {:?}", e);
            false
        })
    }
}
