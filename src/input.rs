//! Operator input shaping.

use crate::config::DeadbandConfig;

/// Kind of controller an axis is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerType {
    Gamepad,
    Joystick,
}

impl DeadbandConfig {
    pub fn threshold(&self, controller: ControllerType) -> f64 {
        match controller {
            ControllerType::Gamepad => self.gamepad,
            ControllerType::Joystick => self.joystick,
        }
    }
}

/// Zero `value` when its magnitude is below `threshold`.  Values outside
/// the band pass through unscaled.
pub fn deadband(value: f64, threshold: f64) -> f64 {
    if value.abs() < threshold { 0.0 } else { value }
}

/// [`deadband`] with the configured threshold for `controller`.
pub fn shape_axis(value: f64, controller: ControllerType, config: &DeadbandConfig) -> f64 {
    deadband(value, config.threshold(controller))
}
