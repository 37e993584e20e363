//! PID controller for mechanism position
//!
//! Proportional-integral-derivative controller used by closed-loop
//! subsystems.  The derivative term is taken from the measured velocity
//! rather than the error slope, so a setpoint step causes no kick.

use serde::{Deserialize, Serialize};

/// Controller gains.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PidGains {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
}

/// PID controller
#[derive(Debug, Clone)]
pub struct PidController {
    gains: PidGains,
    setpoint: f64,
    integral: f64,
    output_min: f64,
    output_max: f64,
}

impl PidController {
    pub fn new(gains: PidGains, setpoint: f64) -> Self {
        Self {
            gains,
            setpoint,
            integral: 0.0,
            output_min: -1.0,
            output_max: 1.0,
        }
    }

    /// Set output limits
    pub fn set_limits(&mut self, min: f64, max: f64) {
        self.output_min = min;
        self.output_max = max;
    }

    /// Update setpoint
    pub fn set_target(&mut self, setpoint: f64) {
        self.setpoint = setpoint;
    }

    pub fn target(&self) -> f64 {
        self.setpoint
    }

    /// Compute the output from the current position and velocity.
    pub fn compute(&mut self, position: f64, velocity: f64, dt: f64) -> f64 {
        let error = self.setpoint - position;

        let p = self.gains.kp * error;

        self.integral += error * dt;
        let i = self.gains.ki * self.integral;

        // Derivative on measurement
        let d = -self.gains.kd * velocity;

        let output = (p + i + d).clamp(self.output_min, self.output_max);

        // Anti-windup: if output is saturated, stop integrating
        if output >= self.output_max || output <= self.output_min {
            self.integral -= error * dt;
        }

        output
    }

    /// Reset controller state
    pub fn reset(&mut self) {
        self.integral = 0.0;
    }
}
