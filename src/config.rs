//! Robot configuration parameters
//!
//! All tunable parameters for the command core and the lift.
//! Supplied by the outer application (JSON file, dashboard, tests) and
//! treated as read-only input to command construction.

use serde::{Deserialize, Serialize};

use crate::control::pid::PidGains;
use crate::error::ConfigError;
use crate::pulse::{PulseMode, PulseSignal};

/// Core robot configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RobotConfig {
    /// Fixed control period (milliseconds)
    pub control_period_ms: u32,
    pub deadband: DeadbandConfig,
    pub lift: LiftConfig,
    /// Operator alerts driven by pulse signals
    pub alerts: Vec<AlertConfig>,
}

/// Operator-input deadbands, as a fraction of full scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeadbandConfig {
    pub gamepad: f64,
    pub joystick: f64,
}

/// Lift geometry, power bounds and gains.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LiftConfig {
    // --- Travel ---
    /// Lower soft limit (inches)
    pub soft_min: f64,
    /// Upper soft limit (inches)
    pub soft_max: f64,
    /// Distance from a soft limit inside which manual output toward it is zeroed
    pub interlock_margin: f64,

    // --- Power ---
    /// Manual open-loop output at full stick
    pub manual_power_ceiling: f64,
    /// Closed-loop output bounds (narrower than manual, for repeatability)
    pub auto_power_min: f64,
    pub auto_power_max: f64,

    // --- Control ---
    pub gains: PidGains,
    /// Position error counted as "at target" (inches)
    pub at_target_tolerance: f64,
}

/// A named alert pattern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertConfig {
    pub name: String,
    pub mode: PulseMode,
}

impl AlertConfig {
    pub fn signal(&self) -> PulseSignal {
        PulseSignal::new(self.mode)
    }
}

impl Default for RobotConfig {
    fn default() -> Self {
        Self {
            control_period_ms: 20, // 50 Hz
            deadband: DeadbandConfig::default(),
            lift: LiftConfig::default(),
            alerts: vec![
                AlertConfig {
                    name: "endgame".into(),
                    mode: PulseMode::Bounded {
                        count: 3,
                        pulse_secs: 0.2,
                        gap_secs: 0.2,
                    },
                },
                AlertConfig {
                    name: "interlock".into(),
                    mode: PulseMode::Sustained,
                },
            ],
        }
    }
}

impl Default for DeadbandConfig {
    fn default() -> Self {
        Self {
            gamepad: 0.1,
            joystick: 0.05,
        }
    }
}

impl Default for LiftConfig {
    fn default() -> Self {
        Self {
            // Travel
            soft_min: 0.0,
            soft_max: 120.0,
            interlock_margin: 2.0,

            // Power
            manual_power_ceiling: 1.0,
            auto_power_min: -0.6,
            auto_power_max: 0.6,

            // Control
            gains: PidGains {
                kp: 0.1,
                ki: 0.0,
                kd: 0.005,
            },
            at_target_tolerance: 1.0,
        }
    }
}

impl RobotConfig {
    /// Parse JSON and validate.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json).map_err(|_| ConfigError::Malformed)?;
        config.validate()?;
        Ok(config)
    }

    /// Control period in seconds.
    pub fn period_secs(&self) -> f64 {
        f64::from(self.control_period_ms) / 1000.0
    }

    /// Reject inconsistent values.  Nothing is clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.control_period_ms == 0 {
            return Err(ConfigError::ValidationFailed("control period must be positive"));
        }
        for threshold in [self.deadband.gamepad, self.deadband.joystick] {
            if !(0.0..1.0).contains(&threshold) {
                return Err(ConfigError::ValidationFailed("deadband must be in [0, 1)"));
            }
        }
        self.lift.validate()?;
        for alert in &self.alerts {
            if let PulseMode::Bounded {
                count,
                pulse_secs,
                gap_secs,
            } = alert.mode
            {
                if count == 0 || pulse_secs <= 0.0 || gap_secs < 0.0 {
                    return Err(ConfigError::ValidationFailed("alert pulse timing"));
                }
            }
        }
        Ok(())
    }
}

impl LiftConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.soft_min >= self.soft_max {
            return Err(ConfigError::ValidationFailed("soft_min must be below soft_max"));
        }
        if self.interlock_margin <= 0.0
            || self.interlock_margin * 2.0 >= self.soft_max - self.soft_min
        {
            return Err(ConfigError::ValidationFailed("interlock margin out of range"));
        }
        if self.manual_power_ceiling <= 0.0 || self.manual_power_ceiling > 1.0 {
            return Err(ConfigError::ValidationFailed("manual ceiling must be in (0, 1]"));
        }
        if self.auto_power_min >= 0.0 || self.auto_power_max <= 0.0 {
            return Err(ConfigError::ValidationFailed("auto power range must straddle zero"));
        }
        if self.auto_power_max > self.manual_power_ceiling
            || -self.auto_power_min > self.manual_power_ceiling
        {
            return Err(ConfigError::ValidationFailed(
                "auto power range must be narrower than manual ceiling",
            ));
        }
        if self.at_target_tolerance <= 0.0 {
            return Err(ConfigError::ValidationFailed("at-target tolerance must be positive"));
        }
        Ok(())
    }
}
