//! Lift: positional mechanism with automatic/manual control arbitration.
//!
//! ```text
//!   set_target(p) ─────────────▶ Automatic ── PID(target) ──┐
//!                                   ▲                        │
//!        apply_manual_input(0) ─────┘ (captures position)    ├──▶ set_output
//!                                                            │
//!   apply_manual_input(m ≠ 0) ──▶ Manual ── interlock(m·ceil)┘
//! ```
//!
//! Automatic output is bounded by the narrower automatic power range;
//! manual output is always filtered by the soft-limit interlock.

use log::debug;

use super::Subsystem;
use crate::app::ports::{MotorOutput, PositionSensor};
use crate::command::{Command, ResourceId, ResourceSet};
use crate::config::LiftConfig;
use crate::control::pid::PidController;
use crate::error::{CommandResult, SafetyTrip};
use crate::input::deadband;
use crate::safety::SoftLimitInterlock;

/// Manual inputs at or below this magnitude count as released.
const MANUAL_RELEASE_EPSILON: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlMode {
    Automatic,
    Manual,
}

pub struct LiftSubsystem<H> {
    hw: H,
    resource: ResourceId,
    config: LiftConfig,
    mode: ControlMode,
    target: f64,
    /// Open-loop output requested by the operator, before the interlock.
    manual_request: f64,
    pid: PidController,
    interlock: SoftLimitInterlock,
    last_output: f64,
}

impl<H: PositionSensor + MotorOutput> LiftSubsystem<H> {
    pub fn new(hw: H, resource: ResourceId, config: LiftConfig) -> Self {
        let mut pid = PidController::new(config.gains, config.soft_min);
        pid.set_limits(config.auto_power_min, config.auto_power_max);
        Self {
            hw,
            resource,
            mode: ControlMode::Automatic,
            target: config.soft_min,
            manual_request: 0.0,
            pid,
            interlock: SoftLimitInterlock::new(
                config.soft_min,
                config.soft_max,
                config.interlock_margin,
            ),
            last_output: 0.0,
            config,
        }
    }

    pub fn mode(&self) -> ControlMode {
        self.mode
    }

    pub fn target(&self) -> f64 {
        self.target
    }

    /// Output written on the last periodic call.
    pub fn last_output(&self) -> f64 {
        self.last_output
    }

    pub fn interlock_trip(&self) -> Option<SafetyTrip> {
        self.interlock.tripped()
    }

    pub fn hardware(&self) -> &H {
        &self.hw
    }

    pub fn hardware_mut(&mut self) -> &mut H {
        &mut self.hw
    }

    pub fn position(&mut self) -> f64 {
        self.hw.read_position()
    }

    /// Track `position` (clamped into the soft limits) in closed loop.
    pub fn set_target(&mut self, position: f64) {
        self.target = self.clamp_to_limits(position);
        self.enter(ControlMode::Automatic);
    }

    /// Shift the target without clamping.  The next periodic call
    /// re-clamps it.
    pub fn adjust_target(&mut self, delta: f64) {
        self.target += delta;
    }

    /// Drive open-loop at `magnitude` × manual ceiling.  A released
    /// (zero) input after manual driving holds the current position.
    ///
    /// Returns the interlocked output.
    pub fn apply_manual_input(&mut self, magnitude: f64) -> f64 {
        if magnitude.abs() <= MANUAL_RELEASE_EPSILON {
            if self.mode == ControlMode::Manual {
                let held = self.hw.read_position();
                self.target = self.clamp_to_limits(held);
                self.manual_request = 0.0;
                self.enter(ControlMode::Automatic);
                debug!("Lift: manual released, holding {:.2}", self.target);
            }
            return 0.0;
        }

        self.enter(ControlMode::Manual);
        self.manual_request = magnitude * self.config.manual_power_ceiling;
        let position = self.hw.read_position();
        self.interlock.filter(position, self.manual_request)
    }

    /// Measured position within tolerance of the target.
    pub fn is_at_target(&mut self) -> bool {
        (self.hw.read_position() - self.target).abs() <= self.config.at_target_tolerance
    }

    // ── Internal ──────────────────────────────────────────────────

    fn clamp_to_limits(&self, position: f64) -> f64 {
        position.clamp(self.config.soft_min, self.config.soft_max)
    }

    fn enter(&mut self, mode: ControlMode) {
        if self.mode != mode {
            debug!("Lift: {:?} -> {:?}", self.mode, mode);
            if mode == ControlMode::Automatic {
                self.pid.reset();
            }
            self.mode = mode;
        }
    }
}

impl<H: PositionSensor + MotorOutput> Subsystem for LiftSubsystem<H> {
    fn name(&self) -> &'static str {
        "Lift"
    }

    fn resource(&self) -> ResourceId {
        self.resource
    }

    fn periodic(&mut self, dt_secs: f64) {
        self.target = self.clamp_to_limits(self.target);
        let position = self.hw.read_position();

        let output = match self.mode {
            ControlMode::Automatic => {
                let velocity = self.hw.read_velocity();
                self.pid.set_target(self.target);
                self.pid.compute(position, velocity, dt_secs)
            }
            ControlMode::Manual => self.interlock.filter(position, self.manual_request),
        };

        self.hw.set_output(output);
        self.last_output = output;
    }
}

// ═══════════════════════════════════════════════════════════════
//  Lift commands
// ═══════════════════════════════════════════════════════════════

/// Robot contexts that carry a lift.
pub trait HasLift {
    type LiftHardware: PositionSensor + MotorOutput;

    fn lift(&mut self) -> &mut LiftSubsystem<Self::LiftHardware>;
}

/// Drive the lift to a preset height.
pub struct MoveLift {
    resource: ResourceId,
    target: f64,
    finish_instantly: bool,
}

impl MoveLift {
    /// With `finish_instantly` the command only sets the target and
    /// finishes; otherwise it runs until the lift is at target.
    pub fn new(resource: ResourceId, target: f64, finish_instantly: bool) -> Self {
        Self {
            resource,
            target,
            finish_instantly,
        }
    }
}

impl<R: HasLift> Command<R> for MoveLift {
    fn name(&self) -> &'static str {
        "MoveLift"
    }

    fn requirements(&self) -> ResourceSet {
        ResourceSet::of(self.resource)
    }

    fn initialize(&mut self, robot: &mut R) -> CommandResult {
        robot.lift().set_target(self.target);
        Ok(())
    }

    fn execute(&mut self, robot: &mut R) -> CommandResult {
        robot.lift().set_target(self.target);
        Ok(())
    }

    fn is_finished(&mut self, robot: &mut R) -> bool {
        self.finish_instantly || robot.lift().is_at_target()
    }
}

/// Default lift command: feeds an operator axis through a deadband into
/// [`LiftSubsystem::apply_manual_input`] every tick.
pub struct LiftManualControl<R> {
    resource: ResourceId,
    axis: Box<dyn FnMut(&R) -> f64>,
    threshold: f64,
}

impl<R> LiftManualControl<R> {
    pub fn new(
        resource: ResourceId,
        threshold: f64,
        axis: impl FnMut(&R) -> f64 + 'static,
    ) -> Self {
        Self {
            resource,
            axis: Box::new(axis),
            threshold,
        }
    }
}

impl<R: HasLift> Command<R> for LiftManualControl<R> {
    fn name(&self) -> &'static str {
        "LiftManualControl"
    }

    fn requirements(&self) -> ResourceSet {
        ResourceSet::of(self.resource)
    }

    fn execute(&mut self, robot: &mut R) -> CommandResult {
        let value = deadband((self.axis)(&*robot), self.threshold);
        robot.lift().apply_manual_input(value);
        Ok(())
    }

    /// Release the stick so the lift holds where it stopped instead of
    /// replaying the last open-loop request.
    fn end(&mut self, robot: &mut R, _interrupted: bool) -> CommandResult {
        robot.lift().apply_manual_input(0.0);
        Ok(())
    }
}
