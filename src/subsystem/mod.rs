//! Mechanisms that own an exclusive resource and run a periodic control
//! loop.
//!
//! Subsystem state is only mutated from command callbacks and from the
//! subsystem's own [`Subsystem::periodic`], which the robot context runs
//! once per tick after the command pass.

pub mod lift;

pub use lift::{ControlMode, HasLift, LiftManualControl, LiftSubsystem, MoveLift};

use crate::command::ResourceId;

pub trait Subsystem {
    fn name(&self) -> &'static str;

    /// Resource commands must require to drive this subsystem.
    fn resource(&self) -> ResourceId;

    /// Run the control loop and write actuator outputs.
    fn periodic(&mut self, dt_secs: f64);
}
