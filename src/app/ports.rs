//! Port traits: the boundary between the command core and the robot's
//! hardware and telemetry collaborators.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ Scheduler / Subsystems (domain)
//! ```
//!
//! Driven adapters (encoders, motor controllers, limit switches, the
//! clock, log sinks) implement these traits.  The domain consumes them via
//! generics, so the core never touches hardware registers directly.

use super::events::SchedulerEvent;

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

/// Monotonic time source.
pub trait Clock {
    /// Seconds since an arbitrary fixed origin.  Never decreases.
    fn now_secs(&self) -> f64;
}

// ───────────────────────────────────────────────────────────────
// Mechanism ports (hardware → domain, domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Read-side port for a positional mechanism.
pub trait PositionSensor {
    /// Measured position in mechanism units (e.g. inches of lift travel).
    fn read_position(&mut self) -> f64;

    /// Measured velocity in mechanism units per second.
    fn read_velocity(&mut self) -> f64;
}

/// Write-side port for a motor.
pub trait MotorOutput {
    /// Command a normalized output.  The collaborator clamps to its own
    /// valid range.
    fn set_output(&mut self, output: f64);
}

// ───────────────────────────────────────────────────────────────
// Condition port (hardware → trigger)
// ───────────────────────────────────────────────────────────────

/// A raw boolean input such as a limit switch or a controller button.
pub trait ConditionSource {
    fn read_boolean_condition(&mut self) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The scheduler emits structured [`SchedulerEvent`]s through this port.
/// Adapters decide where they go (log, dashboard, match recording).
pub trait EventSink {
    fn emit(&mut self, event: &SchedulerEvent);
}

// ───────────────────────────────────────────────────────────────
// Robot context
// ───────────────────────────────────────────────────────────────

/// The robot-state "blackboard" threaded through every command callback.
///
/// Owned by the outer control loop.  Holds the subsystems, operator input
/// snapshot and the clock.
pub trait RobotContext: Clock {
    /// Run every subsystem's periodic control loop.  Called once per tick,
    /// after the command pass, with the time since the previous tick.
    fn run_subsystems(&mut self, _dt_secs: f64) {}
}
