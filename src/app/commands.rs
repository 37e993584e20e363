//! Inbound requests to the robot service.
//!
//! These represent actions requested by the outside world (field
//! management, driver station, dashboard) that the
//! [`RobotService`](super::service::RobotService) interprets and acts upon.

use super::service::RobotMode;
use crate::config::RobotConfig;

/// Requests that external adapters can send into the robot core.
#[derive(Debug, Clone, PartialEq)]
pub enum ServiceCommand {
    /// Switch robot mode (Disabled / Autonomous / Teleop).
    SetMode(RobotMode),

    /// Pick the autonomous routine by name.
    SelectAutonomous(String),

    /// Replace the live configuration.  Takes effect for commands built
    /// afterwards.
    UpdateConfig(RobotConfig),

    /// Interrupt every scheduled and running command.
    CancelAll,
}
