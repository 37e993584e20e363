//! Application core: pure domain logic, zero I/O.
//!
//! This module contains the robot-level rules: mode handling, autonomous
//! routine selection and the outbound event model.  All interaction with
//! hardware happens through **port traits** defined in [`ports`], keeping
//! this layer fully testable without real mechanisms.

pub mod chooser;
pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
