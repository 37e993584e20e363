//! Robot command core.
//!
//! A single-threaded, fixed-period cooperative scheduler that composes
//! commands into autonomous and teleoperated behaviour, arbitrating
//! exclusive access to mechanisms.  Hardware is reached only through the
//! port traits in [`app::ports`], so every module here runs on the host
//! for testing.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod command;
pub mod config;
pub mod control;
pub mod diagnostics;
pub mod error;
pub mod input;
pub mod pulse;
pub mod safety;
pub mod scheduler;
pub mod subsystem;
pub mod trigger;

pub use command::{Command, CommandExt, CommandId, CommandState, ResourceId, ResourceSet};
pub use error::{CommandFault, CommandResult, ConfigError, Error, Result};
pub use scheduler::Scheduler;
pub use trigger::Trigger;
