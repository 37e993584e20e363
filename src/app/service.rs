//! Robot service, the hexagonal core.
//!
//! [`RobotService`] owns the scheduler, the autonomous chooser and the
//! robot mode.  The outer control loop owns the robot context and hands
//! it in on every tick, so all hardware access flows through the port
//! traits implemented by that context.
//!
//! ```text
//!  ServiceCommand ──▶ ┌──────────────────────────┐
//!                     │       RobotService        │ ──▶ EventSink
//!  RobotContext  ◀──▶ │  Mode · Chooser · Scheduler│
//!                     └──────────────────────────┘
//! ```
//!
//! | Mode        | Scheduler | On entry                          |
//! |-------------|-----------|-----------------------------------|
//! | Disabled    | disabled  | non-disabled-safe commands end    |
//! | Autonomous  | enabled   | selected routine scheduled        |
//! | Teleop      | enabled   | autonomous routine cancelled      |

use log::info;

use super::chooser::AutoChooser;
use super::commands::ServiceCommand;
use super::ports::RobotContext;
use crate::command::{Command, CommandId, InstantCommand};
use crate::config::RobotConfig;
use crate::error::ConfigError;
use crate::scheduler::Scheduler;

/// Competition robot mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RobotMode {
    Disabled,
    Autonomous,
    Teleop,
}

// ───────────────────────────────────────────────────────────────
// RobotService
// ───────────────────────────────────────────────────────────────

pub struct RobotService<R> {
    scheduler: Scheduler<R>,
    chooser: AutoChooser,
    mode: RobotMode,
    config: RobotConfig,
    /// Routine scheduled on the last Autonomous entry.
    running_auto: Option<CommandId>,
}

impl<R: 'static> RobotService<R> {
    /// Construct the service in Disabled mode.
    pub fn new(config: RobotConfig) -> Self {
        let mut scheduler = Scheduler::new();
        let do_nothing = scheduler.add(InstantCommand::new(|_: &mut R| Ok(())).named("DoNothing"));
        scheduler.set_enabled(false);
        Self {
            scheduler,
            chooser: AutoChooser::new(do_nothing),
            mode: RobotMode::Disabled,
            config,
            running_auto: None,
        }
    }

    // ── Setup ─────────────────────────────────────────────────

    pub fn scheduler(&self) -> &Scheduler<R> {
        &self.scheduler
    }

    /// Resource registration, commands, triggers and defaults go through
    /// the scheduler directly.
    pub fn scheduler_mut(&mut self) -> &mut Scheduler<R> {
        &mut self.scheduler
    }

    /// Register an autonomous routine under `name`.
    pub fn add_routine(&mut self, name: &'static str, routine: impl Command<R> + 'static) -> CommandId {
        let id = self.scheduler.add(routine);
        self.chooser.add(name, id);
        id
    }

    pub fn select_autonomous(&mut self, name: &str) -> Result<(), ConfigError> {
        self.chooser.select(name)
    }

    pub fn chooser(&self) -> &AutoChooser {
        &self.chooser
    }

    // ── Mode handling ─────────────────────────────────────────

    pub fn set_mode(&mut self, mode: RobotMode) {
        if mode == self.mode {
            return;
        }
        info!("Robot mode {:?} -> {:?}", self.mode, mode);

        match mode {
            RobotMode::Disabled => {
                self.scheduler.set_enabled(false);
                self.running_auto = None;
            }
            RobotMode::Autonomous => {
                self.scheduler.set_enabled(true);
                let (name, id) = self.chooser.selected();
                info!("Autonomous routine '{}' scheduled", name);
                // Ids held by the chooser are always registered.
                let _ = self.scheduler.schedule(id);
                self.running_auto = Some(id);
            }
            RobotMode::Teleop => {
                self.scheduler.set_enabled(true);
                if let Some(id) = self.running_auto.take() {
                    let _ = self.scheduler.cancel(id);
                }
            }
        }
        self.mode = mode;
    }

    pub fn mode(&self) -> RobotMode {
        self.mode
    }

    // ── Commands ──────────────────────────────────────────────

    /// Process an external request.
    pub fn handle_command(&mut self, cmd: ServiceCommand) -> Result<(), ConfigError> {
        match cmd {
            ServiceCommand::SetMode(mode) => self.set_mode(mode),
            ServiceCommand::SelectAutonomous(name) => self.select_autonomous(&name)?,
            ServiceCommand::UpdateConfig(config) => {
                config.validate()?;
                self.config = config;
                info!("Configuration updated at runtime");
            }
            ServiceCommand::CancelAll => self.scheduler.cancel_all(),
        }
        Ok(())
    }

    pub fn config(&self) -> &RobotConfig {
        &self.config
    }
}

impl<R: RobotContext + 'static> RobotService<R> {
    /// Run one control period.
    pub fn tick(&mut self, robot: &mut R) {
        self.scheduler.tick(robot);
    }
}
