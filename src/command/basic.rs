//! Leaf commands built from closures, plus the two waiting primitives.
//!
//! Multi-tick duration is always a finish predicate polled every tick;
//! nothing here blocks or sleeps.

use super::{Command, ResourceId, ResourceSet};
use crate::app::ports::Clock;
use crate::error::CommandResult;

/// Callback taking the robot context and reporting a status.
pub type Action<R> = Box<dyn FnMut(&mut R) -> CommandResult>;

/// Read-only finish predicate.
pub type Condition<R> = Box<dyn FnMut(&R) -> bool>;

/// Name, requirements and disable policy shared by every leaf command.
#[derive(Debug, Clone, Copy)]
struct Traits {
    name: &'static str,
    requirements: ResourceSet,
    runs_when_disabled: bool,
}

impl Traits {
    const fn named(name: &'static str) -> Self {
        Self {
            name,
            requirements: ResourceSet::EMPTY,
            runs_when_disabled: false,
        }
    }
}

/// Builder methods common to every leaf command.
macro_rules! leaf_builders {
    ($ty:ident $(<$g:ident>)?) => {
        impl$(<$g>)? $ty$(<$g>)? {
            /// Claim `resource` while running.
            #[must_use]
            pub fn requiring(mut self, resource: ResourceId) -> Self {
                self.traits.requirements.insert(resource);
                self
            }

            /// Keep running (or allow starting) while the robot is disabled.
            #[must_use]
            pub fn ignoring_disable(mut self, runs_when_disabled: bool) -> Self {
                self.traits.runs_when_disabled = runs_when_disabled;
                self
            }

            /// Override the log name.
            #[must_use]
            pub fn named(mut self, name: &'static str) -> Self {
                self.traits.name = name;
                self
            }
        }
    };
}

// ── InstantCommand ────────────────────────────────────────────

/// Runs its action once in `initialize` and finishes immediately.
pub struct InstantCommand<R> {
    action: Action<R>,
    traits: Traits,
}

impl<R> InstantCommand<R> {
    pub fn new(action: impl FnMut(&mut R) -> CommandResult + 'static) -> Self {
        Self {
            action: Box::new(action),
            traits: Traits::named("Instant"),
        }
    }
}

leaf_builders!(InstantCommand<R>);

impl<R> Command<R> for InstantCommand<R> {
    fn name(&self) -> &'static str {
        self.traits.name
    }

    fn requirements(&self) -> ResourceSet {
        self.traits.requirements
    }

    fn initialize(&mut self, robot: &mut R) -> CommandResult {
        (self.action)(robot)
    }

    fn is_finished(&mut self, _robot: &mut R) -> bool {
        true
    }

    fn runs_when_disabled(&self) -> bool {
        self.traits.runs_when_disabled
    }
}

// ── RunCommand ────────────────────────────────────────────────

/// Runs its action every tick and never finishes on its own.
pub struct RunCommand<R> {
    action: Action<R>,
    traits: Traits,
}

impl<R> RunCommand<R> {
    pub fn new(action: impl FnMut(&mut R) -> CommandResult + 'static) -> Self {
        Self {
            action: Box::new(action),
            traits: Traits::named("Run"),
        }
    }
}

leaf_builders!(RunCommand<R>);

impl<R> Command<R> for RunCommand<R> {
    fn name(&self) -> &'static str {
        self.traits.name
    }

    fn requirements(&self) -> ResourceSet {
        self.traits.requirements
    }

    fn execute(&mut self, robot: &mut R) -> CommandResult {
        (self.action)(robot)
    }

    fn runs_when_disabled(&self) -> bool {
        self.traits.runs_when_disabled
    }
}

// ── FunctionalCommand ─────────────────────────────────────────

/// A command assembled from four callbacks.
pub struct FunctionalCommand<R> {
    on_init: Action<R>,
    on_execute: Action<R>,
    on_end: Box<dyn FnMut(&mut R, bool) -> CommandResult>,
    finished: Condition<R>,
    traits: Traits,
}

impl<R> FunctionalCommand<R> {
    pub fn new(
        on_init: impl FnMut(&mut R) -> CommandResult + 'static,
        on_execute: impl FnMut(&mut R) -> CommandResult + 'static,
        on_end: impl FnMut(&mut R, bool) -> CommandResult + 'static,
        finished: impl FnMut(&R) -> bool + 'static,
    ) -> Self {
        Self {
            on_init: Box::new(on_init),
            on_execute: Box::new(on_execute),
            on_end: Box::new(on_end),
            finished: Box::new(finished),
            traits: Traits::named("Functional"),
        }
    }
}

leaf_builders!(FunctionalCommand<R>);

impl<R> Command<R> for FunctionalCommand<R> {
    fn name(&self) -> &'static str {
        self.traits.name
    }

    fn requirements(&self) -> ResourceSet {
        self.traits.requirements
    }

    fn initialize(&mut self, robot: &mut R) -> CommandResult {
        (self.on_init)(robot)
    }

    fn execute(&mut self, robot: &mut R) -> CommandResult {
        (self.on_execute)(robot)
    }

    fn is_finished(&mut self, robot: &mut R) -> bool {
        (self.finished)(&*robot)
    }

    fn end(&mut self, robot: &mut R, interrupted: bool) -> CommandResult {
        (self.on_end)(robot, interrupted)
    }

    fn runs_when_disabled(&self) -> bool {
        self.traits.runs_when_disabled
    }
}

// ── WaitCommand ───────────────────────────────────────────────

/// Finishes once `seconds` have elapsed since `initialize`.
pub struct WaitCommand {
    seconds: f64,
    started_at: f64,
    traits: Traits,
}

impl WaitCommand {
    pub fn new(seconds: f64) -> Self {
        Self {
            seconds,
            started_at: 0.0,
            traits: Traits::named("Wait"),
        }
    }
}

leaf_builders!(WaitCommand);

impl<R: Clock> Command<R> for WaitCommand {
    fn name(&self) -> &'static str {
        self.traits.name
    }

    fn requirements(&self) -> ResourceSet {
        self.traits.requirements
    }

    fn initialize(&mut self, robot: &mut R) -> CommandResult {
        self.started_at = robot.now_secs();
        Ok(())
    }

    fn is_finished(&mut self, robot: &mut R) -> bool {
        robot.now_secs() - self.started_at >= self.seconds
    }

    fn runs_when_disabled(&self) -> bool {
        self.traits.runs_when_disabled
    }
}

// ── WaitUntilCommand ──────────────────────────────────────────

/// Does nothing until its condition reads true.
pub struct WaitUntilCommand<R> {
    condition: Condition<R>,
    traits: Traits,
}

impl<R> WaitUntilCommand<R> {
    pub fn new(condition: impl FnMut(&R) -> bool + 'static) -> Self {
        Self {
            condition: Box::new(condition),
            traits: Traits::named("WaitUntil"),
        }
    }
}

leaf_builders!(WaitUntilCommand<R>);

impl<R> Command<R> for WaitUntilCommand<R> {
    fn name(&self) -> &'static str {
        self.traits.name
    }

    fn requirements(&self) -> ResourceSet {
        self.traits.requirements
    }

    fn is_finished(&mut self, robot: &mut R) -> bool {
        (self.condition)(&*robot)
    }

    fn runs_when_disabled(&self) -> bool {
        self.traits.runs_when_disabled
    }
}
