//! Command model: the atomic behaviour unit and its resource claims.
//!
//! A command follows the same enter → update → exit shape as a state
//! handler:
//!
//! ```text
//!  schedule()        initialize()      execute() + is_finished()     end(interrupted)
//!  ─────────▶ Scheduled ─────────▶ Running ──────────────────────▶ Ended
//!                                    ▲   │ every tick
//!                                    └───┘
//! ```
//!
//! Every callback receives `&mut R`, the robot context threaded through
//! the whole tick (subsystems, clock, operator inputs).  Combinators in
//! [`group`] and [`decorators`] exclusively own their children as
//! `Box<dyn Command<R>>`, so a child instance can never be shared.

pub mod basic;
pub mod decorators;
pub mod group;

use core::fmt;

use crate::app::ports::Clock;
use crate::error::CommandResult;

pub use basic::{FunctionalCommand, InstantCommand, RunCommand, WaitCommand, WaitUntilCommand};
pub use decorators::{Named, Timeout, Until};
pub use group::{ParallelGroup, ParallelPolicy, SequentialGroup};

// ---------------------------------------------------------------------------
// Resources
// ---------------------------------------------------------------------------

/// Identity of an exclusive-access mechanism (a subsystem).
///
/// Handed out by [`Scheduler::register_resource`](crate::scheduler::Scheduler::register_resource).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId(u8);

impl ResourceId {
    /// Upper bound on registered resources (one bit each in [`ResourceSet`]).
    pub const MAX: usize = 32;

    pub(crate) const fn new(index: usize) -> Self {
        debug_assert!(index < Self::MAX);
        Self(index as u8)
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }

    const fn mask(self) -> u32 {
        1 << self.0
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "resource#{}", self.0)
    }
}

/// Bitmask of resources a command claims.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResourceSet(u32);

impl ResourceSet {
    pub const EMPTY: Self = Self(0);

    pub const fn of(resource: ResourceId) -> Self {
        Self(resource.mask())
    }

    #[must_use]
    pub const fn with(self, resource: ResourceId) -> Self {
        Self(self.0 | resource.mask())
    }

    pub fn insert(&mut self, resource: ResourceId) {
        self.0 |= resource.mask();
    }

    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub const fn contains(self, resource: ResourceId) -> bool {
        self.0 & resource.mask() != 0
    }

    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Resources in ascending id order.
    pub fn iter(self) -> impl Iterator<Item = ResourceId> {
        (0..ResourceId::MAX)
            .filter(move |i| self.0 & (1 << i) != 0)
            .map(ResourceId::new)
    }
}

impl FromIterator<ResourceId> for ResourceSet {
    fn from_iter<I: IntoIterator<Item = ResourceId>>(iter: I) -> Self {
        iter.into_iter().fold(Self::EMPTY, Self::with)
    }
}

// ---------------------------------------------------------------------------
// Command identity and lifecycle
// ---------------------------------------------------------------------------

/// Handle to a command owned by a [`Scheduler`](crate::scheduler::Scheduler).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CommandId(pub(crate) usize);

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cmd#{}", self.0)
    }
}

/// Lifecycle state of a registered command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandState {
    /// Registered, never submitted.
    Idle,
    /// Submitted; `initialize` runs during the next tick.
    Scheduled,
    /// Initialized; receives `execute` once per tick.
    Running,
    /// `end` has been called.  May be scheduled again.
    Ended,
}

impl CommandState {
    /// Scheduled or running.
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Scheduled | Self::Running)
    }
}

// ---------------------------------------------------------------------------
// Command trait
// ---------------------------------------------------------------------------

/// Minimal capability interface of a schedulable behaviour.
///
/// `initialize` runs once per (re-)scheduling, `execute` once per tick
/// while running, `is_finished` is polled right after each `execute`,
/// and `end` runs exactly once on termination with `interrupted = true`
/// unless termination came from `is_finished` returning `true`.
pub trait Command<R> {
    /// Name used in logs and diagnostics.
    fn name(&self) -> &'static str {
        "Command"
    }

    /// Resources this command needs exclusive access to.
    fn requirements(&self) -> ResourceSet {
        ResourceSet::EMPTY
    }

    fn initialize(&mut self, _robot: &mut R) -> CommandResult {
        Ok(())
    }

    fn execute(&mut self, _robot: &mut R) -> CommandResult {
        Ok(())
    }

    fn is_finished(&mut self, _robot: &mut R) -> bool {
        false
    }

    fn end(&mut self, _robot: &mut R, _interrupted: bool) -> CommandResult {
        Ok(())
    }

    /// Whether the command keeps running while the robot is disabled.
    fn runs_when_disabled(&self) -> bool {
        false
    }
}

impl<R> Command<R> for Box<dyn Command<R>> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn requirements(&self) -> ResourceSet {
        (**self).requirements()
    }

    fn initialize(&mut self, robot: &mut R) -> CommandResult {
        (**self).initialize(robot)
    }

    fn execute(&mut self, robot: &mut R) -> CommandResult {
        (**self).execute(robot)
    }

    fn is_finished(&mut self, robot: &mut R) -> bool {
        (**self).is_finished(robot)
    }

    fn end(&mut self, robot: &mut R, interrupted: bool) -> CommandResult {
        (**self).end(robot, interrupted)
    }

    fn runs_when_disabled(&self) -> bool {
        (**self).runs_when_disabled()
    }
}

// ---------------------------------------------------------------------------
// Composition sugar
// ---------------------------------------------------------------------------

/// Decorator and group constructors available on every command.
pub trait CommandExt<R: 'static>: Command<R> + Sized + 'static {
    /// Box the command for a scheduler or a group.
    fn boxed(self) -> Box<dyn Command<R>> {
        Box::new(self)
    }

    /// Finish after `seconds` measured from `initialize`, interrupting the
    /// wrapped command if it has not finished by then.
    fn with_timeout(self, seconds: f64) -> Timeout<R>
    where
        R: Clock,
    {
        Timeout::new(self.boxed(), seconds)
    }

    /// Finish as soon as `condition` reads true.
    fn until(self, condition: impl FnMut(&R) -> bool + 'static) -> Until<R> {
        Until::new(self.boxed(), condition)
    }

    /// Run `next` after this command finishes.
    fn and_then(self, next: impl Command<R> + 'static) -> SequentialGroup<R> {
        SequentialGroup::new(vec![self.boxed(), next.boxed()])
    }

    /// Run alongside `other`; finish when both have finished.
    fn along_with(self, other: impl Command<R> + 'static) -> ParallelGroup<R> {
        ParallelGroup::all(vec![self.boxed(), other.boxed()])
    }

    /// Run alongside `other`; finish when this command finishes.
    fn deadline_with(self, other: impl Command<R> + 'static) -> ParallelGroup<R> {
        ParallelGroup::deadline(self.boxed(), vec![other.boxed()])
    }

    /// Run alongside `other`; finish when either finishes.
    fn race_with(self, other: impl Command<R> + 'static) -> ParallelGroup<R> {
        ParallelGroup::race(vec![self.boxed(), other.boxed()])
    }

    /// Override the name shown in logs.
    fn with_name(self, name: &'static str) -> Named<R> {
        Named::new(self.boxed(), name)
    }
}

impl<R: 'static, C: Command<R> + 'static> CommandExt<R> for C {}
