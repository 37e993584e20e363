//! Single-child wrappers that change when (or how) a command finishes.

use super::{Command, ResourceSet};
use crate::app::ports::Clock;
use crate::error::CommandResult;

// ── Timeout ───────────────────────────────────────────────────

/// Bounds the wrapped command by an elapsed-time ceiling measured from
/// its `initialize`.
///
/// When the ceiling cuts the child short, the child sees
/// `end(interrupted = true)` even though the wrapper itself finished
/// normally.
pub struct Timeout<R> {
    inner: Box<dyn Command<R>>,
    seconds: f64,
    started_at: f64,
    inner_finished: bool,
}

impl<R> Timeout<R> {
    pub fn new(inner: Box<dyn Command<R>>, seconds: f64) -> Self {
        Self {
            inner,
            seconds,
            started_at: 0.0,
            inner_finished: false,
        }
    }
}

impl<R: Clock> Command<R> for Timeout<R> {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    fn requirements(&self) -> ResourceSet {
        self.inner.requirements()
    }

    fn initialize(&mut self, robot: &mut R) -> CommandResult {
        self.started_at = robot.now_secs();
        self.inner_finished = false;
        self.inner.initialize(robot)
    }

    fn execute(&mut self, robot: &mut R) -> CommandResult {
        self.inner.execute(robot)
    }

    fn is_finished(&mut self, robot: &mut R) -> bool {
        self.inner_finished = self.inner.is_finished(robot);
        self.inner_finished || robot.now_secs() - self.started_at >= self.seconds
    }

    fn end(&mut self, robot: &mut R, interrupted: bool) -> CommandResult {
        self.inner.end(robot, interrupted || !self.inner_finished)
    }

    fn runs_when_disabled(&self) -> bool {
        self.inner.runs_when_disabled()
    }
}

// ── Until ─────────────────────────────────────────────────────

/// Finishes when `condition` reads true, or when the wrapped command
/// finishes by itself, whichever comes first.
pub struct Until<R> {
    inner: Box<dyn Command<R>>,
    condition: Box<dyn FnMut(&R) -> bool>,
    inner_finished: bool,
}

impl<R> Until<R> {
    pub fn new(inner: Box<dyn Command<R>>, condition: impl FnMut(&R) -> bool + 'static) -> Self {
        Self {
            inner,
            condition: Box::new(condition),
            inner_finished: false,
        }
    }
}

impl<R> Command<R> for Until<R> {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    fn requirements(&self) -> ResourceSet {
        self.inner.requirements()
    }

    fn initialize(&mut self, robot: &mut R) -> CommandResult {
        self.inner_finished = false;
        self.inner.initialize(robot)
    }

    fn execute(&mut self, robot: &mut R) -> CommandResult {
        self.inner.execute(robot)
    }

    fn is_finished(&mut self, robot: &mut R) -> bool {
        self.inner_finished = self.inner.is_finished(robot);
        self.inner_finished || (self.condition)(&*robot)
    }

    fn end(&mut self, robot: &mut R, interrupted: bool) -> CommandResult {
        self.inner.end(robot, interrupted || !self.inner_finished)
    }

    fn runs_when_disabled(&self) -> bool {
        self.inner.runs_when_disabled()
    }
}

// ── Named ─────────────────────────────────────────────────────

/// Renames the wrapped command without changing its behaviour.
pub struct Named<R> {
    inner: Box<dyn Command<R>>,
    name: &'static str,
}

impl<R> Named<R> {
    pub fn new(inner: Box<dyn Command<R>>, name: &'static str) -> Self {
        Self { inner, name }
    }
}

impl<R> Command<R> for Named<R> {
    fn name(&self) -> &'static str {
        self.name
    }

    fn requirements(&self) -> ResourceSet {
        self.inner.requirements()
    }

    fn initialize(&mut self, robot: &mut R) -> CommandResult {
        self.inner.initialize(robot)
    }

    fn execute(&mut self, robot: &mut R) -> CommandResult {
        self.inner.execute(robot)
    }

    fn is_finished(&mut self, robot: &mut R) -> bool {
        self.inner.is_finished(robot)
    }

    fn end(&mut self, robot: &mut R, interrupted: bool) -> CommandResult {
        self.inner.end(robot, interrupted)
    }

    fn runs_when_disabled(&self) -> bool {
        self.inner.runs_when_disabled()
    }
}
