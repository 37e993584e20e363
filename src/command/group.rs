//! Command groups: sequential, parallel-all, deadline and race.
//!
//! A group claims the union of its children's requirements for its whole
//! lifetime, so no other command can seize a mechanism mid-group.  Child
//! faults propagate out of the group callback with `?`; the scheduler then
//! ends the group with `interrupted = true`, which in turn interrupts every
//! child that is still running.  Each child sees `end` exactly once.

use super::{Command, ResourceSet};
use crate::error::CommandResult;

fn union_of<R>(children: &[Box<dyn Command<R>>]) -> ResourceSet {
    children
        .iter()
        .fold(ResourceSet::EMPTY, |acc, c| acc.union(c.requirements()))
}

fn all_run_disabled<R>(children: &[Box<dyn Command<R>>]) -> bool {
    children.iter().all(|c| c.runs_when_disabled())
}

// ═══════════════════════════════════════════════════════════════
//  Sequential
// ═══════════════════════════════════════════════════════════════

/// Runs children one at a time, in order.
///
/// The next child is initialized in the same tick the previous one
/// finishes and first executes on the following tick, so no two children
/// ever execute in the same tick.
pub struct SequentialGroup<R> {
    children: Vec<Box<dyn Command<R>>>,
    /// Index of the active child; `children.len()` once all are done.
    current: usize,
    requirements: ResourceSet,
    name: &'static str,
}

impl<R> SequentialGroup<R> {
    pub fn new(children: Vec<Box<dyn Command<R>>>) -> Self {
        let requirements = union_of(&children);
        Self {
            current: children.len(),
            children,
            requirements,
            name: "Sequential",
        }
    }

    /// Index of the child currently running, if any.
    pub fn current_index(&self) -> Option<usize> {
        (self.current < self.children.len()).then_some(self.current)
    }
}

impl<R> Command<R> for SequentialGroup<R> {
    fn name(&self) -> &'static str {
        self.name
    }

    fn requirements(&self) -> ResourceSet {
        self.requirements
    }

    fn initialize(&mut self, robot: &mut R) -> CommandResult {
        self.current = 0;
        match self.children.first_mut() {
            Some(first) => first.initialize(robot),
            None => Ok(()),
        }
    }

    fn execute(&mut self, robot: &mut R) -> CommandResult {
        let Some(child) = self.children.get_mut(self.current) else {
            return Ok(());
        };
        child.execute(robot)?;
        if !child.is_finished(robot) {
            return Ok(());
        }

        // Advance before `end` so a faulting `end` is never repeated by
        // the group's own interrupted `end`.
        self.current += 1;
        child.end(robot, false)?;

        match self.children.get_mut(self.current) {
            Some(next) => next.initialize(robot),
            None => Ok(()),
        }
    }

    fn is_finished(&mut self, _robot: &mut R) -> bool {
        self.current >= self.children.len()
    }

    fn end(&mut self, robot: &mut R, interrupted: bool) -> CommandResult {
        let result = match self.children.get_mut(self.current) {
            Some(child) if interrupted => child.end(robot, true),
            _ => Ok(()),
        };
        self.current = self.children.len();
        result
    }

    fn runs_when_disabled(&self) -> bool {
        all_run_disabled(&self.children)
    }
}

// ═══════════════════════════════════════════════════════════════
//  Parallel (all / deadline / race)
// ═══════════════════════════════════════════════════════════════

/// When a [`ParallelGroup`] counts as finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParallelPolicy {
    /// Every child has finished.
    All,
    /// The child at this index has finished.
    Deadline(usize),
    /// Any child has finished.
    Race,
}

struct Member<R> {
    command: Box<dyn Command<R>>,
    /// Initialized and not yet ended.
    running: bool,
    /// Ended through its own `is_finished`.
    finished: bool,
}

/// Runs all children together, starting in the same tick.
///
/// A child that finishes is ended right away and latched: it never
/// executes again while the group keeps going.  Once the group's policy is
/// met, the group finishes and every child still running is ended with
/// `interrupted = true`.
pub struct ParallelGroup<R> {
    members: Vec<Member<R>>,
    policy: ParallelPolicy,
    requirements: ResourceSet,
    runs_when_disabled: bool,
    name: &'static str,
}

impl<R> ParallelGroup<R> {
    fn with_policy(children: Vec<Box<dyn Command<R>>>, policy: ParallelPolicy, name: &'static str) -> Self {
        let requirements = union_of(&children);
        let runs_when_disabled = all_run_disabled(&children);
        Self {
            members: children
                .into_iter()
                .map(|command| Member {
                    command,
                    running: false,
                    finished: false,
                })
                .collect(),
            policy,
            requirements,
            runs_when_disabled,
            name,
        }
    }

    /// Finish when every child has finished.
    pub fn all(children: Vec<Box<dyn Command<R>>>) -> Self {
        Self::with_policy(children, ParallelPolicy::All, "Parallel")
    }

    /// Finish when `deadline` finishes; `others` are cut short.
    pub fn deadline(deadline: Box<dyn Command<R>>, others: Vec<Box<dyn Command<R>>>) -> Self {
        let mut children = Vec::with_capacity(others.len() + 1);
        children.push(deadline);
        children.extend(others);
        Self::with_policy(children, ParallelPolicy::Deadline(0), "Deadline")
    }

    /// Finish when the first child finishes.
    pub fn race(children: Vec<Box<dyn Command<R>>>) -> Self {
        Self::with_policy(children, ParallelPolicy::Race, "Race")
    }

    pub fn policy(&self) -> ParallelPolicy {
        self.policy
    }

    /// Number of children still running.
    pub fn running_count(&self) -> usize {
        self.members.iter().filter(|m| m.running).count()
    }
}

impl<R> Command<R> for ParallelGroup<R> {
    fn name(&self) -> &'static str {
        self.name
    }

    fn requirements(&self) -> ResourceSet {
        self.requirements
    }

    fn initialize(&mut self, robot: &mut R) -> CommandResult {
        for member in &mut self.members {
            member.running = false;
            member.finished = false;
        }
        for member in &mut self.members {
            // Mark first: a child whose initialize faults still gets its
            // interrupted `end` from the group.
            member.running = true;
            member.command.initialize(robot)?;
        }
        Ok(())
    }

    fn execute(&mut self, robot: &mut R) -> CommandResult {
        for member in self.members.iter_mut().filter(|m| m.running) {
            member.command.execute(robot)?;
            if member.command.is_finished(robot) {
                member.running = false;
                member.finished = true;
                member.command.end(robot, false)?;
            }
        }
        Ok(())
    }

    fn is_finished(&mut self, _robot: &mut R) -> bool {
        match self.policy {
            ParallelPolicy::All => self.members.iter().all(|m| !m.running),
            ParallelPolicy::Deadline(index) => self.members.get(index).is_none_or(|m| !m.running),
            ParallelPolicy::Race => {
                self.members.is_empty() || self.members.iter().any(|m| m.finished)
            }
        }
    }

    fn end(&mut self, robot: &mut R, _interrupted: bool) -> CommandResult {
        let mut result = Ok(());
        for member in self.members.iter_mut().filter(|m| m.running) {
            member.running = false;
            let status = member.command.end(robot, true);
            if result.is_ok() {
                result = status;
            }
        }
        result
    }

    fn runs_when_disabled(&self) -> bool {
        self.runs_when_disabled
    }
}
