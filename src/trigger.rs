//! Edge-detected boolean conditions and their scheduling bindings.
//!
//! Raw conditions are registered with the scheduler and sampled exactly
//! once per tick into a sample table.  A [`Trigger`] is a small
//! expression tree over those samples:
//!
//! ```text
//!   cond#0 ──┐
//!            ├── And ──┐
//!   cond#1 ──┘         ├── Or ──▶ Trigger
//!   cond#2 ── Not ─────┘
//! ```
//!
//! Composed triggers only read the table, so a condition with side
//! effects is never re-evaluated within a tick no matter how many
//! triggers reference it.

use crate::command::CommandId;

/// Index of a raw condition in the scheduler's sample table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConditionId(pub(crate) usize);

#[derive(Debug, Clone, PartialEq, Eq)]
enum Expr {
    Source(ConditionId),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
}

impl Expr {
    fn eval(&self, samples: &[bool]) -> bool {
        match self {
            Self::Source(id) => samples.get(id.0).copied().unwrap_or(false),
            Self::And(a, b) => a.eval(samples) && b.eval(samples),
            Self::Or(a, b) => a.eval(samples) || b.eval(samples),
            Self::Not(a) => !a.eval(samples),
        }
    }
}

/// A boolean condition evaluated against the current tick's samples.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trigger(Expr);

impl Trigger {
    pub(crate) fn source(id: ConditionId) -> Self {
        Self(Expr::Source(id))
    }

    /// True when both operands are true.
    #[must_use]
    pub fn and(self, other: Trigger) -> Self {
        Self(Expr::And(Box::new(self.0), Box::new(other.0)))
    }

    /// True when either operand is true.
    #[must_use]
    pub fn or(self, other: Trigger) -> Self {
        Self(Expr::Or(Box::new(self.0), Box::new(other.0)))
    }

    /// Inverts the condition.
    #[must_use]
    pub fn negate(self) -> Self {
        Self(Expr::Not(Box::new(self.0)))
    }

    /// Value of the trigger for the given sample table.
    pub fn evaluate(&self, samples: &[bool]) -> bool {
        self.0.eval(samples)
    }
}

// ═══════════════════════════════════════════════════════════════
//  Bindings
// ═══════════════════════════════════════════════════════════════

/// Which edges of a trigger drive which scheduling action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingKind {
    /// Schedule on the rising edge.
    OnTrue,
    /// Schedule on the falling edge.
    OnFalse,
    /// Schedule on the rising edge, cancel on the falling edge.
    WhileTrue,
    /// Schedule on the falling edge, cancel on the rising edge.
    WhileFalse,
    /// Rising edge schedules the command if idle, cancels it if active.
    ToggleOnTrue,
}

/// Scheduling action produced by a binding for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingAction {
    Schedule(CommandId),
    Cancel(CommandId),
    Toggle(CommandId),
}

/// A trigger bound to a command with an edge policy.
#[derive(Debug, Clone)]
pub struct Binding {
    trigger: Trigger,
    kind: BindingKind,
    command: CommandId,
    /// `None` until the first poll.
    previous: Option<bool>,
}

impl Binding {
    pub fn new(trigger: Trigger, kind: BindingKind, command: CommandId) -> Self {
        Self {
            trigger,
            kind,
            command,
            previous: None,
        }
    }

    pub fn command(&self) -> CommandId {
        self.command
    }

    pub fn kind(&self) -> BindingKind {
        self.kind
    }

    /// Compare this tick's value with the previous one.  The first poll
    /// only seeds the previous value.
    pub fn poll(&mut self, samples: &[bool]) -> Option<BindingAction> {
        let now = self.trigger.evaluate(samples);
        let before = self.previous.replace(now)?;
        let rising = now && !before;
        let falling = !now && before;

        match self.kind {
            BindingKind::OnTrue if rising => Some(BindingAction::Schedule(self.command)),
            BindingKind::OnFalse if falling => Some(BindingAction::Schedule(self.command)),
            BindingKind::WhileTrue if rising => Some(BindingAction::Schedule(self.command)),
            BindingKind::WhileTrue if falling => Some(BindingAction::Cancel(self.command)),
            BindingKind::WhileFalse if falling => Some(BindingAction::Schedule(self.command)),
            BindingKind::WhileFalse if rising => Some(BindingAction::Cancel(self.command)),
            BindingKind::ToggleOnTrue if rising => Some(BindingAction::Toggle(self.command)),
            _ => None,
        }
    }
}
