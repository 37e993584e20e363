//! Autonomous routine selection.
//!
//! Routines are registered explicitly by name.  A "DoNothing" routine is
//! always present and is the fallback for unknown selections.

use log::warn;

use crate::command::CommandId;
use crate::error::ConfigError;

pub const DO_NOTHING: &str = "DoNothing";

/// Named autonomous routines with one selected entry.
#[derive(Debug, Clone)]
pub struct AutoChooser {
    routines: Vec<(&'static str, CommandId)>,
    selected: usize,
}

impl AutoChooser {
    /// `do_nothing` is the command run when nothing else is selected.
    pub fn new(do_nothing: CommandId) -> Self {
        Self {
            routines: vec![(DO_NOTHING, do_nothing)],
            selected: 0,
        }
    }

    /// Register a routine.  Re-registering a name replaces its command.
    pub fn add(&mut self, name: &'static str, id: CommandId) {
        match self.routines.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = id,
            None => self.routines.push((name, id)),
        }
    }

    /// Select by name.  Unknown names fall back to DoNothing.
    pub fn select(&mut self, name: &str) -> Result<(), ConfigError> {
        if let Some(index) = self.routines.iter().position(|(n, _)| *n == name) {
            self.selected = index;
            Ok(())
        } else {
            warn!("AutoChooser: unknown routine '{}', falling back to {}", name, DO_NOTHING);
            self.selected = 0;
            Err(ConfigError::UnknownRoutine)
        }
    }

    pub fn selected(&self) -> (&'static str, CommandId) {
        self.routines[self.selected]
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.routines.iter().map(|(n, _)| *n)
    }
}
