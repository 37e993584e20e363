//! Outbound scheduler events.
//!
//! The [`Scheduler`](crate::scheduler::Scheduler) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them, such as logging to console or recording
//! a match replay.

use crate::command::{CommandId, ResourceId};
use crate::error::CommandFault;

/// Structured events emitted by the scheduler.
#[derive(Debug, Clone, PartialEq)]
pub enum SchedulerEvent {
    /// A command ran `initialize` and is now running.
    Initialized { id: CommandId, name: &'static str },

    /// A command ended because its `is_finished` returned true.
    Finished { id: CommandId, name: &'static str },

    /// A command was cancelled, evicted, or disabled.
    Interrupted { id: CommandId, name: &'static str },

    /// A new claim evicted the prior owner of a resource.
    ResourceConflict {
        resource: ResourceId,
        evicted: CommandId,
        by: CommandId,
    },

    /// A command callback faulted; the command was force-ended.
    Fault {
        id: CommandId,
        name: &'static str,
        fault: CommandFault,
    },

    /// The scheduler was enabled or disabled.
    EnabledChanged(bool),
}
