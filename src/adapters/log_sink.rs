//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured scheduler events to the
//! `log` facade.  Severity follows the event: faults are errors, the
//! enable flag is info, lifecycle traffic is debug.  A dashboard or
//! match-recording adapter would implement the same trait.

use log::{debug, error, info};

use crate::app::events::SchedulerEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`SchedulerEvent`] on one line.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &SchedulerEvent) {
        match event {
            SchedulerEvent::Initialized { id, name } => {
                debug!("CMD | {} '{}' initialized", id, name);
            }
            SchedulerEvent::Finished { id, name } => {
                debug!("CMD | {} '{}' finished", id, name);
            }
            SchedulerEvent::Interrupted { id, name } => {
                debug!("CMD | {} '{}' interrupted", id, name);
            }
            SchedulerEvent::ResourceConflict {
                resource,
                evicted,
                by,
            } => {
                debug!("CONFLICT | {} evicted from {} by {}", evicted, resource, by);
            }
            SchedulerEvent::Fault { id, name, fault } => {
                error!("FAULT | {} '{}': {}", id, name, fault);
            }
            SchedulerEvent::EnabledChanged(enabled) => {
                info!("ENABLE | {}", if *enabled { "enabled" } else { "disabled" });
            }
        }
    }
}
