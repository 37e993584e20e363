//! Fault history and runtime diagnostics.
//!
//! Stores the most recent 16 command faults in a fixed-capacity ring.
//! Each entry captures the tick number, the command's name and the
//! reason.  Older entries are overwritten; the total count survives.
//!
//! Runtime metrics (tick count, active commands, faults, conflicts) are
//! snapshotted on demand for telemetry.

use heapless::HistoryBuffer;
use serde::{Deserialize, Serialize};

use crate::command::CommandId;
use crate::error::{CommandFault, truncated};

const FAULT_RING_SLOTS: usize = 16;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaultRecord {
    pub tick: u64,
    pub command: usize,
    pub name: heapless::String<32>,
    pub reason: heapless::String<64>,
}

impl FaultRecord {
    pub fn new(tick: u64, id: CommandId, name: &str, fault: &CommandFault) -> Self {
        Self {
            tick,
            command: id.0,
            name: truncated(name),
            reason: truncated(&fault.to_string()),
        }
    }
}

/// Ring buffer of recent command faults.
#[derive(Default)]
pub struct FaultLog {
    entries: HistoryBuffer<FaultRecord, FAULT_RING_SLOTS>,
    total: u32,
}

impl FaultLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, entry: FaultRecord) {
        self.entries.write(entry);
        self.total = self.total.saturating_add(1);
    }

    /// Faults recorded since start-up, including overwritten ones.
    pub fn total(&self) -> u32 {
        self.total
    }

    /// Retained entries, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &FaultRecord> {
        self.entries.oldest_ordered()
    }

    pub fn latest(&self) -> Option<&FaultRecord> {
        self.entries.recent()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Scheduler diagnostics snapshot collected on demand.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerMetrics {
    pub ticks: u64,
    pub active_commands: usize,
    pub fault_count: u32,
    pub conflict_count: u32,
}
