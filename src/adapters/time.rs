//! Host monotonic clock adapter.
//!
//! Wraps `std::time::Instant`, measured from construction.  Robot
//! contexts embed one and forward [`Clock::now_secs`] to it.

use std::time::Instant;

use crate::app::ports::Clock;

/// Monotonic seconds since the adapter was created.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    start: Instant,
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Microseconds since start (monotonic, saturates at `u64::MAX`).
    pub fn uptime_us(&self) -> u64 {
        u64::try_from(self.start.elapsed().as_micros()).unwrap_or(u64::MAX)
    }
}

impl Clock for MonotonicClock {
    fn now_secs(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}
