//! Soft-limit interlock.
//!
//! Evaluated on **every** manual output request, independent of control
//! mode, so no caller has to re-implement the check.
//!
//! ## Trip rule
//!
//! Output is forced to zero when the measured position is within
//! `margin` of a soft limit **and** the requested output drives further
//! toward that limit.  Output moving away from the limit always passes
//! through unchanged.
//!
//! ```text
//!   soft_min      soft_min+margin            soft_max-margin      soft_max
//!      │◀── trip if out < 0 ──▶│                  │◀── trip if out > 0 ──▶│
//! ```
//!
//! A trip is logged once when it sets and once when it clears.

use log::{info, warn};

use crate::error::SafetyTrip;

/// Stateful soft-limit interlock with edge-logged trips.
#[derive(Debug, Clone)]
pub struct SoftLimitInterlock {
    soft_min: f64,
    soft_max: f64,
    margin: f64,
    /// Trip latched on the previous evaluation.
    tripped: Option<SafetyTrip>,
}

impl SoftLimitInterlock {
    pub fn new(soft_min: f64, soft_max: f64, margin: f64) -> Self {
        Self {
            soft_min,
            soft_max,
            margin,
            tripped: None,
        }
    }

    /// Filter a requested open-loop output.  Returns the output to apply.
    pub fn filter(&mut self, position: f64, output: f64) -> f64 {
        let trip = self.evaluate(position, output);
        self.latch(trip);
        if trip.is_some() { 0.0 } else { output }
    }

    /// Which limit (if any) `output` would push through at `position`.
    pub fn evaluate(&self, position: f64, output: f64) -> Option<SafetyTrip> {
        if output > 0.0 && position >= self.soft_max - self.margin {
            Some(SafetyTrip::UpperSoftLimit)
        } else if output < 0.0 && position <= self.soft_min + self.margin {
            Some(SafetyTrip::LowerSoftLimit)
        } else {
            None
        }
    }

    /// Trip from the most recent [`filter`](Self::filter) call.
    pub fn tripped(&self) -> Option<SafetyTrip> {
        self.tripped
    }

    // ── Internal ──────────────────────────────────────────────────

    fn latch(&mut self, trip: Option<SafetyTrip>) {
        if trip == self.tripped {
            return;
        }
        match (self.tripped, trip) {
            (_, Some(set)) => warn!("SAFETY INTERLOCK SET: {set}, manual output zeroed"),
            (Some(cleared), None) => info!("SAFETY INTERLOCK CLEARED: {cleared}"),
            (None, None) => {}
        }
        self.tripped = trip;
    }
}
