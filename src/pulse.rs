//! Time-windowed alert output bound to a trigger.
//!
//! Two modes:
//!
//! | Mode      | Output while the condition holds                        |
//! |-----------|---------------------------------------------------------|
//! | Bounded   | `count` on/off pulses timed from the rising edge, then off |
//! | Sustained | Continuously on                                         |
//!
//! ```text
//!  condition  ▁▁████████████████████████████
//!  output     ▁▁██▁▁██▁▁██▁▁▁▁▁▁▁▁▁▁▁▁▁▁▁▁▁▁   Bounded, count = 3
//!               ↑ rising edge arms the sequence
//! ```
//!
//! Window arithmetic runs on integer microseconds so pulse boundaries do
//! not drift with floating-point accumulation: pulse `k` is on during
//! `[k·period, k·period + pulse)` where `period = pulse + gap`.

use serde::{Deserialize, Serialize};

const MICROS_PER_SEC: f64 = 1_000_000.0;

fn to_micros(secs: f64) -> i64 {
    (secs * MICROS_PER_SEC).round() as i64
}

/// Output shape of a [`PulseSignal`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PulseMode {
    /// A fixed number of pulses per arming.
    Bounded {
        count: u32,
        pulse_secs: f64,
        gap_secs: f64,
    },
    /// On for as long as the condition holds.
    Sustained,
}

/// Pulse generator state.  Feed it the bound trigger's value once per
/// tick through [`update`](Self::update).
#[derive(Debug, Clone)]
pub struct PulseSignal {
    mode: PulseMode,
    /// Instant (µs) of the rising edge that armed the sequence.
    armed_at: Option<i64>,
    previous: bool,
    output: bool,
}

impl PulseSignal {
    pub fn new(mode: PulseMode) -> Self {
        Self {
            mode,
            armed_at: None,
            previous: false,
            output: false,
        }
    }

    pub fn bounded(count: u32, pulse_secs: f64, gap_secs: f64) -> Self {
        Self::new(PulseMode::Bounded {
            count,
            pulse_secs,
            gap_secs,
        })
    }

    pub fn sustained() -> Self {
        Self::new(PulseMode::Sustained)
    }

    pub fn mode(&self) -> PulseMode {
        self.mode
    }

    /// Whether a bounded sequence is armed (it may have run out already).
    pub fn is_armed(&self) -> bool {
        self.armed_at.is_some()
    }

    /// Output computed by the most recent [`update`](Self::update).
    pub fn output(&self) -> bool {
        self.output
    }

    /// Advance with this tick's condition value and timestamp; returns the
    /// output level.
    pub fn update(&mut self, condition: bool, now_secs: f64) -> bool {
        let rising = condition && !self.previous;
        self.previous = condition;

        self.output = match self.mode {
            PulseMode::Sustained => condition,
            PulseMode::Bounded {
                count,
                pulse_secs,
                gap_secs,
            } => {
                let now = to_micros(now_secs);
                if rising {
                    self.armed_at = Some(now);
                } else if !condition {
                    self.armed_at = None;
                }
                self.armed_at
                    .is_some_and(|t0| Self::in_pulse(now - t0, count, pulse_secs, gap_secs))
            }
        };
        self.output
    }

    fn in_pulse(elapsed: i64, count: u32, pulse_secs: f64, gap_secs: f64) -> bool {
        let pulse = to_micros(pulse_secs);
        let period = pulse + to_micros(gap_secs);
        if elapsed < 0 || pulse <= 0 || period <= 0 {
            return false;
        }
        let k = elapsed / period;
        k < i64::from(count) && elapsed % period < pulse
    }
}
