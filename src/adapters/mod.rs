//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter         | Implements       | Connects to                 |
//! |-----------------|------------------|-----------------------------|
//! | `log_sink`      | EventSink        | `log` facade                |
//! | `pin_condition` | ConditionSource  | embedded-hal digital input  |
//! | `time`          | Clock            | `std::time::Instant`        |

pub mod log_sink;
pub mod pin_condition;
pub mod time;

pub use log_sink::LogEventSink;
pub use pin_condition::PinCondition;
pub use time::MonotonicClock;
