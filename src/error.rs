//! Unified error types for the command core.
//!
//! A single `Error` enum that every layer can convert into, keeping the
//! outer control loop's error handling uniform.  Callback faults carry a
//! short fixed-capacity reason so recording them never allocates on the
//! tick path.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Every fallible setup or control operation funnels into this type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A binding, registration or configuration value was rejected.
    Config(ConfigError),
    /// A command callback reported or raised a fault.
    Command(CommandFault),
    /// A soft-limit interlock forced an actuator output to zero.
    Safety(SafetyTrip),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Command(e) => write!(f, "command: {e}"),
            Self::Safety(e) => write!(f, "safety: {e}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Setup-time problems.  None of these are fatal: the caller falls back to
/// a no-op (no default command, "do nothing" routine, rejected config).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// More resources were registered than a `ResourceSet` can hold.
    TooManyResources,
    /// A resource id that was never registered with this scheduler.
    UnknownResource,
    /// A command id that was never added to this scheduler.
    UnknownCommand,
    /// A default command does not require the resource it defaults for.
    DefaultMissingRequirement,
    /// An autonomous routine name that was never registered.
    UnknownRoutine,
    /// A configuration field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// Configuration text could not be parsed.
    Malformed,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooManyResources => write!(f, "too many resources"),
            Self::UnknownResource => write!(f, "unknown resource"),
            Self::UnknownCommand => write!(f, "unknown command"),
            Self::DefaultMissingRequirement => {
                write!(f, "default command does not require its resource")
            }
            Self::UnknownRoutine => write!(f, "unknown autonomous routine"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {msg}"),
            Self::Malformed => write!(f, "malformed configuration"),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Command faults
// ---------------------------------------------------------------------------

/// A fault raised inside a command callback.
///
/// The scheduler ends the faulting command alone with `interrupted = true`
/// and keeps every other command running.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandFault {
    /// The callback returned an error status.
    Failed(&'static str),
    /// The callback panicked; carries the (truncated) panic message.
    Panicked(heapless::String<64>),
}

impl CommandFault {
    /// Build a `Panicked` fault from an arbitrary message, truncating to the
    /// fixed capacity on a char boundary.
    pub fn panicked(message: &str) -> Self {
        Self::Panicked(truncated(message))
    }
}

/// Copy `s` into a bounded string, dropping whatever does not fit.  Cuts
/// only on char boundaries.
pub(crate) fn truncated<const N: usize>(s: &str) -> heapless::String<N> {
    let mut out = heapless::String::new();
    for c in s.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
    out
}

impl fmt::Display for CommandFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Failed(reason) => write!(f, "failed: {reason}"),
            Self::Panicked(reason) => write!(f, "panicked: {reason}"),
        }
    }
}

impl From<CommandFault> for Error {
    fn from(e: CommandFault) -> Self {
        Self::Command(e)
    }
}

// ---------------------------------------------------------------------------
// Safety interlock trips
// ---------------------------------------------------------------------------

/// Which soft limit an interlock trip protected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SafetyTrip {
    /// Output pushed toward the upper soft limit inside the margin.
    UpperSoftLimit,
    /// Output pushed toward the lower soft limit inside the margin.
    LowerSoftLimit,
}

impl fmt::Display for SafetyTrip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UpperSoftLimit => write!(f, "upper soft limit"),
            Self::LowerSoftLimit => write!(f, "lower soft limit"),
        }
    }
}

impl From<SafetyTrip> for Error {
    fn from(e: SafetyTrip) -> Self {
        Self::Safety(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;

/// Status returned by command lifecycle callbacks.
pub type CommandResult = core::result::Result<(), CommandFault>;
