pub mod pid;

pub use pid::{PidController, PidGains};
