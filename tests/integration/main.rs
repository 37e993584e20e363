//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises one area of the crate
//! against the mock robot in `mock_hw`.  All tests run on the host with
//! no real hardware required.

mod lift_tests;
mod scheduler_tests;
mod service_tests;
