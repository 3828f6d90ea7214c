//! Integration test driver for `tests/integration/` submodules.
//!
//! Each `mod` below maps to a file that exercises the recognizer against
//! the simulated platform. Everything runs on the host with no real
//! hardware.

mod scenario_tests;
