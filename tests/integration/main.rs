//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises a specific subsystem
//! against mock pins and the simulated GATT server.  All tests run on the
//! host (x86_64) with no real hardware required.

mod blinker_tests;
mod button_tests;
mod gateway_tests;
mod mock_hw;
mod sniffer_tests;
