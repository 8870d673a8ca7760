//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises a specific component
//! through the full runtime against mock adapters.  All tests run on the
//! host (x86_64) with no real hardware required.

mod access_flow_tests;
mod connectivity_tests;
mod ota_flow_tests;
mod remote_command_tests;
mod telemetry_tests;
