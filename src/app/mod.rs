//! Application core: door-controller domain logic behind port traits.
//!
//! This module holds the runtime that sequences the access, actuation,
//! connectivity, remote-command, OTA and telemetry components.  All
//! interaction with hardware and the network happens through the
//! **port traits** defined in [`ports`], keeping this layer fully testable
//! without real peripherals.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
