//! Lokify door controller firmware library.
//!
//! Exposes the pure-logic modules for integration testing and fuzzing.
//! All ESP-IDF-specific code is guarded by `#[cfg(target_os = "espidf")]`
//! within [`adapters`].

#![deny(unused_must_use)]

pub mod access;
pub mod actuation;
pub mod adapters;
pub mod app;
pub mod config;
pub mod error;
pub mod messages;
pub mod net;
pub mod ota;
pub mod remote;
pub mod scheduler;
pub mod telemetry;

/// Version reported in heartbeats and compared against the OTA manifest.
pub const FIRMWARE_VERSION: &str = env!("CARGO_PKG_VERSION");
