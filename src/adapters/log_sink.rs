//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured runtime events to the
//! ESP-IDF logger (UART / USB-CDC in production).  A panel adapter would
//! implement the same trait.

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::net::{LinkEvent, SessionEvent};

use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started(version) => {
                info!("START | fw={}", version);
            }
            AppEvent::AccessDecided { uid, granted } => {
                info!(
                    "RFID  | {} | {}",
                    uid,
                    if *granted { "Access Granted" } else { "Access Denied" }
                );
            }
            AppEvent::Remote(cmd) => {
                info!("REMOTE| {:?}", cmd);
            }
            AppEvent::Link(LinkEvent::Attempt(n)) => {
                info!("WIFI  | connecting... ({})", n);
            }
            AppEvent::Link(LinkEvent::Connected) => {
                info!("WIFI  | connected");
            }
            AppEvent::Link(LinkEvent::Lost) => {
                warn!("WIFI  | lost");
            }
            AppEvent::Link(LinkEvent::Exhausted) => {
                warn!("WIFI  | failed, retry later");
            }
            AppEvent::Session(SessionEvent::Connected) => {
                info!("MQTT  | connected");
            }
            AppEvent::Session(SessionEvent::Failed) => {
                info!("MQTT  | connect failed");
            }
            AppEvent::Session(SessionEvent::Lost) => {
                warn!("MQTT  | lost");
            }
            AppEvent::OtaStateChanged(state) => {
                info!("OTA   | {}", state);
            }
            AppEvent::OtaProgress { written, total } => {
                info!("OTA   | {}/{} bytes", written, total);
            }
            AppEvent::Status(s) => {
                info!(
                    "STATUS| link={:?} (attempts {}) | mqtt={} | ota={} | door={}",
                    s.link,
                    s.link_attempts,
                    if s.session { "up" } else { "down" },
                    s.ota,
                    if s.unlocked { "unlocked" } else { "locked" },
                );
            }
        }
    }
}
