//! Telemetry publisher: periodic heartbeats.
//!
//! Every interval a heartbeat with the current status goes out on the
//! heartbeat topic.  The cadence advances whether or not the session is up,
//! so a heartbeat is never sent late to make up for a missed one.

use crate::app::events::StatusSnapshot;
use crate::app::ports::BusPort;
use crate::messages::Heartbeat;
use crate::net::{BusPublisher, LinkPhase};
use crate::scheduler::{Cadence, Millis};

pub struct TelemetryPublisher {
    cadence: Cadence,
}

impl TelemetryPublisher {
    pub fn new(interval_ms: Millis) -> Self {
        Self {
            cadence: Cadence::every(interval_ms),
        }
    }

    /// Publish a heartbeat if one is due.  Returns `true` if it was handed
    /// to the bus.
    pub fn tick(
        &mut self,
        now: Millis,
        device_id: &str,
        fw_version: &str,
        status: &StatusSnapshot,
        publisher: &BusPublisher,
        bus: &mut dyn BusPort,
    ) -> bool {
        if !self.cadence.fire_if_due(now) {
            return false;
        }
        let heartbeat = Heartbeat::new(
            device_id,
            status.link == LinkPhase::Connected,
            status.session,
            status.ota,
            fw_version,
            now,
        );
        publisher.publish_heartbeat(bus, status.session, &heartbeat)
    }
}
