//! Fire-and-forget outbound publishing.
//!
//! Every publish is gated on the session state owned by the connectivity
//! manager, which the caller passes in.  A down session or a refused publish
//! is logged and dropped; nothing is queued or retried.

use log::{debug, warn};
use serde::Serialize;

use crate::app::ports::BusPort;
use crate::messages::{DoorEvent, Heartbeat};

/// Largest serialised outbound document.
pub const MAX_OUTBOUND_LEN: usize = 256;

/// Topic-bound publisher.  Holds the configured event and heartbeat topics.
pub struct BusPublisher {
    event_topic: String,
    heartbeat_topic: String,
}

impl BusPublisher {
    pub fn new(event_topic: &str, heartbeat_topic: &str) -> Self {
        Self {
            event_topic: event_topic.to_string(),
            heartbeat_topic: heartbeat_topic.to_string(),
        }
    }

    /// Returns `true` if the event was handed to the bus.
    pub fn publish_event(
        &self,
        bus: &mut dyn BusPort,
        session_up: bool,
        event: &DoorEvent<'_>,
    ) -> bool {
        publish_json(bus, session_up, &self.event_topic, event)
    }

    pub fn publish_heartbeat(
        &self,
        bus: &mut dyn BusPort,
        session_up: bool,
        heartbeat: &Heartbeat<'_>,
    ) -> bool {
        publish_json(bus, session_up, &self.heartbeat_topic, heartbeat)
    }
}

fn publish_json<T: Serialize>(bus: &mut dyn BusPort, session_up: bool, topic: &str, doc: &T) -> bool {
    if !session_up {
        debug!("Bus: session down, skipped publish to '{}'", topic);
        return false;
    }
    let payload = match serde_json::to_vec(doc) {
        Ok(payload) if payload.len() <= MAX_OUTBOUND_LEN => payload,
        Ok(payload) => {
            warn!("Bus: {}-byte document for '{}' dropped", payload.len(), topic);
            return false;
        }
        Err(e) => {
            warn!("Bus: failed to encode document for '{}': {}", topic, e);
            return false;
        }
    };
    match bus.publish(topic, &payload) {
        Ok(()) => true,
        Err(e) => {
            warn!("Bus: {} on '{}'", e, topic);
            false
        }
    }
}
