//! Inbound bus mailbox.
//!
//! The ESP-IDF MQTT client delivers messages from its own task.  They cross
//! into the cooperative control loop through a bounded `embassy-sync`
//! channel and are drained by the bus pump, so every component state is still
//! written from the control loop only.
//!
//! ```text
//! ┌──────────────┐  InboundMessage  ┌──────────────┐
//! │  MQTT task   │─────────────────▶│ Control Loop │
//! │  (callback)  │    INBOUND        │  (bus pump)  │
//! └──────────────┘                   └──────────────┘
//! ```

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use log::warn;

/// Longest accepted topic name.
pub const MAX_TOPIC_LEN: usize = 64;

/// Largest accepted inbound payload (command documents are tiny).
pub const MAX_PAYLOAD_LEN: usize = 256;

/// Channel depth for inbound messages.
const INBOUND_DEPTH: usize = 8;

/// One message received on a subscribed topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub topic: heapless::String<MAX_TOPIC_LEN>,
    pub payload: heapless::Vec<u8, MAX_PAYLOAD_LEN>,
}

impl InboundMessage {
    /// Copy a received message.  Returns `None` if it does not fit.
    pub fn copy_from(topic: &str, payload: &[u8]) -> Option<Self> {
        let mut t = heapless::String::new();
        t.push_str(topic).ok()?;
        let p = heapless::Vec::from_slice(payload).ok()?;
        Some(Self {
            topic: t,
            payload: p,
        })
    }
}

/// Inbound channel: MQTT task → control loop.
pub static INBOUND: Channel<CriticalSectionRawMutex, InboundMessage, INBOUND_DEPTH> = Channel::new();

/// Queue a received message for the control loop.  Oversized messages and
/// messages arriving while the mailbox is full are dropped.
pub fn post_inbound(topic: &str, payload: &[u8]) -> bool {
    let Some(msg) = InboundMessage::copy_from(topic, payload) else {
        warn!("Bus: dropped oversized message on '{}' ({} bytes)", topic, payload.len());
        return false;
    };
    if INBOUND.try_send(msg).is_err() {
        warn!("Bus: inbound mailbox full, dropped message on '{}'", topic);
        return false;
    }
    true
}

/// Hand every queued message to `on_message`, oldest first.
pub fn drain_inbound(on_message: &mut dyn FnMut(&str, &[u8])) {
    while let Ok(msg) = INBOUND.try_receive() {
        on_message(msg.topic.as_str(), &msg.payload);
    }
}
