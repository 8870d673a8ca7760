//! Bus message schemas.
//!
//! Outbound documents borrow from runtime state for the length of one
//! publish, and decode borrowing from the payload they were read from. The inbound command document owns its fields so a payload
//! that omits any of them still parses (missing fields read as `""`).

use serde::{Deserialize, Serialize};

use crate::ota::OtaState;
use crate::scheduler::Millis;

/// Every outbound document is tagged as originating on the device.
pub const SOURCE_LOCAL: &str = "local";

/// `type` tag of inbound commands.
pub const TYPE_COMMAND: &str = "command";

/// Periodic status report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heartbeat<'a> {
    pub device_id: &'a str,
    #[serde(rename = "type")]
    pub kind: &'a str,
    pub wifi: bool,
    pub mqtt: bool,
    pub ota: OtaState,
    pub fw_version: &'a str,
    pub timestamp: Millis,
    pub source: &'a str,
}

impl<'a> Heartbeat<'a> {
    pub fn new(
        device_id: &'a str,
        wifi: bool,
        mqtt: bool,
        ota: OtaState,
        fw_version: &'a str,
        timestamp: Millis,
    ) -> Self {
        Self {
            device_id,
            kind: "heartbeat",
            wifi,
            mqtt,
            ota,
            fw_version,
            timestamp,
            source: SOURCE_LOCAL,
        }
    }
}

/// What happened at the door.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DoorEventKind {
    AccessGranted,
    AccessDenied,
    RemoteUnlock,
    RemoteLock,
}

/// Door position reported alongside an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DoorStatus {
    Locked,
    Unlocked,
}

impl DoorEventKind {
    /// Status implied by the event.
    pub fn status(self) -> DoorStatus {
        match self {
            Self::AccessGranted | Self::RemoteUnlock => DoorStatus::Unlocked,
            Self::AccessDenied | Self::RemoteLock => DoorStatus::Locked,
        }
    }
}

/// Access or remote-command outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoorEvent<'a> {
    pub device_id: &'a str,
    #[serde(rename = "type")]
    pub kind: &'a str,
    pub event: DoorEventKind,
    pub status: DoorStatus,
    /// Canonical badge UID, or `""` for remote commands.
    pub uid: &'a str,
    pub timestamp: Millis,
    pub source: &'a str,
}

impl<'a> DoorEvent<'a> {
    pub fn new(device_id: &'a str, event: DoorEventKind, uid: &'a str, timestamp: Millis) -> Self {
        Self {
            device_id,
            kind: "event",
            event,
            status: event.status(),
            uid,
            timestamp,
            source: SOURCE_LOCAL,
        }
    }
}

/// Inbound command document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct InboundCommand {
    #[serde(rename = "type")]
    pub kind: String,
    pub command: String,
    pub device_id: String,
}
