//! Outbound application events.
//!
//! The [`Runtime`](super::service::Runtime) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them: log to serial, draw on a panel,
//! record for a test.

use crate::access::BadgeUid;
use crate::net::{LinkEvent, LinkPhase, SessionEvent};
use crate::ota::OtaState;

use super::commands::RemoteCommand;

/// Structured events emitted by the door runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// The runtime has started (carries the running firmware version).
    Started(&'static str),

    /// A badge read was decided.
    AccessDecided { uid: BadgeUid, granted: bool },

    /// An addressed remote command was applied.
    Remote(RemoteCommand),

    Link(LinkEvent),

    Session(SessionEvent),

    OtaStateChanged(OtaState),

    /// Image bytes staged so far out of the declared total.
    OtaProgress { written: usize, total: usize },

    /// Status indicators changed since the last refresh.
    Status(StatusSnapshot),
}

/// A point-in-time view of the indicators shown to people at the door.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusSnapshot {
    pub link: LinkPhase,
    pub session: bool,
    pub ota: OtaState,
    pub unlocked: bool,
    pub link_attempts: u8,
}
