//! Inbound commands to the runtime.
//!
//! Remote operators address a device by id on the shared command topic.
//! The [`RemoteCommandHandler`](crate::remote::RemoteCommandHandler) turns
//! accepted documents into these and the
//! [`Runtime`](super::service::Runtime) acts on them.

/// Door commands that can arrive over the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteCommand {
    /// Pulse the relay exactly as a granted badge would.
    Unlock,
    /// Drop the relay immediately, cancelling any pulse in progress.
    Lock,
}

impl RemoteCommand {
    /// Map the `command` field of an inbound document.  Case-sensitive.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "unlock" => Some(Self::Unlock),
            "lock" => Some(Self::Lock),
            _ => None,
        }
    }
}
