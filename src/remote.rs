//! Remote command handler.
//!
//! Accepts `{"type":"command","command":"unlock"|"lock","device_id":...}`
//! on the command topic.  Anything else is dropped quietly: malformed JSON,
//! another `type` (including this device's own events echoed back on the
//! shared topic), another device id, or an unknown command name.

use log::debug;

use crate::app::commands::RemoteCommand;
use crate::messages::{InboundCommand, TYPE_COMMAND};

pub struct RemoteCommandHandler {
    device_id: String,
}

impl RemoteCommandHandler {
    pub fn new(device_id: &str) -> Self {
        Self {
            device_id: device_id.to_string(),
        }
    }

    /// Returns the command to apply, if the message is one for this device.
    pub fn handle(&self, topic: &str, payload: &[u8]) -> Option<RemoteCommand> {
        let doc = match parse_command(payload) {
            Some(doc) => doc,
            None => {
                debug!("Remote: unparseable payload on '{}' ({} bytes)", topic, payload.len());
                return None;
            }
        };
        if doc.kind != TYPE_COMMAND {
            return None;
        }
        if doc.device_id != self.device_id {
            debug!("Remote: command for '{}' ignored", doc.device_id);
            return None;
        }
        let cmd = RemoteCommand::from_name(&doc.command);
        if cmd.is_none() {
            debug!("Remote: unknown command '{}'", doc.command);
        }
        cmd
    }
}

/// Parse an inbound command document.  Missing fields read as `""`.
pub fn parse_command(payload: &[u8]) -> Option<InboundCommand> {
    serde_json::from_slice(payload).ok()
}
