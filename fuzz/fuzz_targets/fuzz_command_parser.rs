//! Fuzz target: inbound command handling
//!
//! Feeds arbitrary bytes as a bus payload on the command topic and checks:
//! - No panics under arbitrary input
//! - A command is only returned for this device's `type: "command"` documents
//!
//! cargo fuzz run fuzz_command_parser

#![no_main]

use libfuzzer_sys::fuzz_target;
use lokify::remote::{RemoteCommandHandler, parse_command};

fuzz_target!(|data: &[u8]| {
    let handler = RemoteCommandHandler::new("lock_01");
    if handler.handle("farmlab/door", data).is_some() {
        let doc = parse_command(data).expect("accepted payload must parse");
        assert_eq!(doc.kind, "command");
        assert_eq!(doc.device_id, "lock_01");
    }
});
