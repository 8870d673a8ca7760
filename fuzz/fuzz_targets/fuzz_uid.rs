//! Fuzz target: badge UID canonicalization
//!
//! Raw reader bytes always canonicalize to a string that parses back to the
//! same UID.
//!
//! cargo fuzz run fuzz_uid

#![no_main]

use libfuzzer_sys::fuzz_target;
use lokify::access::{BadgeUid, UID_STR_CAP};

fuzz_target!(|data: &[u8]| {
    let uid = BadgeUid::from_bytes(data);
    assert!(uid.as_str().len() <= UID_STR_CAP);
    if !data.is_empty() {
        assert_eq!(BadgeUid::parse(uid.as_str()), Some(uid));
    }
    if let Ok(text) = core::str::from_utf8(data) {
        let _ = BadgeUid::parse(text);
    }
});
