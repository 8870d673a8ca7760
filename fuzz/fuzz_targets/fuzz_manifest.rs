//! Fuzz target: OTA manifest parser
//!
//! Arbitrary response bodies must either parse or yield a typed error, and
//! bodies over the size limit are always rejected.
//!
//! cargo fuzz run fuzz_manifest

#![no_main]

use libfuzzer_sys::fuzz_target;
use lokify::ota::{MAX_MANIFEST_LEN, Manifest, OtaError};

fuzz_target!(|data: &[u8]| {
    match Manifest::parse(data) {
        Ok(m) => {
            assert!(data.len() <= MAX_MANIFEST_LEN);
            let url = m.image_url("http://host/fw/");
            assert!(url.ends_with(&m.file));
        }
        Err(OtaError::ManifestTooLarge) => assert!(data.len() > MAX_MANIFEST_LEN),
        Err(OtaError::ManifestMalformed) => {}
        Err(e) => panic!("unexpected manifest error: {}", e),
    }
});
