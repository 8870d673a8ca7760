//! Update manifest: `{"version": "...", "file": "..."}`.

use serde::Deserialize;

use super::OtaError;

/// Largest manifest body accepted.
pub const MAX_MANIFEST_LEN: usize = 512;

/// Published firmware descriptor.  Both fields are required.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Manifest {
    pub version: String,
    /// Image file name, relative to the firmware base URL.
    pub file: String,
}

impl Manifest {
    pub fn parse(body: &[u8]) -> Result<Self, OtaError> {
        if body.len() > MAX_MANIFEST_LEN {
            return Err(OtaError::ManifestTooLarge);
        }
        serde_json::from_slice(body).map_err(|_| OtaError::ManifestMalformed)
    }

    /// Plain inequality: any published version other than ours is installed,
    /// including an older one.
    pub fn differs_from(&self, current: &str) -> bool {
        self.version != current
    }

    /// `base_url` followed directly by the file name.
    pub fn image_url(&self, base_url: &str) -> String {
        let mut url = String::with_capacity(base_url.len() + self.file.len());
        url.push_str(base_url);
        url.push_str(&self.file);
        url
    }
}
