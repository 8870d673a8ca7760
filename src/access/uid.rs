//! Canonical badge UID representation.
//!
//! Readers hand back raw bytes; everything above the reader port works with
//! the canonical text form: two uppercase hex digits per byte, joined by `:`
//! (`[0x93, 0x9B, 0xD7, 0xAA]` → `"93:9B:D7:AA"`).

use core::fmt::{self, Write};

use crate::app::ports::MAX_UID_BYTES;

/// Longest canonical string: 10 bytes × 2 digits + 9 separators.
pub const UID_STR_CAP: usize = MAX_UID_BYTES * 3 - 1;

/// Canonical badge identifier.  Produced fresh on every read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct BadgeUid(heapless::String<UID_STR_CAP>);

impl BadgeUid {
    /// Canonicalize raw reader bytes.  Bytes beyond [`MAX_UID_BYTES`] are ignored.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut s = heapless::String::new();
        for (i, byte) in bytes.iter().take(MAX_UID_BYTES).enumerate() {
            if i > 0 {
                let _ = s.push(':');
            }
            let _ = write!(s, "{byte:02X}");
        }
        Self(s)
    }

    /// Parse a configured UID.  Hex digits may be in either case; the stored
    /// form is always canonical.  Returns `None` for anything else.
    pub fn parse(text: &str) -> Option<Self> {
        let mut bytes: heapless::Vec<u8, MAX_UID_BYTES> = heapless::Vec::new();
        for part in text.split(':') {
            if part.len() != 2 || !part.bytes().all(|b| b.is_ascii_hexdigit()) {
                return None;
            }
            let byte = u8::from_str_radix(part, 16).ok()?;
            bytes.push(byte).ok()?;
        }
        Some(Self::from_bytes(&bytes))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for BadgeUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
