//! Fixed allow-list loaded once at boot.

use crate::app::ports::AllowListProvider;
use crate::config::ConfigError;

use super::BadgeUid;

/// Maximum number of badges the static list can hold.
pub const MAX_ALLOWED: usize = 32;

/// Immutable, order-independent set of granted UIDs.
#[derive(Debug, Clone, Default)]
pub struct StaticAllowList {
    entries: heapless::Vec<BadgeUid, MAX_ALLOWED>,
}

impl StaticAllowList {
    /// Build from configured UID strings.  Duplicates collapse.
    pub fn from_strs<S: AsRef<str>>(uids: &[S]) -> Result<Self, ConfigError> {
        let mut entries = heapless::Vec::new();
        for text in uids {
            let uid = BadgeUid::parse(text.as_ref()).ok_or(ConfigError::MalformedUid)?;
            if entries.contains(&uid) {
                continue;
            }
            entries.push(uid).map_err(|_| ConfigError::AllowListFull)?;
        }
        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl AllowListProvider for StaticAllowList {
    fn contains(&self, uid: &BadgeUid) -> bool {
        self.entries.iter().any(|entry| entry == uid)
    }
}
