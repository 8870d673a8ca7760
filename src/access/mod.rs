//! Access controller: badge debounce and allow-list decisions.
//!
//! ```text
//!  reader ──▶ canonical UID ──▶ debounce ──▶ allow-list ──▶ decision
//!                                  │                          │
//!                               suppressed            Runtime pulses relay,
//!                                                     publishes, notifies sink
//! ```
//!
//! The controller only decides.  Acting on a decision (relay pulse, event
//! publish, presentation) is the runtime's job, so the same decision path can
//! be exercised in isolation.

mod allow_list;
mod uid;

pub use allow_list::{MAX_ALLOWED, StaticAllowList};
pub use uid::{BadgeUid, UID_STR_CAP};

use log::{debug, info};

use crate::app::ports::{AllowListProvider, BadgeReaderPort};
use crate::config::TimingConfig;
use crate::scheduler::{Cadence, Millis};

/// Outcome of one processed badge read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDecision {
    Granted(BadgeUid),
    Denied(BadgeUid),
}

impl AccessDecision {
    pub fn uid(&self) -> &BadgeUid {
        match self {
            Self::Granted(uid) | Self::Denied(uid) => uid,
        }
    }

    pub fn is_granted(&self) -> bool {
        matches!(self, Self::Granted(_))
    }
}

// ───────────────────────────────────────────────────────────────
// Debounce
// ───────────────────────────────────────────────────────────────

/// Last processed UID and when it was processed.
#[derive(Debug, Clone, Default)]
pub struct DebounceRecord {
    last: Option<(BadgeUid, Millis)>,
}

impl DebounceRecord {
    /// Returns `true` if `uid` should be decided now, updating the record.
    ///
    /// The same UID inside `window_ms` of its last decision is suppressed; a
    /// different UID always proceeds and restarts the window.
    pub fn admit(&mut self, uid: &BadgeUid, now: Millis, window_ms: Millis) -> bool {
        if let Some((last_uid, at)) = &self.last {
            if last_uid == uid && now.saturating_sub(*at) < window_ms {
                return false;
            }
        }
        self.last = Some((uid.clone(), now));
        true
    }

    pub fn last_uid(&self) -> Option<&BadgeUid> {
        self.last.as_ref().map(|(uid, _)| uid)
    }
}

// ───────────────────────────────────────────────────────────────
// Controller
// ───────────────────────────────────────────────────────────────

pub struct AccessController<A: AllowListProvider> {
    allow: A,
    poll: Cadence,
    debounce: DebounceRecord,
    window_ms: Millis,
}

impl<A: AllowListProvider> AccessController<A> {
    pub fn new(allow: A, timing: &TimingConfig) -> Self {
        Self {
            allow,
            poll: Cadence::every(timing.reader_poll_ms),
            debounce: DebounceRecord::default(),
            window_ms: timing.debounce_window_ms,
        }
    }

    /// Poll the reader if the poll cadence is due.
    pub fn tick(&mut self, now: Millis, reader: &mut dyn BadgeReaderPort) -> Option<AccessDecision> {
        if !self.poll.fire_if_due(now) {
            return None;
        }
        if !reader.is_new_card_present() {
            return None;
        }
        let raw = reader.read_uid()?;
        let uid = BadgeUid::from_bytes(&raw);
        let decision = self.decide(uid, now);
        reader.halt();
        decision
    }

    /// Debounce and classify a canonical UID read at `now`.
    pub fn decide(&mut self, uid: BadgeUid, now: Millis) -> Option<AccessDecision> {
        if !self.debounce.admit(&uid, now, self.window_ms) {
            debug!("Access: {} debounced", uid);
            return None;
        }
        if self.allow.contains(&uid) {
            info!("Access: granted {}", uid);
            Some(AccessDecision::Granted(uid))
        } else {
            info!("Access: denied {}", uid);
            Some(AccessDecision::Denied(uid))
        }
    }
}
