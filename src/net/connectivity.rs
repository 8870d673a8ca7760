//! Connectivity manager: link and bus session supervision.
//!
//! ```text
//!               link up                       bus.connect ok
//!  Disconnected ───────▶ Connected ── session ──────────────▶ Session up
//!       │  ▲                 │                                   │
//!  connect│  │link up         │link down                  pump ─┘ (inbound)
//!       ▼  │                 ▼
//!   Connecting ◀──────── Connecting
//!       │
//!       └─ attempts == max ─▶ Exhausted (observe only)
//! ```
//!
//! The link side runs on the backoff cadence.  The session side runs every
//! pass while the link is up and rate-limits its own connect attempts.
//! Whenever the link is not up the session is forced down.

use log::{debug, info, warn};

use crate::app::ports::{BusPort, LinkPort, SessionCredentials};
use crate::config::DeviceConfig;
use crate::scheduler::{Cadence, Millis};

use super::backoff::{Backoff, BackoffPolicy};
use super::channels::InboundMessage;

/// Most inbound messages collected from one pump.
pub const MAX_INBOUND_PER_PASS: usize = 8;

/// Messages collected from one bus pump, handled later in the same pass.
pub type InboundBatch = heapless::Vec<InboundMessage, MAX_INBOUND_PER_PASS>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Disconnected,
    Connecting,
    Connected,
}

/// [`LinkState`] plus the terminal exhausted sub-state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkPhase {
    Disconnected,
    Connecting,
    Connected,
    /// Attempt budget spent.  Link status is still observed.
    Exhausted,
}

/// Link transitions reported by [`ConnectivityManager::tick_link`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkEvent {
    /// Connect attempt number `n` issued.
    Attempt(u8),
    Connected,
    /// A connected link was observed down.
    Lost,
    /// First pass on which the attempt budget was found spent.
    Exhausted,
}

/// Session transitions reported by [`ConnectivityManager::tick_session`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    Connected,
    /// Connect attempt refused or subscribe failed.
    Failed,
    Lost,
}

pub struct ConnectivityManager {
    link_state: LinkState,
    session_connected: bool,
    backoff: Backoff,
    exhausted_reported: bool,
    session_retry: Cadence,
    client_id: String,
    username: String,
    password: String,
    command_topic: String,
}

impl ConnectivityManager {
    pub fn new(config: &DeviceConfig) -> Self {
        Self {
            link_state: LinkState::Disconnected,
            session_connected: false,
            backoff: Backoff::new(BackoffPolicy::from_timing(&config.timing)),
            exhausted_reported: false,
            session_retry: Cadence::after(config.timing.session_retry_ms),
            client_id: config.device_id.clone(),
            username: config.broker.username.clone(),
            password: config.broker.password.clone(),
            command_topic: config.topics.command.clone(),
        }
    }

    // ── Link ──────────────────────────────────────────────────

    /// Backoff-gated link supervision.
    pub fn tick_link(&mut self, now: Millis, link: &mut dyn LinkPort) -> Option<LinkEvent> {
        if !self.backoff.check_due(now) {
            return None;
        }

        if link.is_up() {
            if self.link_state == LinkState::Connected {
                return None;
            }
            self.link_state = LinkState::Connected;
            self.backoff.reset();
            self.exhausted_reported = false;
            info!("Link: connected");
            return Some(LinkEvent::Connected);
        }

        let lost = self.link_state == LinkState::Connected;
        if lost {
            warn!("Link: lost");
            self.link_state = LinkState::Connecting;
            self.session_connected = false;
        }

        if self.backoff.is_exhausted() {
            if lost {
                return Some(LinkEvent::Lost);
            }
            if !self.exhausted_reported {
                self.exhausted_reported = true;
                warn!(
                    "Link: giving up after {} attempts",
                    self.backoff.policy().max_attempts
                );
                return Some(LinkEvent::Exhausted);
            }
            return None;
        }

        if let Err(e) = link.connect() {
            warn!("Link: connect request failed: {}", e);
        }
        self.backoff.record_attempt();
        self.link_state = LinkState::Connecting;
        let n = self.backoff.attempts();
        debug!(
            "Link: attempt {} (next check in {}ms)",
            n,
            self.backoff.interval_ms()
        );
        if lost {
            Some(LinkEvent::Lost)
        } else {
            Some(LinkEvent::Attempt(n))
        }
    }

    // ── Session ───────────────────────────────────────────────

    /// Session supervision and bus pump.  Inbound messages land in `inbound`
    /// for the caller to dispatch once the bus borrow is released.
    pub fn tick_session(
        &mut self,
        now: Millis,
        bus: &mut dyn BusPort,
        inbound: &mut InboundBatch,
    ) -> Option<SessionEvent> {
        if self.link_state != LinkState::Connected {
            self.session_connected = false;
            return None;
        }

        if bus.is_connected() {
            let mut event = None;
            if !self.session_connected {
                // Acknowledged after the connect call that started it returned.
                if !self.session_retry.fire_if_due(now) {
                    return None;
                }
                let opened = self.subscribe(bus);
                if opened != SessionEvent::Connected {
                    return Some(opened);
                }
                event = Some(opened);
            }
            bus.pump(&mut |topic, payload| match InboundMessage::copy_from(topic, payload) {
                Some(msg) => {
                    if inbound.push(msg).is_err() {
                        warn!("Bus: inbound batch full, dropped message on '{}'", topic);
                    }
                }
                None => warn!("Bus: dropped oversized message on '{}'", topic),
            });
            return event;
        }

        let was_connected = self.session_connected;
        self.session_connected = false;
        if was_connected {
            warn!("Bus: session lost");
            return Some(SessionEvent::Lost);
        }

        if !self.session_retry.fire_if_due(now) {
            return None;
        }
        Some(self.open_session(bus))
    }

    fn open_session(&mut self, bus: &mut dyn BusPort) -> SessionEvent {
        let credentials = SessionCredentials {
            client_id: &self.client_id,
            username: &self.username,
            password: &self.password,
        };
        if let Err(e) = bus.connect(&credentials) {
            warn!("Bus: {}", e);
            return SessionEvent::Failed;
        }
        self.subscribe(bus)
    }

    fn subscribe(&mut self, bus: &mut dyn BusPort) -> SessionEvent {
        if let Err(e) = bus.subscribe(&self.command_topic) {
            warn!("Bus: {} on '{}'", e, self.command_topic);
            return SessionEvent::Failed;
        }
        self.session_connected = true;
        info!("Bus: session up, subscribed to '{}'", self.command_topic);
        SessionEvent::Connected
    }

    // ── Observation ──────────────────────────────────────────

    pub fn link_state(&self) -> LinkState {
        self.link_state
    }

    pub fn phase(&self) -> LinkPhase {
        match self.link_state {
            LinkState::Connected => LinkPhase::Connected,
            _ if self.backoff.is_exhausted() => LinkPhase::Exhausted,
            LinkState::Connecting => LinkPhase::Connecting,
            LinkState::Disconnected => LinkPhase::Disconnected,
        }
    }

    pub fn is_link_up(&self) -> bool {
        self.link_state == LinkState::Connected
    }

    pub fn session_connected(&self) -> bool {
        self.link_state == LinkState::Connected && self.session_connected
    }

    pub fn attempts(&self) -> u8 {
        self.backoff.attempts()
    }

    pub fn is_exhausted(&self) -> bool {
        self.backoff.is_exhausted()
    }

    pub fn current_interval_ms(&self) -> Millis {
        self.backoff.interval_ms()
    }
}
