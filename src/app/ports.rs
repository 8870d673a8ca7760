//! Port traits: the hexagonal boundary between the door runtime and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ Runtime (domain)
//! ```
//!
//! Driven adapters (Wi-Fi, MQTT, HTTP, flash staging, badge reader, relay,
//! presentation) implement these traits.  The [`Runtime`](super::service::Runtime)
//! consumes them through a [`Ports`] bundle, so the domain core never touches
//! hardware directly and every component can be driven from host tests.
//!
//! ## Contract notes
//!
//! - Every call is expected to return promptly, except [`HttpPort::get`] /
//!   [`HttpPort::read`] and [`FirmwarePort::write`], which the OTA updater is
//!   allowed to block on for the duration of a firmware transfer.
//! - Relay writes have no failure path at this boundary.  Adapters log and
//!   swallow GPIO errors.

use core::fmt;

use crate::access::BadgeUid;

// ───────────────────────────────────────────────────────────────
// Network link port (Wi-Fi station)
// ───────────────────────────────────────────────────────────────

/// Physical network link.  The Connectivity Manager is its only caller.
pub trait LinkPort {
    /// Kick off one association attempt.  Non-blocking: the outcome is
    /// observed later through [`is_up`](Self::is_up).
    fn connect(&mut self) -> Result<(), LinkError>;

    /// Whether the platform currently reports an associated link with an IP.
    fn is_up(&self) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Message bus port (MQTT session)
// ───────────────────────────────────────────────────────────────

/// Credentials and identity presented when opening a bus session.
#[derive(Debug, Clone, Copy)]
pub struct SessionCredentials<'a> {
    pub client_id: &'a str,
    /// Empty string means "no username".
    pub username: &'a str,
    /// Empty string means "no password".
    pub password: &'a str,
}

/// Publish/subscribe session on top of the link.
pub trait BusPort {
    /// Open (or re-open) the session.  `Ok` means the session is usable now.
    fn connect(&mut self, credentials: &SessionCredentials<'_>) -> Result<(), BusError>;

    /// Whether the session is currently usable.
    fn is_connected(&self) -> bool;

    fn subscribe(&mut self, topic: &str) -> Result<(), BusError>;

    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), BusError>;

    /// Service session I/O and hand every inbound message to `on_message`.
    fn pump(&mut self, on_message: &mut dyn FnMut(&str, &[u8]));
}

// ───────────────────────────────────────────────────────────────
// HTTP port (manifest + firmware fetch)
// ───────────────────────────────────────────────────────────────

/// Status line and declared size of a response whose body is pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseHead {
    pub status: u16,
    /// `Content-Length`, when the server declared one.
    pub content_length: Option<usize>,
}

/// Minimal blocking HTTP client.  One request is open at a time: `get`
/// opens it, `read` drains the body, `close` releases it.
pub trait HttpPort {
    fn get(&mut self, url: &str) -> Result<ResponseHead, HttpError>;

    /// Read the next body bytes.  `Ok(0)` marks the end of the body.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, HttpError>;

    fn close(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Firmware staging port (inactive OTA partition)
// ───────────────────────────────────────────────────────────────

/// Staged write of a new image into the inactive partition.
pub trait FirmwarePort {
    /// Open the staging region sized for `size` bytes.
    fn begin(&mut self, size: usize) -> Result<(), FlashError>;

    /// Append bytes to the staged image.  Returns the number accepted.
    fn write(&mut self, data: &[u8]) -> Result<usize, FlashError>;

    /// Validate the staged image and mark it bootable.
    fn finalize(&mut self) -> Result<(), FlashError>;

    /// Drop a partially staged image.
    fn abort(&mut self);

    /// Restart into the newly staged image.  Never returns on hardware;
    /// host doubles record the call and return.
    fn restart(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Badge reader port
// ───────────────────────────────────────────────────────────────

/// Maximum UID length for ISO 14443A (triple-size UID).
pub const MAX_UID_BYTES: usize = 10;

/// Raw UID bytes as delivered by the reader.
pub type RawUid = heapless::Vec<u8, MAX_UID_BYTES>;

/// Proximity badge reader.
pub trait BadgeReaderPort {
    /// A card entered the field since the last halt.
    fn is_new_card_present(&mut self) -> bool;

    /// Select the card and return its UID bytes.
    fn read_uid(&mut self) -> Option<RawUid>;

    /// Put the card to sleep so it is not re-reported until it leaves the field.
    fn halt(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Relay port
// ───────────────────────────────────────────────────────────────

/// Door strike relay.  `energize` unlocks, `de_energize` returns to the
/// locked rest level.
pub trait RelayPort {
    fn energize(&mut self);
    fn de_energize(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Allow-list provider
// ───────────────────────────────────────────────────────────────

/// Membership source for access decisions.
pub trait AllowListProvider {
    fn contains(&self, uid: &BadgeUid) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (presentation)
// ───────────────────────────────────────────────────────────────

/// The runtime emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go (serial log, TFT
/// panel, test recorder).
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Port bundle
// ───────────────────────────────────────────────────────────────

/// Every driven adapter the runtime touches during one scheduler pass.
pub struct Ports<'a> {
    pub link: &'a mut dyn LinkPort,
    pub bus: &'a mut dyn BusPort,
    pub http: &'a mut dyn HttpPort,
    pub firmware: &'a mut dyn FirmwarePort,
    pub reader: &'a mut dyn BadgeReaderPort,
    pub relay: &'a mut dyn RelayPort,
    pub sink: &'a mut dyn EventSink,
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`LinkPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkError {
    /// No SSID configured.
    NoCredentials,
    /// The driver refused to start an association.
    ConnectFailed,
}

/// Errors from [`BusPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusError {
    /// Broker unreachable or refused the session.
    ConnectFailed,
    /// Operation requires an open session.
    NotConnected,
    SubscribeFailed,
    PublishFailed,
}

/// Errors from [`HttpPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpError {
    /// TCP / TLS / request-level failure.
    Transport,
    /// Body read failed mid-stream.
    Read,
}

/// Errors from [`FirmwarePort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashError {
    /// No inactive partition, or image too large for it.
    BeginFailed,
    WriteFailed,
    /// Image validation or boot-partition switch failed.
    FinalizeFailed,
}

impl fmt::Display for LinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoCredentials => write!(f, "no link credentials configured"),
            Self::ConnectFailed => write!(f, "link connect failed"),
        }
    }
}

impl fmt::Display for BusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConnectFailed => write!(f, "bus connect failed"),
            Self::NotConnected => write!(f, "bus not connected"),
            Self::SubscribeFailed => write!(f, "bus subscribe failed"),
            Self::PublishFailed => write!(f, "bus publish failed"),
        }
    }
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport => write!(f, "HTTP transport error"),
            Self::Read => write!(f, "HTTP body read error"),
        }
    }
}

impl fmt::Display for FlashError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BeginFailed => write!(f, "staging begin failed"),
            Self::WriteFailed => write!(f, "staging write failed"),
            Self::FinalizeFailed => write!(f, "staging finalize failed"),
        }
    }
}
