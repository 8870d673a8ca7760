//! Pull-based OTA updater.
//!
//! Polls a manifest over HTTP while the link is up.  When the published
//! version differs from the running one, the image is streamed straight into
//! the inactive partition and the device restarts into it.
//!
//! ```text
//!          poll (link up)            version differs
//!  Idle ─────────────────▶ Checking ─────────────────▶ Updating
//!   ▲ ▲                       │  │                      │    │
//!   │ └──── same version ─────┘  │ fetch/parse fail     │    │ finalize ok
//!   │                            ▼                      │    ▼
//!   └──── link up ───────────  Error ◀──── any failure ─┘   Idle → restart
//!                                │
//!                                └──── next poll ──▶ Checking
//! ```
//!
//! The transfer runs inside one scheduler pass and blocks it.  Progress is
//! reported through the event sink while it runs.

pub mod manifest;

use core::fmt;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::app::events::AppEvent;
use crate::app::ports::{EventSink, FirmwarePort, FlashError, HttpError, HttpPort};
use crate::config::OtaConfig;
use crate::scheduler::{Cadence, Millis};

pub use manifest::{MAX_MANIFEST_LEN, Manifest};

/// Body bytes moved per read/write round.
pub const CHUNK_SIZE: usize = 1024;

/// Progress is reported each time another tenth of the image lands.
const PROGRESS_STEPS: usize = 10;

// ── Error type ────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtaError {
    /// Manifest request answered with a non-200 status.
    ManifestStatus(u16),
    ManifestTransport(HttpError),
    ManifestTooLarge,
    ManifestMalformed,
    /// Image request answered with a non-200 status.
    ImageStatus(u16),
    ImageTransport(HttpError),
    /// The image response declared no size.
    MissingLength,
    Begin(FlashError),
    Finalize(FlashError),
}

impl fmt::Display for OtaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ManifestStatus(code) => write!(f, "manifest request returned HTTP {}", code),
            Self::ManifestTransport(e) => write!(f, "manifest request failed: {}", e),
            Self::ManifestTooLarge => {
                write!(f, "manifest exceeds {} bytes", MAX_MANIFEST_LEN)
            }
            Self::ManifestMalformed => write!(f, "manifest is not a valid descriptor"),
            Self::ImageStatus(code) => write!(f, "image request returned HTTP {}", code),
            Self::ImageTransport(e) => write!(f, "image request failed: {}", e),
            Self::MissingLength => write!(f, "image response has no content length"),
            Self::Begin(e) => write!(f, "{}", e),
            Self::Finalize(e) => write!(f, "{}", e),
        }
    }
}

// ── State machine ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OtaState {
    Idle,
    Checking,
    Updating,
    Error,
}

impl OtaState {
    /// Explicit transition table.  Self-transitions are always allowed.
    pub fn can_transition(self, to: OtaState) -> bool {
        use OtaState::{Checking, Error, Idle, Updating};
        if self == to {
            return true;
        }
        matches!(
            (self, to),
            (Idle, Checking)
                | (Idle, Error)
                | (Checking, Idle)
                | (Checking, Updating)
                | (Checking, Error)
                | (Updating, Idle)
                | (Updating, Error)
                | (Error, Checking)
                | (Error, Idle)
        )
    }
}

impl fmt::Display for OtaState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Checking => "checking",
            Self::Updating => "updating",
            Self::Error => "error",
        };
        f.write_str(s)
    }
}

// ── Updater ───────────────────────────────────────────────────

/// Bundle of the ports one OTA check touches.
pub struct OtaIo<'a> {
    pub http: &'a mut dyn HttpPort,
    pub firmware: &'a mut dyn FirmwarePort,
    pub sink: &'a mut dyn EventSink,
}

pub struct OtaUpdater {
    state: OtaState,
    poll: Cadence,
    manifest_url: String,
    base_url: String,
    current_version: &'static str,
}

impl OtaUpdater {
    pub fn new(config: &OtaConfig, poll_interval_ms: Millis, current_version: &'static str) -> Self {
        Self {
            // Nothing is known about the server until the first check.
            state: OtaState::Error,
            poll: Cadence::every(poll_interval_ms),
            manifest_url: config.manifest_url.clone(),
            base_url: config.base_url.clone(),
            current_version,
        }
    }

    pub fn state(&self) -> OtaState {
        self.state
    }

    /// Fresh link success: clear a stale error.
    pub fn on_link_up(&mut self, sink: &mut dyn EventSink) {
        if self.state == OtaState::Error {
            self.set_state(OtaState::Idle, sink);
        }
    }

    /// Link not connected: nothing can be fetched.
    pub fn force_error(&mut self, sink: &mut dyn EventSink) {
        if self.state != OtaState::Error {
            self.set_state(OtaState::Error, sink);
        }
    }

    /// Run one check if `ready` and the poll interval has elapsed.  The poll
    /// cadence is not consulted while not ready, so a deferred check runs on
    /// the first ready pass.
    pub fn tick(&mut self, now: Millis, ready: bool, io: &mut OtaIo<'_>) {
        if !ready || !self.poll.fire_if_due(now) {
            return;
        }
        if let Err(e) = self.check(io) {
            warn!("OTA: {}", e);
            self.set_state(OtaState::Error, io.sink);
        }
    }

    fn check(&mut self, io: &mut OtaIo<'_>) -> Result<(), OtaError> {
        self.set_state(OtaState::Checking, io.sink);

        let manifest = fetch_manifest(io.http, &self.manifest_url)?;
        if !manifest.differs_from(self.current_version) {
            debug!("OTA: running version {} is current", self.current_version);
            self.set_state(OtaState::Idle, io.sink);
            return Ok(());
        }

        info!(
            "OTA: {} published (running {})",
            manifest.version, self.current_version
        );
        self.set_state(OtaState::Updating, io.sink);
        let url = manifest.image_url(&self.base_url);
        let bytes = self.install(io, &url)?;

        self.set_state(OtaState::Idle, io.sink);
        info!("OTA: {} staged ({} bytes), restarting", manifest.version, bytes);
        io.firmware.restart();
        Ok(())
    }

    /// Fetch `url` into the inactive partition.  Returns bytes written.
    fn install(&mut self, io: &mut OtaIo<'_>, url: &str) -> Result<usize, OtaError> {
        info!("OTA: fetching {}", url);
        let head = io.http.get(url).map_err(OtaError::ImageTransport)?;
        if head.status != 200 {
            io.http.close();
            return Err(OtaError::ImageStatus(head.status));
        }
        let Some(total) = head.content_length else {
            io.http.close();
            return Err(OtaError::MissingLength);
        };
        if let Err(e) = io.firmware.begin(total) {
            io.http.close();
            return Err(OtaError::Begin(e));
        }

        let written = stream_image(io, total);
        io.http.close();

        if written != total {
            warn!("OTA: wrote {} of {} bytes", written, total);
        }
        if let Err(e) = io.firmware.finalize() {
            io.firmware.abort();
            return Err(OtaError::Finalize(e));
        }
        Ok(written)
    }

    fn set_state(&mut self, next: OtaState, sink: &mut dyn EventSink) {
        if self.state == next {
            return;
        }
        if !self.state.can_transition(next) {
            warn!("OTA: rejected transition {} -> {}", self.state, next);
            return;
        }
        debug!("OTA: {} -> {}", self.state, next);
        self.state = next;
        sink.emit(&AppEvent::OtaStateChanged(next));
    }
}

fn fetch_manifest(http: &mut dyn HttpPort, url: &str) -> Result<Manifest, OtaError> {
    let head = http.get(url).map_err(OtaError::ManifestTransport)?;
    if head.status != 200 {
        http.close();
        return Err(OtaError::ManifestStatus(head.status));
    }

    let mut body = [0u8; MAX_MANIFEST_LEN + 1];
    let mut len = 0;
    let read = loop {
        match http.read(&mut body[len..]) {
            Ok(0) => break Ok(()),
            Ok(n) => {
                len += n;
                if len == body.len() {
                    break Err(OtaError::ManifestTooLarge);
                }
            }
            Err(e) => break Err(OtaError::ManifestTransport(e)),
        }
    };
    http.close();
    read?;
    Manifest::parse(&body[..len])
}

/// Copy the response body into staging.  Stops at end of body, on a read
/// error, or on a write error; returns the bytes accepted.
fn stream_image(io: &mut OtaIo<'_>, total: usize) -> usize {
    let mut chunk = [0u8; CHUNK_SIZE];
    let mut written = 0usize;
    let mut reported = 0usize;
    loop {
        let n = match io.http.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) => {
                warn!("OTA: {} after {} bytes", e, written);
                break;
            }
        };
        match io.firmware.write(&chunk[..n]) {
            Ok(accepted) => {
                written += accepted;
                if accepted < n {
                    warn!("OTA: short write ({} of {} bytes)", accepted, n);
                    break;
                }
            }
            Err(e) => {
                warn!("OTA: {} after {} bytes", e, written);
                break;
            }
        }
        let step = progress_step(written, total);
        if step > reported {
            reported = step;
            io.sink.emit(&AppEvent::OtaProgress { written, total });
        }
    }
    written
}

fn progress_step(written: usize, total: usize) -> usize {
    if total == 0 {
        return PROGRESS_STEPS;
    }
    (written.min(total) * PROGRESS_STEPS) / total
}
