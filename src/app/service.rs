//! Door runtime: the hexagonal core.
//!
//! [`Runtime`] owns every component and runs them in a fixed order once per
//! scheduler pass.  All I/O flows through the [`Ports`] bundle handed to
//! [`Runtime::tick`], so the whole controller can be driven from host tests
//! with recording doubles.
//!
//! ```text
//!  BadgeReader ──▶ ┌──────────────────────────────┐ ──▶ Relay
//!  Link / Bus  ◀──▶│           Runtime            │ ──▶ EventSink
//!  Http/Firmware ◀─│ Access · Actuation · Links   │
//!                  │ Remote · OTA · Telemetry     │
//!                  └──────────────────────────────┘
//! ```
//!
//! Pass order: reader poll → heartbeat → relay deadline → link →
//! session + inbound commands → OTA → presentation refresh.

use log::{debug, info};

use crate::FIRMWARE_VERSION;
use crate::access::{AccessController, AccessDecision, StaticAllowList};
use crate::actuation::ActuationTimer;
use crate::config::DeviceConfig;
use crate::error;
use crate::messages::{DoorEvent, DoorEventKind};
use crate::net::{BusPublisher, ConnectivityManager, InboundBatch, LinkEvent};
use crate::ota::{OtaIo, OtaState, OtaUpdater};
use crate::remote::RemoteCommandHandler;
use crate::scheduler::Millis;
use crate::telemetry::TelemetryPublisher;

use super::commands::RemoteCommand;
use super::events::{AppEvent, StatusSnapshot};
use super::ports::{AllowListProvider, EventSink, Ports};

// ───────────────────────────────────────────────────────────────
// Runtime
// ───────────────────────────────────────────────────────────────

pub struct Runtime<A: AllowListProvider = StaticAllowList> {
    device_id: String,
    access: AccessController<A>,
    actuation: ActuationTimer,
    connectivity: ConnectivityManager,
    remote: RemoteCommandHandler,
    ota: OtaUpdater,
    telemetry: TelemetryPublisher,
    publisher: BusPublisher,
    last_status: Option<StatusSnapshot>,
}

impl Runtime<StaticAllowList> {
    /// Validate `config` and build the runtime with its static allow-list.
    pub fn from_config(config: &DeviceConfig) -> error::Result<Self> {
        config.validate()?;
        let allow = StaticAllowList::from_strs(&config.allowed_uids)?;
        info!(
            "Runtime: {} badge(s) on the allow-list for {}",
            allow.len(),
            config.device_id
        );
        Ok(Self::new(config, allow))
    }
}

impl<A: AllowListProvider> Runtime<A> {
    /// Construct with an injected allow-list.  Does not touch any port;
    /// call [`start`](Self::start) before the first pass.
    pub fn new(config: &DeviceConfig, allow: A) -> Self {
        let timing = &config.timing;
        Self {
            device_id: config.device_id.clone(),
            access: AccessController::new(allow, timing),
            actuation: ActuationTimer::new(timing.pulse_duration_ms),
            connectivity: ConnectivityManager::new(config),
            remote: RemoteCommandHandler::new(&config.device_id),
            ota: OtaUpdater::new(&config.ota, timing.ota_poll_interval_ms, FIRMWARE_VERSION),
            telemetry: TelemetryPublisher::new(timing.heartbeat_interval_ms),
            publisher: BusPublisher::new(&config.topics.event, &config.topics.heartbeat),
            last_status: None,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Drive the relay to its locked rest level and announce startup.
    pub fn start(&mut self, ports: &mut Ports<'_>) {
        self.actuation.init(ports.relay);
        ports.sink.emit(&AppEvent::Started(FIRMWARE_VERSION));
        info!("Runtime: {} started, firmware {}", self.device_id, FIRMWARE_VERSION);
    }

    // ── Scheduler pass ────────────────────────────────────────

    /// Run one cooperative scheduler pass at `now` (ms since boot).
    pub fn tick(&mut self, now: Millis, ports: &mut Ports<'_>) {
        // 1. Badge reader
        if let Some(decision) = self.access.tick(now, ports.reader) {
            self.apply_access(now, decision, ports);
        }

        // 2. Heartbeat
        let status = self.status();
        self.telemetry.tick(
            now,
            &self.device_id,
            FIRMWARE_VERSION,
            &status,
            &self.publisher,
            ports.bus,
        );

        // 3. Relay deadline
        self.actuation.tick(now, ports.relay);

        // 4. Link supervision
        if let Some(event) = self.connectivity.tick_link(now, ports.link) {
            ports.sink.emit(&AppEvent::Link(event));
            if event == LinkEvent::Connected {
                self.ota.on_link_up(ports.sink);
            }
        }
        if !self.connectivity.is_link_up() {
            self.ota.force_error(ports.sink);
        }

        // 5. Session + inbound commands
        let mut inbound = InboundBatch::new();
        if let Some(event) = self.connectivity.tick_session(now, ports.bus, &mut inbound) {
            ports.sink.emit(&AppEvent::Session(event));
        }
        for msg in &inbound {
            self.on_message(now, msg.topic.as_str(), &msg.payload, ports);
        }

        // 6. OTA poll (blocks for the duration of a transfer).  Never started
        //    while the strike is energized.
        let ready = self.connectivity.is_link_up() && !self.actuation.is_energized();
        let mut io = OtaIo {
            http: &mut *ports.http,
            firmware: &mut *ports.firmware,
            sink: &mut *ports.sink,
        };
        self.ota.tick(now, ready, &mut io);

        // 7. Presentation refresh
        let status = self.status();
        if self.last_status != Some(status) {
            self.last_status = Some(status);
            ports.sink.emit(&AppEvent::Status(status));
        }
    }

    /// Handle one inbound bus message.
    pub fn on_message(&mut self, now: Millis, topic: &str, payload: &[u8], ports: &mut Ports<'_>) {
        let Some(cmd) = self.remote.handle(topic, payload) else {
            return;
        };
        let kind = match cmd {
            RemoteCommand::Unlock => {
                self.actuation.pulse(now, ports.relay);
                DoorEventKind::RemoteUnlock
            }
            RemoteCommand::Lock => {
                self.actuation.hold_lock(ports.relay);
                DoorEventKind::RemoteLock
            }
        };
        info!("Remote: {:?} applied", cmd);
        let event = DoorEvent::new(&self.device_id, kind, "", now);
        let session_up = self.connectivity.session_connected();
        self.publisher.publish_event(ports.bus, session_up, &event);
        ports.sink.emit(&AppEvent::Remote(cmd));
    }

    fn apply_access(&mut self, now: Millis, decision: AccessDecision, ports: &mut Ports<'_>) {
        let kind = if decision.is_granted() {
            self.actuation.pulse(now, ports.relay);
            DoorEventKind::AccessGranted
        } else {
            DoorEventKind::AccessDenied
        };
        let event = DoorEvent::new(&self.device_id, kind, decision.uid().as_str(), now);
        let session_up = self.connectivity.session_connected();
        if !self.publisher.publish_event(ports.bus, session_up, &event) {
            debug!("Access: {} event not published", decision.uid());
        }
        let granted = decision.is_granted();
        ports.sink.emit(&AppEvent::AccessDecided {
            uid: decision.uid().clone(),
            granted,
        });
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn status(&self) -> StatusSnapshot {
        StatusSnapshot {
            link: self.connectivity.phase(),
            session: self.connectivity.session_connected(),
            ota: self.ota.state(),
            unlocked: self.actuation.is_energized(),
            link_attempts: self.connectivity.attempts(),
        }
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub fn ota_state(&self) -> OtaState {
        self.ota.state()
    }

    pub fn connectivity(&self) -> &ConnectivityManager {
        &self.connectivity
    }

    pub fn actuation(&self) -> &ActuationTimer {
        &self.actuation
    }
}
