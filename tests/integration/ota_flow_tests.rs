//! Manifest poll → version compare → streamed install → restart.

use std::cell::Cell;
use std::rc::Rc;

use lokify::FIRMWARE_VERSION;
use lokify::app::events::AppEvent;
use lokify::app::ports::{FirmwarePort, FlashError, Ports, RelayPort};
use lokify::app::service::Runtime;
use lokify::ota::OtaState;
use lokify::scheduler::Millis;

use crate::mock_hw::{
    FIRMWARE_BASE, GRANTED_UID, MANIFEST_URL, MockFirmware, MockResponse, Rig, online, started,
};

fn image(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

fn ota_states(events: &[AppEvent]) -> Vec<OtaState> {
    events
        .iter()
        .filter_map(|e| match e {
            AppEvent::OtaStateChanged(s) => Some(*s),
            _ => None,
        })
        .collect()
}

#[test]
fn starts_in_error_and_never_polls_offline() {
    let (mut rt, mut rig) = started();
    assert_eq!(rt.ota_state(), OtaState::Error);
    rig.run(&mut rt, 0, 30_000, 1000);
    assert!(rig.http.requests.is_empty());
    assert_eq!(rt.ota_state(), OtaState::Error);
}

#[test]
fn same_version_goes_idle() {
    let (mut rt, mut rig) = online();
    rig.http.manifest(FIRMWARE_VERSION, "lokify.bin");

    rig.tick(&mut rt, 9999);
    assert!(rig.http.requests.is_empty());
    rig.tick(&mut rt, 10_000);
    assert_eq!(rig.http.requests, [MANIFEST_URL]);
    assert_eq!(rt.ota_state(), OtaState::Idle);
    assert_eq!(
        ota_states(&rig.sink.events),
        [OtaState::Idle, OtaState::Checking, OtaState::Idle]
    );
    assert!(rig.firmware.begun.is_none());
}

#[test]
fn new_version_is_streamed_finalized_and_restarted() {
    let (mut rt, mut rig) = online();
    let body = image(5000);
    rig.http.manifest("9.9.9", "lokify-9.9.9.bin");
    let image_url = format!("{}lokify-9.9.9.bin", FIRMWARE_BASE);
    rig.http.route(&image_url, MockResponse::ok(&body));

    rig.tick(&mut rt, 10_000);
    assert_eq!(rig.http.requests, [MANIFEST_URL.to_string(), image_url]);
    assert_eq!(rig.firmware.begun, Some(5000));
    assert_eq!(rig.firmware.image, body);
    assert!(rig.firmware.finalized);
    assert_eq!(rig.firmware.restarts, 1);
    assert_eq!(rt.ota_state(), OtaState::Idle);

    let states = ota_states(&rig.sink.events);
    assert_eq!(
        &states[1..],
        [OtaState::Checking, OtaState::Updating, OtaState::Idle]
    );
    let last_progress = rig.sink.events.iter().rev().find_map(|e| match e {
        AppEvent::OtaProgress { written, total } => Some((*written, *total)),
        _ => None,
    });
    assert_eq!(last_progress, Some((5000, 5000)));
}

#[test]
fn older_published_version_is_installed_too() {
    let (mut rt, mut rig) = online();
    rig.http.manifest("0.0.1", "old.bin");
    rig.http
        .route(&format!("{}old.bin", FIRMWARE_BASE), MockResponse::ok(&image(10)));
    rig.tick(&mut rt, 10_000);
    assert_eq!(rig.firmware.restarts, 1);
}

#[test]
fn manifest_failures_end_in_error_and_retry_next_poll() {
    let (mut rt, mut rig) = online();
    rig.http.route(MANIFEST_URL, MockResponse::status(404));
    rig.tick(&mut rt, 10_000);
    assert_eq!(rt.ota_state(), OtaState::Error);

    rig.http.route(MANIFEST_URL, MockResponse::ok(br#"{"version":"9.9.9"}"#));
    rig.tick(&mut rt, 20_000);
    assert_eq!(rt.ota_state(), OtaState::Error);
    assert_eq!(rig.http.requests.len(), 2);

    rig.http.manifest(FIRMWARE_VERSION, "lokify.bin");
    rig.tick(&mut rt, 30_000);
    assert_eq!(rt.ota_state(), OtaState::Idle);
}

#[test]
fn image_without_length_is_an_error() {
    let (mut rt, mut rig) = online();
    rig.http.manifest("9.9.9", "a.bin");
    let mut resp = MockResponse::ok(&image(100));
    resp.content_length = None;
    rig.http.route(&format!("{}a.bin", FIRMWARE_BASE), resp);

    rig.tick(&mut rt, 10_000);
    assert_eq!(rt.ota_state(), OtaState::Error);
    assert!(rig.firmware.begun.is_none());
    assert_eq!(rig.firmware.restarts, 0);
}

#[test]
fn image_http_error_and_begin_failure_are_errors() {
    let (mut rt, mut rig) = online();
    rig.http.manifest("9.9.9", "a.bin");
    rig.http
        .route(&format!("{}a.bin", FIRMWARE_BASE), MockResponse::status(500));
    rig.tick(&mut rt, 10_000);
    assert_eq!(rt.ota_state(), OtaState::Error);

    rig.http
        .route(&format!("{}a.bin", FIRMWARE_BASE), MockResponse::ok(&image(100)));
    rig.firmware.fail_begin = true;
    rig.tick(&mut rt, 20_000);
    assert_eq!(rt.ota_state(), OtaState::Error);
    assert_eq!(rig.firmware.restarts, 0);
}

#[test]
fn short_body_is_logged_and_still_finalized() {
    let (mut rt, mut rig) = online();
    rig.http.manifest("9.9.9", "a.bin");
    let mut resp = MockResponse::ok(&image(3000));
    resp.content_length = Some(4000);
    rig.http.route(&format!("{}a.bin", FIRMWARE_BASE), resp);

    rig.tick(&mut rt, 10_000);
    assert_eq!(rig.firmware.image.len(), 3000);
    assert!(rig.firmware.finalized);
    assert_eq!(rig.firmware.restarts, 1);
}

#[test]
fn read_error_mid_stream_still_finalizes() {
    let (mut rt, mut rig) = online();
    rig.http.manifest("9.9.9", "a.bin");
    let mut resp = MockResponse::ok(&image(4096));
    resp.fail_after = Some(2048);
    rig.http.route(&format!("{}a.bin", FIRMWARE_BASE), resp);

    rig.tick(&mut rt, 10_000);
    assert_eq!(rig.firmware.image.len(), 2048);
    assert!(rig.firmware.finalized);
}

#[test]
fn write_error_stops_stream_and_finalize_failure_is_error() {
    let (mut rt, mut rig) = online();
    rig.http.manifest("9.9.9", "a.bin");
    rig.http
        .route(&format!("{}a.bin", FIRMWARE_BASE), MockResponse::ok(&image(4096)));
    rig.firmware.fail_write_at = Some(1024);
    rig.firmware.fail_finalize = true;

    rig.tick(&mut rt, 10_000);
    assert_eq!(rig.firmware.image.len(), 1024);
    assert!(rig.firmware.aborted);
    assert_eq!(rig.firmware.restarts, 0);
    assert_eq!(rt.ota_state(), OtaState::Error);
}

// ── Strike interlock ──────────────────────────────────────────

/// Relay level shared with the firmware double.
struct SharedRelay(Rc<Cell<bool>>);

impl RelayPort for SharedRelay {
    fn energize(&mut self) {
        self.0.set(true);
    }

    fn de_energize(&mut self) {
        self.0.set(false);
    }
}

/// Counts image writes that land while the strike is energized.
struct InterlockFirmware {
    inner: MockFirmware,
    relay: Rc<Cell<bool>>,
    writes: usize,
    writes_while_open: usize,
}

impl FirmwarePort for InterlockFirmware {
    fn begin(&mut self, size: usize) -> Result<(), FlashError> {
        self.inner.begin(size)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, FlashError> {
        self.writes += 1;
        if self.relay.get() {
            self.writes_while_open += 1;
        }
        self.inner.write(data)
    }

    fn finalize(&mut self) -> Result<(), FlashError> {
        self.inner.finalize()
    }

    fn abort(&mut self) {
        self.inner.abort();
    }

    fn restart(&mut self) {
        self.inner.restart();
    }
}

fn interlock_rig() -> (Runtime, Rig, SharedRelay, InterlockFirmware) {
    let (rt, mut rig) = online();
    rig.http.manifest("9.9.9", "a.bin");
    rig.http
        .route(&format!("{}a.bin", FIRMWARE_BASE), MockResponse::ok(&image(64 * 1024)));
    let level = Rc::new(Cell::new(false));
    let relay = SharedRelay(level.clone());
    let firmware = InterlockFirmware {
        inner: MockFirmware::default(),
        relay: level,
        writes: 0,
        writes_while_open: 0,
    };
    (rt, rig, relay, firmware)
}

fn pass(
    rt: &mut Runtime,
    rig: &mut Rig,
    relay: &mut SharedRelay,
    firmware: &mut InterlockFirmware,
    now: Millis,
) {
    let mut ports = Ports {
        link: &mut rig.link,
        bus: &mut rig.bus,
        http: &mut rig.http,
        firmware,
        reader: &mut rig.reader,
        relay,
        sink: &mut rig.sink,
    };
    rt.tick(now, &mut ports);
}

#[test]
fn check_waits_for_strike_to_release_after_grant() {
    let (mut rt, mut rig, mut relay, mut firmware) = interlock_rig();
    rig.reader.present(&GRANTED_UID);

    pass(&mut rt, &mut rig, &mut relay, &mut firmware, 10_000);
    assert!(relay.0.get(), "grant energized the strike");
    assert!(rig.http.requests.is_empty(), "check deferred");

    pass(&mut rt, &mut rig, &mut relay, &mut firmware, 10_100);
    assert!(!relay.0.get());
    assert_eq!(firmware.writes, 64);
    assert_eq!(firmware.writes_while_open, 0);
    assert_eq!(firmware.inner.restarts, 1);
}

#[test]
fn check_waits_for_strike_to_release_after_remote_unlock() {
    let (mut rt, mut rig, mut relay, mut firmware) = interlock_rig();
    rig.bus.queue(
        "farmlab/door",
        br#"{"type":"command","command":"unlock","device_id":"lock_01"}"#,
    );

    pass(&mut rt, &mut rig, &mut relay, &mut firmware, 10_000);
    assert!(relay.0.get());
    assert!(firmware.inner.begun.is_none());

    pass(&mut rt, &mut rig, &mut relay, &mut firmware, 10_100);
    assert_eq!(firmware.writes_while_open, 0);
    assert_eq!(firmware.inner.image.len(), 64 * 1024);
}
