//! Badge read → decision → relay pulse → event.

use lokify::access::BadgeUid;
use lokify::app::events::AppEvent;

use crate::mock_hw::{GRANTED_UID, RelayCall, UNKNOWN_UID, online, started};

const EVENT_TOPIC: &str = "farmlab/door";

#[test]
fn granted_badge_pulses_relay_and_publishes() {
    let (mut rt, mut rig) = online();
    rig.reader.present(&GRANTED_UID);

    rig.tick(&mut rt, 1200);
    assert!(rig.relay.energized());
    assert_eq!(rig.reader.halts, 1);

    let events = rig.bus.published_on(EVENT_TOPIC);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["device_id"], "lock_01");
    assert_eq!(events[0]["type"], "event");
    assert_eq!(events[0]["event"], "access_granted");
    assert_eq!(events[0]["status"], "unlocked");
    assert_eq!(events[0]["uid"], "93:9B:D7:AA");
    assert_eq!(events[0]["timestamp"], 1200);
    assert_eq!(events[0]["source"], "local");

    assert!(rig.sink.events.contains(&AppEvent::AccessDecided {
        uid: BadgeUid::from_bytes(&GRANTED_UID),
        granted: true,
    }));
}

#[test]
fn pulse_ends_after_duration() {
    let (mut rt, mut rig) = online();
    rig.reader.present(&GRANTED_UID);
    rig.tick(&mut rt, 1200);

    rig.tick(&mut rt, 1299);
    assert!(rig.relay.energized());
    rig.tick(&mut rt, 1300);
    assert!(!rig.relay.energized());
    assert_eq!(rig.relay.calls.last(), Some(&RelayCall::DeEnergize));
}

#[test]
fn unknown_badge_is_denied_without_actuation() {
    let (mut rt, mut rig) = online();
    let before = rig.relay.calls.len();
    rig.reader.present(&UNKNOWN_UID);

    rig.tick(&mut rt, 1200);
    assert_eq!(rig.relay.calls.len(), before);

    let events = rig.bus.published_on(EVENT_TOPIC);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["event"], "access_denied");
    assert_eq!(events[0]["status"], "locked");
    assert_eq!(events[0]["uid"], "DE:AD:BE:EF");
}

#[test]
fn same_badge_inside_window_is_debounced_but_halted() {
    let (mut rt, mut rig) = online();
    rig.reader.present(&GRANTED_UID);
    rig.tick(&mut rt, 1200);
    rig.reader.present(&GRANTED_UID);
    rig.tick(&mut rt, 1400);

    assert_eq!(rig.bus.published_on(EVENT_TOPIC).len(), 1);
    assert_eq!(rig.relay.energize_count(), 1);
    assert_eq!(rig.reader.halts, 2);

    // Window measured from the last processed read.
    rig.reader.present(&GRANTED_UID);
    rig.tick(&mut rt, 2200);
    assert_eq!(rig.bus.published_on(EVENT_TOPIC).len(), 2);
}

#[test]
fn different_badge_is_not_debounced() {
    let (mut rt, mut rig) = online();
    rig.reader.present(&GRANTED_UID);
    rig.tick(&mut rt, 1200);
    rig.reader.present(&UNKNOWN_UID);
    rig.tick(&mut rt, 1400);
    rig.reader.present(&GRANTED_UID);
    rig.tick(&mut rt, 1600);

    let kinds: Vec<_> = rig
        .bus
        .published_on(EVENT_TOPIC)
        .iter()
        .map(|e| e["event"].as_str().unwrap_or_default().to_string())
        .collect();
    assert_eq!(kinds, ["access_granted", "access_denied", "access_granted"]);
}

#[test]
fn reader_polled_on_cadence_only() {
    let (mut rt, mut rig) = online();
    rig.reader.present(&GRANTED_UID);
    // Last poll ran at 1000; 1100 is inside the 200 ms cadence.
    rig.tick(&mut rt, 1100);
    assert_eq!(rig.reader.halts, 0);
    rig.tick(&mut rt, 1200);
    assert_eq!(rig.reader.halts, 1);
}

#[test]
fn offline_grant_still_actuates_and_publishes_nothing() {
    let (mut rt, mut rig) = started();
    rig.reader.present(&GRANTED_UID);

    rig.tick(&mut rt, 200);
    assert!(rig.relay.energized());
    assert!(rig.bus.published.is_empty());
    assert!(rig.sink.events.iter().any(|e| matches!(
        e,
        AppEvent::AccessDecided { granted: true, .. }
    )));
}

#[test]
fn boot_drives_relay_locked() {
    let (_rt, rig) = started();
    assert_eq!(rig.relay.calls, [RelayCall::DeEnergize]);
}
