//! Heartbeat cadence and content.

use lokify::FIRMWARE_VERSION;

use crate::mock_hw::{GRANTED_UID, online, started};

const HEARTBEAT_TOPIC: &str = "farmlab/esp32/heartbeat";

#[test]
fn heartbeat_every_five_seconds_with_status() {
    let (mut rt, mut rig) = online();
    rig.run(&mut rt, 1100, 15_100, 100);

    let beats = rig.bus.published_on(HEARTBEAT_TOPIC);
    let times: Vec<u64> = beats.iter().filter_map(|b| b["timestamp"].as_u64()).collect();
    assert_eq!(times, [5000, 10_000, 15_000]);

    let hb = &beats[0];
    assert_eq!(hb["device_id"], "lock_01");
    assert_eq!(hb["type"], "heartbeat");
    assert_eq!(hb["wifi"], true);
    assert_eq!(hb["mqtt"], true);
    assert_eq!(hb["ota"], "idle");
    assert_eq!(hb["fw_version"], FIRMWARE_VERSION);
    assert_eq!(hb["source"], "local");
}

#[test]
fn no_heartbeat_without_session() {
    let (mut rt, mut rig) = started();
    rig.run(&mut rt, 0, 20_000, 100);
    assert!(rig.bus.published.is_empty());
}

#[test]
fn missed_heartbeats_are_not_replayed() {
    let (mut rt, mut rig) = online();
    rig.bus.connected = false;
    rig.bus.accept = false;
    rig.run(&mut rt, 1100, 12_000, 100);
    assert!(rig.bus.published_on(HEARTBEAT_TOPIC).is_empty());

    rig.bus.accept = true;
    rig.run(&mut rt, 12_000, 15_100, 100);
    let beats = rig.bus.published_on(HEARTBEAT_TOPIC);
    assert_eq!(beats.len(), 1);
    assert_eq!(beats[0]["timestamp"], 15_000);
}

#[test]
fn link_loss_silences_heartbeats_and_events() {
    let (mut rt, mut rig) = online();
    rig.link.up = false;
    rig.tick(&mut rt, 2000);
    assert!(!rt.connectivity().session_connected());
    // The broker client has not noticed yet.
    assert!(rig.bus.connected);

    rig.reader.present(&GRANTED_UID);
    rig.run(&mut rt, 2100, 5100, 100);
    assert_eq!(rig.relay.energize_count(), 1, "offline grant still opens");
    assert!(rig.bus.published.is_empty());
}
