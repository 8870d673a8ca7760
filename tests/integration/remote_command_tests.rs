//! Bus command → relay action → remote event.

use lokify::app::commands::RemoteCommand;
use lokify::app::events::AppEvent;

use crate::mock_hw::{RelayCall, online};

const TOPIC: &str = "farmlab/door";

fn command(cmd: &str, device: &str) -> Vec<u8> {
    format!(r#"{{"type":"command","command":"{}","device_id":"{}"}}"#, cmd, device).into_bytes()
}

#[test]
fn unlock_command_pulses_and_reports() {
    let (mut rt, mut rig) = online();
    rig.bus.queue(TOPIC, &command("unlock", "lock_01"));

    rig.tick(&mut rt, 1100);
    assert!(rig.relay.energized());

    let events = rig.bus.published_on(TOPIC);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["event"], "remote_unlock");
    assert_eq!(events[0]["status"], "unlocked");
    assert_eq!(events[0]["uid"], "");
    assert!(rig.sink.events.contains(&AppEvent::Remote(RemoteCommand::Unlock)));

    rig.tick(&mut rt, 1200);
    assert!(!rig.relay.energized());
}

#[test]
fn lock_command_cancels_pulse() {
    let (mut rt, mut rig) = online();
    rig.bus.queue(TOPIC, &command("unlock", "lock_01"));
    rig.tick(&mut rt, 1100);
    rig.bus.queue(TOPIC, &command("lock", "lock_01"));
    rig.tick(&mut rt, 1150);

    assert_eq!(rig.relay.calls.last(), Some(&RelayCall::DeEnergize));
    assert!(!rt.actuation().is_energized());
    let events = rig.bus.published_on(TOPIC);
    assert_eq!(events[1]["event"], "remote_lock");
    assert_eq!(events[1]["status"], "locked");
}

#[test]
fn commands_for_other_devices_are_ignored() {
    let (mut rt, mut rig) = online();
    let before = rig.relay.calls.len();
    rig.bus.queue(TOPIC, &command("unlock", "lock_02"));
    rig.bus.queue(TOPIC, &command("open", "lock_01"));
    rig.bus.queue(TOPIC, b"{garbage");
    rig.tick(&mut rt, 1100);

    assert_eq!(rig.relay.calls.len(), before);
    assert!(rig.bus.published.is_empty());
}

#[test]
fn own_echoed_event_is_ignored() {
    let (mut rt, mut rig) = online();
    rig.bus.queue(TOPIC, &command("unlock", "lock_01"));
    rig.tick(&mut rt, 1100);
    let echoed = rig.bus.published[0].1.clone();

    rig.bus.queue(TOPIC, &echoed);
    rig.tick(&mut rt, 1300);
    assert_eq!(rig.relay.energize_count(), 1);
    assert_eq!(rig.bus.published.len(), 1);
}

#[test]
fn direct_dispatch_matches_pumped_dispatch() {
    let (mut rt, mut rig) = online();
    rt.on_message(1050, TOPIC, &command("unlock", "lock_01"), &mut rig.ports());
    assert!(rig.relay.energized());
    assert_eq!(rig.bus.published_on(TOPIC)[0]["timestamp"], 1050);
}
