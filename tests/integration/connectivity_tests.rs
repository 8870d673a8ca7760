//! Link backoff, exhaustion, session handling and OTA coupling.

use lokify::app::events::AppEvent;
use lokify::net::{LinkEvent, LinkPhase, LinkState, SessionEvent};
use lokify::ota::OtaState;

use crate::mock_hw::{online, started};

#[test]
fn connect_attempts_follow_linear_capped_backoff() {
    let (mut rt, mut rig) = started();
    let mut attempt_times = Vec::new();
    let mut now = 0;
    while now < 130_000 {
        let before = rig.link.connects;
        rig.tick(&mut rt, now);
        if rig.link.connects > before {
            attempt_times.push(now);
        }
        now += 100;
    }

    let gaps: Vec<u64> = attempt_times.windows(2).map(|w| w[1] - w[0]).collect();
    assert_eq!(attempt_times[0], 1000);
    assert_eq!(
        gaps,
        [3000, 5000, 7000, 9000, 11_000, 13_000, 15_000, 17_000, 19_000]
    );
    assert_eq!(rig.link.connects, 10);
    assert!(rt.connectivity().is_exhausted());
    assert_eq!(rt.status().link, LinkPhase::Exhausted);
    assert!(rig
        .sink
        .events
        .contains(&AppEvent::Link(LinkEvent::Exhausted)));
}

#[test]
fn exhausted_link_still_recovers_on_its_own() {
    let (mut rt, mut rig) = started();
    rig.run(&mut rt, 0, 130_000, 500);
    assert!(rt.connectivity().is_exhausted());

    rig.link.up = true;
    rig.run(&mut rt, 130_000, 160_000, 500);
    assert_eq!(rt.connectivity().link_state(), LinkState::Connected);
    assert_eq!(rt.connectivity().attempts(), 0);
    assert_eq!(rig.link.connects, 10, "no attempts issued while exhausted");
}

#[test]
fn success_resets_attempts_and_interval() {
    let (mut rt, mut rig) = started();
    rig.run(&mut rt, 0, 10_000, 100);
    assert_eq!(rt.connectivity().attempts(), 3);

    rig.link.up = true;
    rig.run(&mut rt, 10_000, 20_000, 100);
    assert_eq!(rt.connectivity().attempts(), 0);
    assert_eq!(rt.connectivity().current_interval_ms(), 1000);
}

#[test]
fn session_uses_device_identity_and_subscribes() {
    let (_rt, rig) = online();
    assert_eq!(rig.bus.client_ids, ["lock_01"]);
    assert_eq!(rig.bus.subscribed, ["farmlab/door"]);
}

#[test]
fn no_session_attempts_while_link_down() {
    let (mut rt, mut rig) = started();
    rig.bus.accept = true;
    rig.run(&mut rt, 0, 5000, 100);
    assert_eq!(rig.bus.connects, 0);
    assert!(!rt.connectivity().session_connected());
}

#[test]
fn refused_session_retries_on_its_own_cadence() {
    let (mut rt, mut rig) = started();
    rig.link.up = true;
    rig.run(&mut rt, 0, 3000, 100);
    // Session attempts at 1000, 1600, 2200, 2800 (strictly more than 500 ms apart).
    assert_eq!(rig.bus.connects, 4);
    assert!(rig
        .sink
        .events
        .contains(&AppEvent::Session(SessionEvent::Failed)));
}

#[test]
fn broker_drop_is_reported_and_reconnected() {
    let (mut rt, mut rig) = online();
    rig.bus.connected = false;
    rig.tick(&mut rt, 1100);
    assert!(rig.sink.events.contains(&AppEvent::Session(SessionEvent::Lost)));
    rig.tick(&mut rt, 1700);
    assert!(rt.connectivity().session_connected());
    assert_eq!(rig.bus.subscribed.len(), 2);
}

#[test]
fn link_loss_forces_ota_error_and_recovery_clears_it() {
    let (mut rt, mut rig) = online();
    assert_eq!(rt.ota_state(), OtaState::Idle);

    rig.link.up = false;
    rig.tick(&mut rt, 2000);
    assert!(rig.sink.events.contains(&AppEvent::Link(LinkEvent::Lost)));
    assert_eq!(rt.ota_state(), OtaState::Error);
    assert!(!rt.connectivity().session_connected());

    rig.link.up = true;
    rig.run(&mut rt, 2100, 6000, 100);
    assert_eq!(rt.connectivity().link_state(), LinkState::Connected);
    assert_eq!(rt.ota_state(), OtaState::Idle);
}
