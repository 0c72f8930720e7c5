//! Poll loop driven end to end on a `TestClock`.

use std::sync::atomic::AtomicBool;
use std::time::Duration;

use blinds_core::error::{AbortReason, CoverError};
use blinds_core::mocks::{NoopPublisher, RecordingActuator, RecordingPublisher};
use blinds_core::runner::{RunParams, run_until_idle};
use blinds_core::{ControlCfg, Cover, TiltCfg, TravelCfg};
use blinds_hardware::SimulatedSwitches;
use blinds_traits::clock::test_clock::TestClock;
use blinds_traits::{SwitchEvent, SwitchId, SwitchState};
use crossbeam_channel as xch;

fn params() -> RunParams {
    RunParams::from_cfg(
        &TravelCfg::from_secs(20.0, 15.0),
        &TiltCfg::default(),
        &ControlCfg::default(),
    )
}

fn abort_reason(err: &eyre::Report) -> AbortReason {
    match err.downcast_ref::<CoverError>() {
        Some(CoverError::Abort(r)) => *r,
        other => panic!("expected abort, got {other:?}"),
    }
}

#[test]
fn runs_to_target_and_ignores_echoes() {
    let clock = TestClock::new();
    let (tx, rx) = xch::unbounded();
    let switches = SimulatedSwitches::new().with_echo(move |ev| {
        let _ = tx.send(ev);
    });
    let publ = RecordingPublisher::new();
    let mut cover = Cover::builder()
        .with_actuator(switches)
        .with_publisher(publ.clone())
        .with_travel(TravelCfg::from_secs(20.0, 15.0))
        .with_clock(Box::new(clock.clone()))
        .build()
        .unwrap();

    cover.set_position(60).unwrap();
    let shutdown = AtomicBool::new(false);
    let summary = run_until_idle(&mut cover, &rx, &shutdown, &params()).unwrap();

    assert_eq!(summary.final_state.position, 60);
    assert!(!summary.final_state.is_opening);
    assert!(summary.final_state.available);
    // the host echoes our "up on"; it must not restart the segment
    assert_eq!(summary.events_ignored, 1);
    assert_eq!(summary.events_applied, 0);
    assert!(summary.elapsed <= Duration::from_secs(12));
    assert!(summary.ticks >= 100);
    assert!(!cover.is_polling());
    // echo of the final stop is still queued and is a duplicate too
    let rest: Vec<SwitchEvent> = rx.try_iter().collect();
    assert_eq!(rest, vec![SwitchEvent::new(SwitchId::Up, SwitchState::Off)]);
    // published once per tick plus transitions
    assert!(publ.states().len() as u64 > summary.ticks);
}

#[test]
fn idle_controller_returns_immediately() {
    let clock = TestClock::new();
    let (_tx, rx) = xch::unbounded::<SwitchEvent>();
    let mut cover = Cover::builder()
        .with_actuator(RecordingActuator::new())
        .with_publisher(NoopPublisher)
        .with_travel(TravelCfg::from_secs(20.0, 15.0))
        .with_clock(Box::new(clock.clone()))
        .build()
        .unwrap();
    let summary = run_until_idle(&mut cover, &rx, &AtomicBool::new(false), &params()).unwrap();
    assert_eq!(summary.ticks, 0);
    assert_eq!(clock.elapsed(), Duration::ZERO);
}

#[test]
fn shutdown_flag_forces_stop() {
    let clock = TestClock::new();
    let act = RecordingActuator::new();
    let (_tx, rx) = xch::unbounded::<SwitchEvent>();
    let mut cover = Cover::builder()
        .with_actuator(act.clone())
        .with_publisher(NoopPublisher)
        .with_travel(TravelCfg::from_secs(20.0, 15.0))
        .with_clock(Box::new(clock.clone()))
        .build()
        .unwrap();
    cover.open().unwrap();
    let err = run_until_idle(&mut cover, &rx, &AtomicBool::new(true), &params()).unwrap_err();
    assert_eq!(abort_reason(&err), AbortReason::Shutdown);
    assert!(!cover.is_moving());
    assert_eq!(act.stop_count(), 1);
}

#[test]
fn watchdog_aborts_long_runs() {
    let clock = TestClock::new();
    let act = RecordingActuator::new();
    let (_tx, rx) = xch::unbounded::<SwitchEvent>();
    let mut cover = Cover::builder()
        .with_actuator(act.clone())
        .with_publisher(NoopPublisher)
        .with_travel(TravelCfg::from_secs(20.0, 15.0))
        .with_clock(Box::new(clock.clone()))
        .build()
        .unwrap();
    cover.open().unwrap();
    let short = RunParams {
        max_run: Duration::from_secs(5),
    };
    let err = run_until_idle(&mut cover, &rx, &AtomicBool::new(false), &short).unwrap_err();
    assert_eq!(abort_reason(&err), AbortReason::MaxRuntime);
    assert_eq!(cover.state().position, 25);
    assert!(!cover.is_moving());
    assert_eq!(act.stop_count(), 1);
}

#[test]
fn queued_external_off_wins_over_tick() {
    let clock = TestClock::new();
    let act = RecordingActuator::new();
    let (tx, rx) = xch::unbounded::<SwitchEvent>();
    let mut cover = Cover::builder()
        .with_actuator(act.clone())
        .with_publisher(NoopPublisher)
        .with_travel(TravelCfg::from_secs(20.0, 15.0))
        .with_clock(Box::new(clock.clone()))
        .build()
        .unwrap();
    cover.open().unwrap();
    clock.advance_secs(3.0);
    tx.send(SwitchEvent::new(SwitchId::Up, SwitchState::Off))
        .unwrap();
    let summary = run_until_idle(&mut cover, &rx, &AtomicBool::new(false), &params()).unwrap();
    assert_eq!(summary.ticks, 0);
    assert_eq!(summary.events_applied, 1);
    assert_eq!(summary.final_state.position, 15);
    assert_eq!(act.stop_count(), 1);
}

#[test]
fn unavailable_switch_aborts_run() {
    let clock = TestClock::new();
    let (tx, rx) = xch::unbounded::<SwitchEvent>();
    let publ = RecordingPublisher::new();
    let mut cover = Cover::builder()
        .with_actuator(RecordingActuator::new())
        .with_publisher(publ.clone())
        .with_travel(TravelCfg::from_secs(20.0, 15.0))
        .with_clock(Box::new(clock.clone()))
        .build()
        .unwrap();
    cover.open().unwrap();
    tx.send(SwitchEvent::new(SwitchId::Down, SwitchState::Unavailable))
        .unwrap();
    let err = run_until_idle(&mut cover, &rx, &AtomicBool::new(false), &params()).unwrap_err();
    assert_eq!(abort_reason(&err), AbortReason::Unavailable);
    assert!(!publ.last().unwrap().available);
}
