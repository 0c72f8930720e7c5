use std::sync::Arc;
use std::time::Duration;

use blinds_core::{Direction, MotionState, PositionEstimator, TravelRange};
use blinds_traits::clock::test_clock::TestClock;
use rstest::rstest;

fn estimator(up_s: u64, down_s: u64) -> (PositionEstimator, TestClock) {
    let clock = TestClock::new();
    let range = TravelRange::new(Duration::from_secs(up_s), Duration::from_secs(down_s))
        .expect("valid range");
    (PositionEstimator::new(range, Arc::new(clock.clone())), clock)
}

#[test]
fn full_traversal_timing() {
    let (mut e, clock) = estimator(10, 10);
    e.start_travel_up();
    assert_eq!(e.travel_direction(), Some(Direction::Up));

    clock.advance_secs(5.0);
    assert_eq!(e.current_position(), 50);
    assert!(!e.position_reached());

    clock.advance_secs(5.0);
    assert_eq!(e.current_position(), 100);
    assert!(e.position_reached());

    clock.advance_secs(1.0);
    assert_eq!(e.current_position(), 100);
    assert!(e.position_reached());
    assert!(e.is_open());
}

#[test]
fn stop_freezes_the_estimate() {
    let (mut e, clock) = estimator(10, 10);
    e.start_travel_up();
    clock.advance_secs(3.0);
    e.stop();
    assert_eq!(e.current_position(), 30);
    assert_eq!(e.known_position(), 30);
    assert_eq!(e.motion(), MotionState::Stopped);
    assert_eq!(e.target(), None);

    clock.advance_secs(5.0);
    assert_eq!(e.current_position(), 30);
}

#[test]
fn start_travel_up_is_idempotent() {
    let (mut e, clock) = estimator(10, 10);
    e.start_travel_up();
    clock.advance_secs(2.0);
    e.start_travel_up();
    clock.advance_secs(2.0);
    // clock was not restarted by the second call
    assert_eq!(e.current_position(), 40);
}

#[rstest]
#[case(0)]
#[case(37)]
#[case(100)]
fn set_position_while_stopped(#[case] p: u8) {
    let (mut e, _clock) = estimator(10, 10);
    e.set_position(p);
    assert_eq!(e.current_position(), p);
    assert!(e.position_reached());
}

#[test]
fn set_position_while_moving_discards_segment() {
    let (mut e, clock) = estimator(10, 10);
    e.start_travel_up();
    clock.advance_secs(4.0);
    e.set_position(75);
    assert!(!e.is_traveling());
    clock.advance_secs(4.0);
    assert_eq!(e.current_position(), 75);
}

#[rstest]
#[case(0, 60, Some(Direction::Up))]
#[case(80, 20, Some(Direction::Down))]
#[case(45, 45, None)]
fn start_travel_picks_direction(
    #[case] from: u8,
    #[case] to: u8,
    #[case] expected: Option<Direction>,
) {
    let (mut e, _clock) = estimator(20, 15);
    e.set_position(from);
    assert_eq!(e.start_travel(to), expected);
    assert_eq!(e.travel_direction(), expected);
}

#[test]
fn downward_travel_uses_down_time() {
    let (mut e, clock) = estimator(20, 15);
    e.set_position(60);
    e.start_travel(0);
    clock.advance_secs(3.0);
    assert_eq!(e.current_position(), 40);
    clock.advance_secs(6.0);
    assert_eq!(e.current_position(), 0);
    assert!(e.is_closed());
    assert!(e.position_reached());
}

#[test]
fn estimate_is_not_written_back() {
    let (mut e, clock) = estimator(10, 10);
    e.set_position(20);
    e.start_travel_up();
    clock.advance_secs(3.0);
    assert_eq!(e.current_position(), 50);
    assert_eq!(e.known_position(), 20);
}
