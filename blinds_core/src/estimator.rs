//! Time-based position estimate for one axis of a cover.
//!
//! The hardware has no position feedback. A travel segment is anchored at
//! `(travel_start, start_position)` and the estimate is derived from the
//! time elapsed since then at a constant speed of `100 / full_time` percent
//! per second. Up and down may have different full-travel times.
//!
//! `known_position` is only written by `stop()` and `set_position()`;
//! `current_position()` never writes back.

use std::sync::Arc;
use std::time::{Duration, Instant};

use blinds_traits::SwitchId;
use blinds_traits::clock::Clock;

use crate::error::BuildError;

/// Fully open.
pub const OPEN: u8 = 100;
/// Fully closed.
pub const CLOSED: u8 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    /// The output that drives this direction.
    pub fn switch(self) -> SwitchId {
        match self {
            Direction::Up => SwitchId::Up,
            Direction::Down => SwitchId::Down,
        }
    }

    pub fn from_switch(switch: SwitchId) -> Self {
        match switch {
            SwitchId::Up => Direction::Up,
            SwitchId::Down => Direction::Down,
        }
    }

    /// End of travel in this direction.
    pub fn extreme(self) -> u8 {
        match self {
            Direction::Up => OPEN,
            Direction::Down => CLOSED,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
        }
    }
}

impl core::fmt::Display for Direction {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MotionState {
    #[default]
    Stopped,
    MovingUp,
    MovingDown,
}

impl MotionState {
    pub fn direction(self) -> Option<Direction> {
        match self {
            MotionState::Stopped => None,
            MotionState::MovingUp => Some(Direction::Up),
            MotionState::MovingDown => Some(Direction::Down),
        }
    }

    fn moving(dir: Direction) -> Self {
        match dir {
            Direction::Up => MotionState::MovingUp,
            Direction::Down => MotionState::MovingDown,
        }
    }
}

/// Full-range travel times of one axis. Both are strictly positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TravelRange {
    full_up: Duration,
    full_down: Duration,
}

impl TravelRange {
    pub fn new(full_up: Duration, full_down: Duration) -> Result<Self, BuildError> {
        if full_up.is_zero() || full_down.is_zero() {
            return Err(BuildError::InvalidConfig("travel times must be > 0"));
        }
        Ok(Self { full_up, full_down })
    }

    /// Fractional seconds; non-finite or non-positive input is rejected.
    pub fn from_secs(up_s: f32, down_s: f32) -> Result<Self, BuildError> {
        let up = crate::util::duration_from_secs_f32(up_s);
        let down = crate::util::duration_from_secs_f32(down_s);
        Self::new(up, down)
    }

    pub fn full_time(&self, dir: Direction) -> Duration {
        match dir {
            Direction::Up => self.full_up,
            Direction::Down => self.full_down,
        }
    }

    /// The longer of the two directions.
    pub fn longest(&self) -> Duration {
        self.full_up.max(self.full_down)
    }
}

/// Position estimator for a single axis (lift or tilt).
pub struct PositionEstimator {
    range: TravelRange,
    clock: Arc<dyn Clock + Send + Sync>,
    known_position: u8,
    motion: MotionState,
    travel_start: Option<Instant>,
    start_position: u8,
    target: Option<u8>,
}

impl core::fmt::Debug for PositionEstimator {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PositionEstimator")
            .field("range", &self.range)
            .field("known_position", &self.known_position)
            .field("motion", &self.motion)
            .field("start_position", &self.start_position)
            .field("target", &self.target)
            .finish()
    }
}

impl PositionEstimator {
    pub fn new(range: TravelRange, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        Self {
            range,
            clock,
            known_position: CLOSED,
            motion: MotionState::Stopped,
            travel_start: None,
            start_position: CLOSED,
            target: None,
        }
    }

    pub fn with_position(mut self, position: u8) -> Self {
        self.known_position = position.min(OPEN);
        self
    }

    pub fn range(&self) -> TravelRange {
        self.range
    }

    pub fn known_position(&self) -> u8 {
        self.known_position
    }

    pub fn target(&self) -> Option<u8> {
        self.target
    }

    pub fn motion(&self) -> MotionState {
        self.motion
    }

    pub fn is_traveling(&self) -> bool {
        self.motion != MotionState::Stopped
    }

    pub fn travel_direction(&self) -> Option<Direction> {
        self.motion.direction()
    }

    pub fn is_closed(&self) -> bool {
        self.current_position() == CLOSED
    }

    pub fn is_open(&self) -> bool {
        self.current_position() == OPEN
    }

    pub fn start_travel_up(&mut self) {
        self.start_travel_towards(Direction::Up, OPEN);
    }

    pub fn start_travel_down(&mut self) {
        self.start_travel_towards(Direction::Down, CLOSED);
    }

    /// Travel to `target`; the direction follows from the current estimate.
    /// Returns the direction, or `None` when already there.
    pub fn start_travel(&mut self, target: u8) -> Option<Direction> {
        let target = target.min(OPEN);
        let current = self.current_position();
        let dir = match target.cmp(&current) {
            core::cmp::Ordering::Equal => return None,
            core::cmp::Ordering::Greater => Direction::Up,
            core::cmp::Ordering::Less => Direction::Down,
        };
        self.start_travel_towards(dir, target);
        Some(dir)
    }

    fn start_travel_towards(&mut self, dir: Direction, target: u8) {
        if self.travel_direction() != Some(dir) {
            // re-anchor on the live estimate; a reversal starts a new segment
            self.start_position = self.current_position();
            self.travel_start = Some(self.clock.now());
            self.motion = MotionState::moving(dir);
            tracing::trace!(direction = %dir, from = self.start_position, target, "travel start");
        }
        self.target = Some(target);
    }

    /// Live estimate in `0..=100`, never past the target.
    pub fn current_position(&self) -> u8 {
        let (Some(dir), Some(start)) = (self.travel_direction(), self.travel_start) else {
            return self.known_position;
        };
        let full = self.range.full_time(dir).as_secs_f64();
        let delta = self.clock.secs_since(start) * 100.0 / full;
        let anchor = f64::from(self.start_position);
        let raw = match dir {
            Direction::Up => anchor + delta,
            Direction::Down => anchor - delta,
        };
        let mut pos = raw.round().clamp(f64::from(CLOSED), f64::from(OPEN)) as u8;
        if let Some(t) = self.target {
            pos = match dir {
                Direction::Up => pos.min(t.max(self.start_position)),
                Direction::Down => pos.max(t.min(self.start_position)),
            };
        }
        pos
    }

    pub fn position_reached(&self) -> bool {
        let Some(dir) = self.travel_direction() else {
            return true;
        };
        let current = self.current_position();
        match self.target {
            Some(t) => current == t,
            None => current == dir.extreme(),
        }
    }

    /// Freeze the estimate into `known_position` and end the segment.
    pub fn stop(&mut self) {
        if self.is_traveling() {
            self.known_position = self.current_position();
            tracing::trace!(position = self.known_position, "travel stop");
        }
        self.motion = MotionState::Stopped;
        self.travel_start = None;
        self.target = None;
    }

    /// Hard override of the position. Any running segment is discarded.
    pub fn set_position(&mut self, position: u8) {
        self.stop();
        self.known_position = position.min(OPEN);
        self.start_position = self.known_position;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blinds_traits::clock::test_clock::TestClock;

    fn est(up_s: u64, down_s: u64) -> (PositionEstimator, TestClock) {
        let clock = TestClock::new();
        let range =
            TravelRange::new(Duration::from_secs(up_s), Duration::from_secs(down_s)).unwrap();
        (PositionEstimator::new(range, Arc::new(clock.clone())), clock)
    }

    #[test]
    fn zero_travel_time_is_rejected() {
        assert!(TravelRange::new(Duration::ZERO, Duration::from_secs(1)).is_err());
        assert!(TravelRange::from_secs(1.0, f32::NAN).is_err());
        assert!(TravelRange::from_secs(-3.0, 1.0).is_err());
    }

    #[test]
    fn reversal_reanchors_at_live_estimate() {
        let (mut e, clock) = est(10, 20);
        e.set_position(50);
        e.start_travel_up();
        clock.advance_secs(2.0);
        assert_eq!(e.current_position(), 70);
        e.start_travel_down();
        // known_position untouched by the reversal
        assert_eq!(e.known_position(), 50);
        clock.advance_secs(4.0);
        assert_eq!(e.current_position(), 50);
    }

    #[test]
    fn estimate_does_not_pass_target() {
        let (mut e, clock) = est(10, 10);
        assert_eq!(e.start_travel(40), Some(Direction::Up));
        clock.advance_secs(7.0);
        assert_eq!(e.current_position(), 40);
        assert!(e.position_reached());
    }

    #[test]
    fn same_direction_retarget_keeps_anchor() {
        let (mut e, clock) = est(10, 10);
        e.start_travel(80);
        clock.advance_secs(3.0);
        assert_eq!(e.start_travel(90), Some(Direction::Up));
        clock.advance_secs(2.0);
        assert_eq!(e.current_position(), 50);
        assert_eq!(e.target(), Some(90));
    }

    #[test]
    fn start_travel_to_current_is_noop() {
        let (mut e, _clock) = est(10, 10);
        e.set_position(30);
        assert_eq!(e.start_travel(30), None);
        assert!(!e.is_traveling());
    }

    #[test]
    fn asymmetric_speeds() {
        let (mut e, clock) = est(20, 15);
        e.set_position(100);
        e.start_travel_down();
        clock.advance_secs(7.5);
        assert_eq!(e.current_position(), 50);
        clock.advance_secs(7.5);
        assert!(e.is_closed());
        assert!(e.position_reached());
    }
}
