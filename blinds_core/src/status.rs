//! Result of one poll tick.

use crate::estimator::Direction;

/// What a single `MotionController::tick` observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickStatus {
    /// Still travelling; position published.
    Moving(Direction),
    /// Target reached on this tick; estimators stopped and polling cancelled.
    Reached,
    /// Nothing to do; the controller is not polling.
    Idle,
}
