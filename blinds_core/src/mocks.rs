//! Test and helper mocks for blinds_core.
//!
//! Handles are cheap clones sharing one log, so a test can keep a handle
//! after moving the mock into a controller.

use std::sync::{Arc, Mutex, MutexGuard};

use blinds_traits::{Actuator, CoverState, StatePublisher, SwitchId};

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

/// One call made on the actuator port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorCall {
    On(SwitchId),
    Off(SwitchId),
}

/// Records every successful call; can be told to fail.
#[derive(Debug, Clone, Default)]
pub struct RecordingActuator {
    calls: Arc<Mutex<Vec<ActuatorCall>>>,
    fail: Arc<Mutex<Option<String>>>,
}

impl RecordingActuator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<ActuatorCall> {
        lock(&self.calls).clone()
    }

    pub fn clear(&self) {
        lock(&self.calls).clear();
    }

    /// Fail every following call with `msg` until cleared with `None`.
    pub fn fail_with(&self, msg: Option<&str>) {
        *lock(&self.fail) = msg.map(str::to_string);
    }

    /// Number of stop commands seen (`Off(Down)` directly followed by `Off(Up)`).
    pub fn stop_count(&self) -> usize {
        lock(&self.calls)
            .windows(2)
            .filter(|w| {
                w == &[
                    ActuatorCall::Off(SwitchId::Down),
                    ActuatorCall::Off(SwitchId::Up),
                ]
            })
            .count()
    }

    fn record(&self, call: ActuatorCall) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if let Some(msg) = lock(&self.fail).clone() {
            return Err(Box::new(std::io::Error::other(msg)));
        }
        lock(&self.calls).push(call);
        Ok(())
    }
}

impl Actuator for RecordingActuator {
    fn turn_on(&mut self, switch: SwitchId) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.record(ActuatorCall::On(switch))
    }

    fn turn_off(
        &mut self,
        switch: SwitchId,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.record(ActuatorCall::Off(switch))
    }
}

/// Keeps every published state.
#[derive(Debug, Clone, Default)]
pub struct RecordingPublisher {
    states: Arc<Mutex<Vec<CoverState>>>,
}

impl RecordingPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn states(&self) -> Vec<CoverState> {
        lock(&self.states).clone()
    }

    pub fn last(&self) -> Option<CoverState> {
        lock(&self.states).last().copied()
    }
}

impl StatePublisher for RecordingPublisher {
    fn publish(&mut self, state: &CoverState) {
        lock(&self.states).push(*state);
    }
}

/// Publisher that drops everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopPublisher;

impl StatePublisher for NoopPublisher {
    fn publish(&mut self, _state: &CoverState) {}
}
