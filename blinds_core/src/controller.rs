//! Motion controller: drives the two switch outputs from the estimators and
//! reconciles the estimate with switch changes it did not initiate.
//!
//! Phases: `Idle -> Commanding -> AutoPolling -> Idle`. While polling, the
//! caller (normally `runner::run_until_idle`) calls `tick()` once per poll
//! interval; the controller publishes the estimate and issues the stop when
//! every active axis has reached its target.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use blinds_config::PersistedPosition;
use blinds_traits::clock::Clock;
use blinds_traits::{Actuator, CoverState, StatePublisher, SwitchEvent, SwitchId, SwitchState};
use eyre::WrapErr;
use tracing::{debug, info, warn};

use crate::config::ControlCfg;
use crate::error::{CoverError, Result};
use crate::estimator::{CLOSED, Direction, OPEN, PositionEstimator};
use crate::hw_error::map_hw_error;
use crate::status::TickStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    /// Actuator calls in flight for a new travel.
    Commanding,
    AutoPolling,
}

/// Handle of the recurring poll tick; present iff polling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSubscription {
    pub interval: Duration,
    pub armed_at: Instant,
    pub ticks: u64,
}

/// Answer to a movement request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    Moving(Direction),
    /// Already there; nothing commanded.
    AtTarget,
    /// Tilt requested while the lift is travelling.
    Busy,
}

/// How an observed switch change was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    Applied,
    /// Same as the recorded state, typically the echo of our own command.
    Duplicate,
    /// Both outputs on or a switch went unavailable; everything stopped.
    ForcedStop,
}

/// How long the host's report of a change we commanded is expected to lag.
/// Within this window a report matching one of our own commands is an echo,
/// even if a later command already changed the recorded state.
pub const ECHO_WINDOW: Duration = Duration::from_secs(1);

/// Last known state of both outputs, used for edge detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct Recorded {
    up: SwitchState,
    down: SwitchState,
}

impl Recorded {
    fn get(&self, switch: SwitchId) -> SwitchState {
        match switch {
            SwitchId::Up => self.up,
            SwitchId::Down => self.down,
        }
    }

    fn set(&mut self, switch: SwitchId, state: SwitchState) {
        match switch {
            SwitchId::Up => self.up = state,
            SwitchId::Down => self.down = state,
        }
    }

    fn any_unavailable(&self) -> bool {
        self.up == SwitchState::Unavailable || self.down == SwitchState::Unavailable
    }
}

pub struct MotionController<A: Actuator, P: StatePublisher> {
    pub(crate) actuator: A,
    pub(crate) publisher: P,
    pub(crate) lift: PositionEstimator,
    pub(crate) tilt: Option<PositionEstimator>,
    pub(crate) clock: Arc<dyn Clock + Send + Sync>,
    pub(crate) control: ControlCfg,
    pub(crate) name: String,
    phase: Phase,
    poll: Option<PollSubscription>,
    recorded: Recorded,
    /// Changes we commanded that the host may still report back.
    echoes: VecDeque<(SwitchEvent, Instant)>,
    /// Last actuator call failed; cleared by the next successful command.
    fault: bool,
}

impl<A: Actuator, P: StatePublisher> core::fmt::Debug for MotionController<A, P> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MotionController")
            .field("name", &self.name)
            .field("phase", &self.phase)
            .field("lift", &self.lift)
            .field("tilt", &self.tilt)
            .field("poll", &self.poll)
            .field("fault", &self.fault)
            .finish()
    }
}

impl<A: Actuator, P: StatePublisher> MotionController<A, P> {
    pub(crate) fn from_parts(
        actuator: A,
        publisher: P,
        lift: PositionEstimator,
        tilt: Option<PositionEstimator>,
        clock: Arc<dyn Clock + Send + Sync>,
        control: ControlCfg,
        name: String,
    ) -> Self {
        Self {
            actuator,
            publisher,
            lift,
            tilt,
            clock,
            control,
            name,
            phase: Phase::Idle,
            poll: None,
            recorded: Recorded::default(),
            echoes: VecDeque::new(),
            fault: false,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────────────

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_polling(&self) -> bool {
        self.poll.is_some()
    }

    pub fn poll_subscription(&self) -> Option<PollSubscription> {
        self.poll
    }

    pub fn poll_interval(&self) -> Duration {
        self.control.poll_interval
    }

    pub fn has_tilt(&self) -> bool {
        self.tilt.is_some()
    }

    pub fn lift(&self) -> &PositionEstimator {
        &self.lift
    }

    pub fn tilt(&self) -> Option<&PositionEstimator> {
        self.tilt.as_ref()
    }

    pub fn clock(&self) -> &Arc<dyn Clock + Send + Sync> {
        &self.clock
    }

    pub fn control(&self) -> &ControlCfg {
        &self.control
    }

    /// Recorded state of one output.
    pub fn switch_state(&self, switch: SwitchId) -> SwitchState {
        self.recorded.get(switch)
    }

    pub fn is_available(&self) -> bool {
        !self.fault && !self.recorded.any_unavailable()
    }

    /// Direction of whichever axis is travelling; lift wins.
    pub fn moving_direction(&self) -> Option<Direction> {
        self.lift
            .travel_direction()
            .or_else(|| self.tilt.as_ref().and_then(|t| t.travel_direction()))
    }

    pub fn is_moving(&self) -> bool {
        self.moving_direction().is_some()
    }

    /// All active axes at their targets.
    pub fn position_reached(&self) -> bool {
        self.lift.position_reached() && self.tilt.as_ref().is_none_or(|t| t.position_reached())
    }

    pub fn state(&self) -> CoverState {
        let dir = self.moving_direction();
        CoverState {
            position: self.lift.current_position(),
            tilt_position: self.tilt.as_ref().map(PositionEstimator::current_position),
            is_opening: dir == Some(Direction::Up),
            is_closing: dir == Some(Direction::Down),
            is_closed: self.lift.is_closed(),
            available: self.is_available(),
        }
    }

    pub fn snapshot(&self) -> PersistedPosition {
        PersistedPosition {
            position: self.lift.current_position(),
            tilt_position: self.tilt.as_ref().map(PositionEstimator::current_position),
        }
    }

    // ── Startup ──────────────────────────────────────────────────────────────

    /// Apply a persisted estimate. Call before any command.
    pub fn restore(&mut self, saved: PersistedPosition) {
        let saved = saved.clamped();
        self.lift.set_position(saved.position);
        if let (Some(tilt), Some(t)) = (self.tilt.as_mut(), saved.tilt_position) {
            tilt.set_position(t);
        }
        info!(cover = %self.name, position = saved.position, tilt = ?saved.tilt_position, "position restored");
    }

    // ── Lift commands ────────────────────────────────────────────────────────

    pub fn open(&mut self) -> Result<CommandOutcome> {
        self.travel_lift_to(OPEN)
    }

    pub fn close(&mut self) -> Result<CommandOutcome> {
        self.travel_lift_to(CLOSED)
    }

    pub fn set_position(&mut self, position: u8) -> Result<CommandOutcome> {
        check_position(position)?;
        self.travel_lift_to(position)
    }

    fn travel_lift_to(&mut self, target: u8) -> Result<CommandOutcome> {
        let Some(dir) = self.lift.start_travel(target) else {
            // Asked for where the estimate already is: stop there if moving.
            if self.is_moving() {
                self.stop()?;
            }
            debug!(cover = %self.name, position = target, "already at target");
            return Ok(CommandOutcome::AtTarget);
        };
        if target == dir.extreme() {
            self.snap_tilt(dir);
        } else if let Some(tilt) = self.tilt.as_mut() {
            // partial travel leaves the angle alone but ends any tilt segment
            tilt.stop();
        }
        info!(cover = %self.name, direction = %dir, target, "lift travel");
        self.command(dir)?;
        Ok(CommandOutcome::Moving(dir))
    }

    /// Travel to an extreme carries the slats to the matching end.
    fn snap_tilt(&mut self, dir: Direction) {
        if let Some(tilt) = self.tilt.as_mut() {
            tilt.set_position(dir.extreme());
        }
    }

    // ── Tilt commands ────────────────────────────────────────────────────────

    pub fn open_tilt(&mut self) -> Result<CommandOutcome> {
        self.travel_tilt_to(OPEN)
    }

    pub fn close_tilt(&mut self) -> Result<CommandOutcome> {
        self.travel_tilt_to(CLOSED)
    }

    pub fn set_tilt_position(&mut self, position: u8) -> Result<CommandOutcome> {
        check_position(position)?;
        self.travel_tilt_to(position)
    }

    fn travel_tilt_to(&mut self, target: u8) -> Result<CommandOutcome> {
        if self.tilt.is_none() {
            return Err(eyre::Report::new(CoverError::TiltUnsupported));
        }
        if self.lift.is_traveling() {
            debug!(cover = %self.name, "tilt request while lifting");
            return Ok(CommandOutcome::Busy);
        }
        let Some(dir) = self.tilt.as_mut().and_then(|t| t.start_travel(target)) else {
            if self.is_moving() {
                self.stop()?;
            }
            return Ok(CommandOutcome::AtTarget);
        };
        info!(cover = %self.name, direction = %dir, target, "tilt travel");
        self.command(dir)?;
        Ok(CommandOutcome::Moving(dir))
    }

    // ── Stop and corrections ─────────────────────────────────────────────────

    /// Stop everything and send the stop command (both outputs off).
    pub fn stop(&mut self) -> Result<()> {
        self.halt_estimators();
        let res = self.send_stop();
        self.publish();
        res
    }

    /// Stop, then override the lift estimate.
    pub fn set_known_position(&mut self, position: u8) -> Result<()> {
        check_position(position)?;
        self.halt_estimators();
        let res = self.send_stop();
        self.lift.set_position(position);
        info!(cover = %self.name, position, "known position set");
        self.publish();
        res
    }

    /// Stop, then override the tilt estimate.
    pub fn set_known_tilt_position(&mut self, position: u8) -> Result<()> {
        check_position(position)?;
        if self.tilt.is_none() {
            return Err(eyre::Report::new(CoverError::TiltUnsupported));
        }
        self.halt_estimators();
        let res = self.send_stop();
        if let Some(tilt) = self.tilt.as_mut() {
            tilt.set_position(position);
        }
        info!(cover = %self.name, tilt = position, "known tilt position set");
        self.publish();
        res
    }

    // ── Polling ──────────────────────────────────────────────────────────────

    /// Arm the poll tick. Idempotent.
    pub fn start_auto_updater(&mut self) {
        if self.poll.is_none() {
            self.poll = Some(PollSubscription {
                interval: self.control.poll_interval,
                armed_at: self.clock.now(),
                ticks: 0,
            });
            debug!(cover = %self.name, "auto updater armed");
        }
        self.phase = Phase::AutoPolling;
    }

    /// Cancel the poll tick. No-op when not armed.
    pub fn stop_auto_updater(&mut self) {
        if let Some(sub) = self.poll.take() {
            debug!(cover = %self.name, ticks = sub.ticks, "auto updater cancelled");
        }
        self.phase = Phase::Idle;
    }

    /// One poll tick: publish, and stop once every active axis is there.
    pub fn tick(&mut self) -> Result<TickStatus> {
        let Some(sub) = self.poll.as_mut() else {
            return Ok(TickStatus::Idle);
        };
        sub.ticks += 1;
        self.publish();
        if !self.position_reached() {
            return Ok(match self.moving_direction() {
                Some(dir) => TickStatus::Moving(dir),
                None => TickStatus::Idle,
            });
        }

        // Only the lift has end stops; a tilt segment always needs the stop.
        let lift_moved = self.lift.is_traveling();
        let end = self.lift.current_position();
        let at_end_stop = lift_moved && (end == OPEN || end == CLOSED);
        self.halt_estimators();
        info!(cover = %self.name, position = end, "position reached");
        let res = if self.control.send_stop_at_extremes || !at_end_stop {
            self.send_stop()
        } else {
            debug!(cover = %self.name, position = end, "end stop cuts the motor; no stop sent");
            Ok(())
        };
        self.publish();
        res.map(|()| TickStatus::Reached)
    }

    // ── Reconciliation ───────────────────────────────────────────────────────

    /// Apply a switch change observed by the host (manual button, echo of our
    /// own command, or availability change).
    pub fn on_switch_change(&mut self, event: SwitchEvent) -> Result<ReconcileOutcome> {
        let SwitchEvent { switch, state } = event;
        let now = self.clock.now();
        self.echoes
            .retain(|(_, at)| now.saturating_duration_since(*at) < ECHO_WINDOW);
        if let Some(i) = self.echoes.iter().position(|(e, _)| *e == event) {
            let _ = self.echoes.remove(i);
            if self.recorded.get(switch) != state {
                debug!(cover = %self.name, %switch, ?state, "stale echo ignored");
            }
            return Ok(ReconcileOutcome::Duplicate);
        }
        if self.recorded.get(switch) == state {
            return Ok(ReconcileOutcome::Duplicate);
        }
        self.recorded.set(switch, state);
        debug!(cover = %self.name, %switch, ?state, "switch change");

        let outcome = match state {
            SwitchState::Unavailable => {
                warn!(cover = %self.name, %switch, "switch unavailable; stopping");
                self.halt_estimators();
                // the lost switch cannot be commanded; try the other one
                if let Err(e) = self.actuator.turn_off(switch.opposite()) {
                    warn!(error = %e, "best-effort stop failed");
                } else {
                    self.record_command(switch.opposite(), SwitchState::Off);
                }
                ReconcileOutcome::ForcedStop
            }
            SwitchState::On if self.recorded.get(switch.opposite()) == SwitchState::On => {
                warn!(cover = %self.name, "both outputs on; forcing stop");
                self.halt_estimators();
                self.send_stop()?;
                ReconcileOutcome::ForcedStop
            }
            SwitchState::On => {
                let dir = Direction::from_switch(switch);
                if self.lift.travel_direction() != Some(dir) {
                    info!(cover = %self.name, direction = %dir, "external travel");
                    self.lift.start_travel(dir.extreme());
                    self.snap_tilt(dir);
                    self.start_auto_updater();
                }
                ReconcileOutcome::Applied
            }
            SwitchState::Off => {
                if self.moving_direction().map(Direction::switch) == Some(switch) {
                    info!(cover = %self.name, %switch, "external stop");
                    self.halt_estimators();
                    self.send_stop()?;
                }
                ReconcileOutcome::Applied
            }
        };
        self.publish();
        Ok(outcome)
    }

    // ── Internals ────────────────────────────────────────────────────────────

    fn halt_estimators(&mut self) {
        self.lift.stop();
        if let Some(tilt) = self.tilt.as_mut() {
            tilt.stop();
        }
        self.stop_auto_updater();
    }

    /// Opposite output off, requested output on, then arm polling.
    fn command(&mut self, dir: Direction) -> Result<()> {
        self.phase = Phase::Commanding;
        let on = dir.switch();
        let res = self
            .switch_off(on.opposite())
            .and_then(|()| self.switch_on(on));
        if let Err(e) = res {
            self.fail();
            return Err(e);
        }
        self.fault = false;
        self.start_auto_updater();
        self.publish();
        Ok(())
    }

    fn send_stop(&mut self) -> Result<()> {
        let res = self
            .switch_off(SwitchId::Down)
            .and_then(|()| self.switch_off(SwitchId::Up));
        match res {
            Ok(()) => {
                self.fault = false;
                Ok(())
            }
            Err(e) => {
                self.fail();
                Err(e)
            }
        }
    }

    fn switch_on(&mut self, switch: SwitchId) -> Result<()> {
        self.actuator
            .turn_on(switch)
            .map_err(|e| eyre::Report::new(map_hw_error(&*e)))
            .wrap_err_with(|| format!("turn_on {switch}"))?;
        self.record_command(switch, SwitchState::On);
        Ok(())
    }

    fn switch_off(&mut self, switch: SwitchId) -> Result<()> {
        self.actuator
            .turn_off(switch)
            .map_err(|e| eyre::Report::new(map_hw_error(&*e)))
            .wrap_err_with(|| format!("turn_off {switch}"))?;
        self.record_command(switch, SwitchState::Off);
        Ok(())
    }

    /// Record a state we drove; a real change is remembered as a pending echo.
    fn record_command(&mut self, switch: SwitchId, state: SwitchState) {
        if self.recorded.get(switch) != state {
            self.echoes
                .push_back((SwitchEvent::new(switch, state), self.clock.now()));
        }
        self.recorded.set(switch, state);
    }

    /// Actuator failure: mark unavailable, stop the estimate, try to cut both
    /// outputs. No retry.
    fn fail(&mut self) {
        self.fault = true;
        self.halt_estimators();
        for switch in [SwitchId::Down, SwitchId::Up] {
            match self.actuator.turn_off(switch) {
                Ok(()) => self.record_command(switch, SwitchState::Off),
                Err(e) => warn!(%switch, error = %e, "best-effort stop failed"),
            }
        }
        warn!(cover = %self.name, "actuator failure; cover unavailable");
        self.publish();
    }

    fn publish(&mut self) {
        let state = self.state();
        self.publisher.publish(&state);
    }
}

fn check_position(position: u8) -> Result<()> {
    if position > OPEN {
        return Err(eyre::Report::new(CoverError::InvalidPosition(position)));
    }
    Ok(())
}
