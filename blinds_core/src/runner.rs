//! Poll loop driver: the single execution context of a controller.
//!
//! Each iteration sleeps one poll interval on the controller's clock, drains
//! pending switch events (so an observed "off" wins over the tick), then
//! ticks. Returns once the controller is idle again.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use blinds_traits::{Actuator, CoverState, StatePublisher, SwitchEvent};
use crossbeam_channel as xch;

use crate::config::{ControlCfg, TiltCfg, TravelCfg};
use crate::controller::{MotionController, ReconcileOutcome};
use crate::error::{AbortReason, CoverError, Result};
use crate::status::TickStatus;

/// Limits for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunParams {
    /// Watchdog: force a stop and abort after this long.
    pub max_run: Duration,
}

impl RunParams {
    /// `max_run_factor` times the longest configured full travel.
    pub fn from_cfg(travel: &TravelCfg, tilt: &TiltCfg, control: &ControlCfg) -> Self {
        let longest = travel.up.max(travel.down).max(tilt.open).max(tilt.closed);
        Self {
            max_run: crate::util::scaled(longest, control.max_run_factor),
        }
    }
}

/// What happened during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub ticks: u64,
    pub events_applied: u64,
    pub events_ignored: u64,
    pub elapsed: Duration,
    pub final_state: CoverState,
}

/// Drive `ctrl` until it stops polling.
///
/// - `shutdown` set: stop the cover and return `Abort(Shutdown)`.
/// - `params.max_run` exceeded: stop the cover and return `Abort(MaxRuntime)`.
/// - cover ends unavailable: return `Abort(Unavailable)`.
pub fn run_until_idle<A, P>(
    ctrl: &mut MotionController<A, P>,
    events: &xch::Receiver<SwitchEvent>,
    shutdown: &AtomicBool,
    params: &RunParams,
) -> Result<RunSummary>
where
    A: Actuator,
    P: StatePublisher,
{
    let clock = ctrl.clock().clone();
    let start = clock.now();
    let interval = ctrl.poll_interval();
    let mut ticks = 0u64;
    let mut applied = 0u64;
    let mut ignored = 0u64;

    let mut drain = |ctrl: &mut MotionController<A, P>| -> Result<()> {
        for ev in events.try_iter() {
            match ctrl.on_switch_change(ev)? {
                ReconcileOutcome::Duplicate => ignored += 1,
                ReconcileOutcome::Applied | ReconcileOutcome::ForcedStop => applied += 1,
            }
        }
        Ok(())
    };

    drain(ctrl)?;
    while ctrl.is_polling() {
        if shutdown.load(Ordering::Relaxed) {
            tracing::warn!(cover = %ctrl.name(), "shutdown requested; stopping");
            if let Err(e) = ctrl.stop() {
                tracing::warn!(error = %e, "stop failed on shutdown");
            }
            return Err(eyre::Report::new(CoverError::Abort(AbortReason::Shutdown)));
        }
        if clock.now().saturating_duration_since(start) >= params.max_run {
            tracing::error!(
                cover = %ctrl.name(),
                max_run_ms = crate::util::as_millis_u64(params.max_run),
                "max run time exceeded; stopping"
            );
            if let Err(e) = ctrl.stop() {
                tracing::warn!(error = %e, "stop failed on max-run cap");
            }
            return Err(eyre::Report::new(CoverError::Abort(AbortReason::MaxRuntime)));
        }

        clock.sleep(interval);
        drain(ctrl)?;
        if !ctrl.is_polling() {
            break;
        }
        ticks += 1;
        match ctrl.tick()? {
            TickStatus::Moving(dir) => {
                tracing::trace!(position = ctrl.lift().current_position(), direction = %dir, "tick");
            }
            TickStatus::Reached | TickStatus::Idle => {}
        }
    }

    let final_state = ctrl.state();
    let elapsed = clock.now().saturating_duration_since(start);
    if !final_state.available {
        return Err(eyre::Report::new(CoverError::Abort(AbortReason::Unavailable)));
    }
    tracing::info!(
        cover = %ctrl.name(),
        position = final_state.position,
        ticks,
        elapsed_ms = crate::util::as_millis_u64(elapsed),
        "run complete"
    );
    Ok(RunSummary {
        ticks,
        events_applied: applied,
        events_ignored: ignored,
        elapsed,
        final_state,
    })
}
